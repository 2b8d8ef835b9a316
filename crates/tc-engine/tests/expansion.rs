//! Integration tests: expanding one tile into four variation tiles.

mod common;

use common::*;
use pretty_assertions::assert_eq;
use std::time::Duration;
use tc_core::{DisplayState, Position, TilePatch};
use tc_engine::{ExpansionOutcome, PLACEHOLDER_PROMPT};

fn completed(outcome: ExpansionOutcome) -> ([tc_core::TileId; 4], usize) {
    match outcome {
        ExpansionOutcome::Completed { tiles, failed } => (tiles, failed),
        other => panic!("expected Completed, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn expansion_reports_partial_failure_without_rollback() {
    let f = fixture();
    let source = place(&f.canvas, "exp_cat", 500.0, 500.0, 1);
    f.canvas.update_tile(source, TilePatch::new().prompt("cat"));
    f.generator.fail_on("cat v2");
    f.generator.fail_on("cat v4");

    let (tiles, failed) = completed(f.canvas.expand_tile(source).await);

    assert_eq!(failed, 2);
    assert_eq!(f.canvas.store().len(), 5);
    let prompts: Vec<_> = tiles
        .iter()
        .map(|&id| f.canvas.tile(id).unwrap().prompt.unwrap())
        .collect();
    assert_eq!(prompts, ["cat v1", "cat v2", "cat v3", "cat v4"]);

    let states: Vec<_> = tiles
        .iter()
        .map(|&id| f.canvas.tile(id).unwrap().display_state)
        .collect();
    assert_eq!(
        states,
        [
            DisplayState::Ready,
            DisplayState::Failed,
            DisplayState::Ready,
            DisplayState::Failed,
        ]
    );
    assert_eq!(
        f.canvas.last_error().as_deref(),
        Some("failed to generate 2 of 4 variations")
    );
}

#[tokio::test(start_paused = true)]
async fn expansion_runs_generations_concurrently() {
    let f = fixture();
    let source = place(&f.canvas, "exp_concurrent", 500.0, 500.0, 1);
    f.canvas.update_tile(source, TilePatch::new().prompt("owl"));

    let start = tokio::time::Instant::now();
    let (_, failed) = completed(f.canvas.expand_tile(source).await);
    let elapsed = start.elapsed();

    assert_eq!(failed, 0);
    assert_eq!(f.generator.calls.borrow().len(), 4);
    // One variation round-trip plus one generate+preload, not four.
    assert!(
        elapsed < VARIATION_DELAY + GENERATE_DELAY * 2,
        "took {elapsed:?}"
    );
    assert_eq!(f.canvas.last_error(), None);
}

#[tokio::test(start_paused = true)]
async fn placeholders_appear_before_variations_arrive() {
    let f = fixture();
    let source = place(&f.canvas, "exp_placeholder", 500.0, 500.0, 7);
    place(&f.canvas, "exp_bystander", 0.0, 0.0, 3);
    f.canvas.update_tile(source, TilePatch::new().prompt("lighthouse"));

    let (outcome, ()) = tokio::join!(f.canvas.expand_tile(source), async {
        tokio::time::sleep(Duration::from_millis(1)).await;
        let store = f.canvas.store();
        let placeholders: Vec<_> = store
            .iter()
            .filter(|t| t.prompt.as_deref() == Some(PLACEHOLDER_PROMPT))
            .collect();
        assert_eq!(placeholders.len(), 4);
        assert!(
            placeholders
                .iter()
                .all(|t| t.display_state == DisplayState::Loading)
        );

        let mut zs: Vec<u32> = placeholders.iter().map(|t| t.z_index).collect();
        zs.sort_unstable();
        assert_eq!(zs, [8, 9, 10, 11]);
        assert_eq!(store.get(source).unwrap().z_index, 12);
    });

    let (tiles, _) = completed(outcome);
    for id in tiles {
        assert_ne!(
            f.canvas.tile(id).unwrap().prompt.as_deref(),
            Some(PLACEHOLDER_PROMPT)
        );
    }
}

#[tokio::test(start_paused = true)]
async fn placeholders_form_a_cross() {
    let f = fixture();
    let source = place(&f.canvas, "exp_cross", 500.0, 500.0, 1);
    f.canvas.update_tile(source, TilePatch::new().prompt("tree"));

    let (tiles, _) = completed(f.canvas.expand_tile(source).await);

    let positions: Vec<_> = tiles
        .iter()
        .map(|&id| f.canvas.tile(id).unwrap().position)
        .collect();
    // 100×100 tiles with the default 24px gap.
    assert_eq!(
        positions,
        [
            Position::new(500.0, 376.0),
            Position::new(376.0, 500.0),
            Position::new(624.0, 500.0),
            Position::new(500.0, 624.0),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn variation_failure_removes_placeholders() {
    let f = fixture();
    let source = place(&f.canvas, "exp_novar", 500.0, 500.0, 1);
    f.canvas.update_tile(source, TilePatch::new().prompt("dragon"));
    *f.variations.script.borrow_mut() = VariationScript::Fail("quota exceeded");

    let outcome = f.canvas.expand_tile(source).await;

    assert_eq!(outcome, ExpansionOutcome::VariationsFailed);
    assert_eq!(f.canvas.store().len(), 1);
    assert!(f.generator.calls.borrow().is_empty());
    assert_eq!(
        f.canvas.last_error().as_deref(),
        Some("could not get prompt variations: quota exceeded")
    );
}

#[tokio::test(start_paused = true)]
async fn short_variation_list_is_a_failure() {
    let f = fixture();
    let source = place(&f.canvas, "exp_short", 500.0, 500.0, 1);
    f.canvas.update_tile(source, TilePatch::new().prompt("river"));
    *f.variations.script.borrow_mut() = VariationScript::Numbered(3);

    let outcome = f.canvas.expand_tile(source).await;

    assert_eq!(outcome, ExpansionOutcome::VariationsFailed);
    assert_eq!(f.canvas.store().len(), 1);
    assert!(f.generator.calls.borrow().is_empty());
}

#[tokio::test(start_paused = true)]
async fn tile_without_prompt_is_not_expanded() {
    let f = fixture();
    let source = place(&f.canvas, "exp_blank", 500.0, 500.0, 1);

    assert_eq!(f.canvas.expand_tile(source).await, ExpansionOutcome::Skipped);
    assert_eq!(f.canvas.store().len(), 1);
    assert_eq!(f.variations.calls.get(), 0);
}
