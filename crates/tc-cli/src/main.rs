//! `tc`: headless Tile Canvas tools.
//!
//! Modes:
//! - `tc --normalize` reads a document on stdin and writes it back with a
//!   compacted `1..N` z-order.
//! - `tc --inspect` reads a document on stdin and prints one line per tile.
//! - `tc --demo [--config <file>]` runs a scripted canvas session against
//!   simulated services and prints the resulting document.
//!
//! Set `RUST_LOG=debug` to watch the generation lifecycle.

mod sim;

use sim::{SimulatedGenerator, SimulatedPreloader, SimulatedVariations};
use std::io::Read;
use std::time::Duration;
use tc_core::{CanvasConfig, Document, Position, ZIndexAllocator};
use tc_engine::{Canvas, ExpansionOutcome};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    env_logger::init();
    let args: Vec<String> = std::env::args().collect();

    match args.get(1).map(|s| s.as_str()) {
        // ── `tc --normalize` ────────────────────────────────────────────
        Some("--normalize") => {
            let mut store = read_document().into_store();
            ZIndexAllocator::default().renormalize(&mut store);
            match Document::from_store(&store).to_json() {
                Ok(json) => println!("{json}"),
                Err(e) => fail(&format!("tc --normalize error: {e}")),
            }
        }

        // ── `tc --inspect` ──────────────────────────────────────────────
        Some("--inspect") => {
            let doc = read_document();
            println!("{} tiles (format v{})", doc.tiles.len(), doc.version);
            for tile in &doc.tiles {
                println!(
                    "  z {:>3}  {:<44} {:>7.1},{:<7.1} {}",
                    tile.z_index,
                    tile.id.as_str(),
                    tile.position.x,
                    tile.position.y,
                    tile.prompt.as_deref().unwrap_or("(no prompt)")
                );
            }
        }

        // ── `tc --demo` ─────────────────────────────────────────────────
        Some("--demo") => {
            let config = match args.get(2).map(|s| s.as_str()) {
                Some("--config") => match args.get(3) {
                    Some(path) => load_config(path),
                    None => fail("tc --demo error: --config needs a path"),
                },
                _ => CanvasConfig::default(),
            };
            let local = tokio::task::LocalSet::new();
            local.run_until(demo(config)).await;
        }

        _ => {
            eprintln!("usage: tc --normalize | --inspect | --demo [--config <file>]");
            std::process::exit(2);
        }
    }
}

fn read_document() -> Document {
    let mut text = String::new();
    if let Err(e) = std::io::stdin().read_to_string(&mut text) {
        fail(&format!("tc error: cannot read stdin: {e}"));
    }
    match Document::from_json(&text) {
        Ok(doc) => doc,
        Err(e) => fail(&format!("tc error: {e}")),
    }
}

fn load_config(path: &str) -> CanvasConfig {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => fail(&format!("tc error: cannot read {path}: {e}")),
    };
    match CanvasConfig::from_json(&text) {
        Ok(config) => config,
        Err(e) => fail(&format!("tc error: invalid config {path}: {e}")),
    }
}

fn fail(message: &str) -> ! {
    eprintln!("{message}");
    std::process::exit(1);
}

/// A short scripted session: type a prompt, revise it while typing,
/// expand the result, then dump the document.
async fn demo(config: CanvasConfig) {
    log::info!(
        "demo session: quiet {}ms, max wait {}ms",
        config.quiet_period_ms,
        config.max_wait_ms
    );
    let canvas = Canvas::new(
        config,
        SimulatedGenerator,
        SimulatedVariations,
        SimulatedPreloader,
    );

    let id = canvas.create_tile(Position::new(40.0, 40.0), None, None);
    canvas.select_tile(Some(id));
    for text in ["a light", "a lighthouse", "a lighthouse on a cliff"] {
        canvas.edit_prompt(id, text);
        tokio::time::sleep(Duration::from_millis(120)).await;
    }
    canvas.flush_prompt(id);
    // The flushed fire is handled on the gate's own task; give it a tick.
    loop {
        tokio::time::sleep(Duration::from_millis(50)).await;
        if !canvas.is_generating(id) {
            break;
        }
    }
    report(&canvas, "after typing");

    match canvas.expand_tile(id).await {
        ExpansionOutcome::Completed { failed, .. } => {
            println!("expanded into 4 variations, {failed} failed");
        }
        other => println!("expansion did not run: {other:?}"),
    }
    if let Some(message) = canvas.last_error() {
        println!("error: {message}");
        canvas.dismiss_error();
    }
    report(&canvas, "after expansion");

    match canvas.to_document().to_json() {
        Ok(json) => println!("{json}"),
        Err(e) => fail(&format!("tc --demo error: {e}")),
    }
}

fn report<G, V, P>(canvas: &Canvas<G, V, P>, label: &str)
where
    G: tc_engine::GenerationService + 'static,
    V: tc_engine::VariationService,
    P: tc_engine::ImagePreloader + 'static,
{
    println!("── {label}");
    for tile in canvas.tiles() {
        println!(
            "  z {:>3}  {:?} {}",
            tile.z_index,
            tile.display_state,
            tile.prompt.as_deref().unwrap_or("")
        );
    }
}
