//! Simulated AI services for `tc --demo`.
//!
//! Latency is derived from the prompt so runs are repeatable. Prompts
//! containing "glitch" fail to generate; URLs containing "broken" fail to
//! preload.

use std::time::Duration;
use tc_engine::{
    CancellationToken, GenerationService, ImagePreloader, ServiceError, VariationService,
    Variations,
};
use tokio::time::sleep;

const STYLES: [&str; 4] = [
    "in watercolor",
    "as a pixel-art sprite",
    "at golden hour",
    "carved as a woodcut",
];

pub struct SimulatedGenerator;

impl GenerationService for SimulatedGenerator {
    async fn generate(
        &self,
        prompt: &str,
        cancel: CancellationToken,
    ) -> Result<String, ServiceError> {
        let latency = Duration::from_millis(200 + 15 * prompt.len() as u64);
        tokio::select! {
            _ = cancel.cancelled() => Err(ServiceError::Cancelled),
            _ = sleep(latency) => {
                if prompt.contains("glitch") {
                    Err(ServiceError::failed("upstream returned 503"))
                } else {
                    Ok(format!("https://images.sim/{}.webp", slug(prompt)))
                }
            }
        }
    }
}

pub struct SimulatedVariations;

impl VariationService for SimulatedVariations {
    async fn variations(&self, prompt: &str, count: usize) -> Result<Variations, ServiceError> {
        sleep(Duration::from_millis(150)).await;
        Ok(STYLES
            .iter()
            .cycle()
            .take(count)
            .map(|style| format!("{prompt}, {style}"))
            .collect())
    }
}

pub struct SimulatedPreloader;

impl ImagePreloader for SimulatedPreloader {
    async fn preload(&self, url: &str) -> Result<(), ServiceError> {
        sleep(Duration::from_millis(40)).await;
        if url.contains("broken") {
            return Err(ServiceError::failed(format!("{url} is not an image")));
        }
        Ok(())
    }
}

fn slug(prompt: &str) -> String {
    prompt
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect()
}
