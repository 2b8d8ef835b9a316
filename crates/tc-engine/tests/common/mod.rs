//! Scripted service doubles shared by the engine integration tests.
//!
//! Every double sleeps on the tokio clock, so tests run with
//! `start_paused = true` and finish instantly.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::rc::Rc;
use std::time::Duration;
use tc_core::{CanvasConfig, CanvasTile, Position, Size, TileId};
use tc_engine::{
    Canvas, CancellationToken, GenerationService, ImagePreloader, ServiceError, VariationService,
    Variations,
};

pub const GENERATE_DELAY: Duration = Duration::from_millis(50);
pub const PRELOAD_DELAY: Duration = Duration::from_millis(5);
pub const VARIATION_DELAY: Duration = Duration::from_millis(20);

pub fn image_url(prompt: &str) -> String {
    format!("https://img.test/{}.png", prompt.replace(' ', "-"))
}

// ─── Generation ──────────────────────────────────────────────────────────

#[derive(Default)]
pub struct ScriptedGenerator {
    /// Every prompt the service was called with, in call order.
    pub calls: RefCell<Vec<String>>,
    /// Calls that ran to completion without being cancelled.
    pub completed: Cell<usize>,
    pub cancelled: Cell<usize>,
    failing: RefCell<HashSet<String>>,
}

impl ScriptedGenerator {
    pub fn fail_on(&self, prompt: &str) {
        self.failing.borrow_mut().insert(prompt.to_string());
    }
}

impl GenerationService for ScriptedGenerator {
    async fn generate(
        &self,
        prompt: &str,
        cancel: CancellationToken,
    ) -> Result<String, ServiceError> {
        self.calls.borrow_mut().push(prompt.to_string());
        tokio::select! {
            _ = cancel.cancelled() => {
                self.cancelled.set(self.cancelled.get() + 1);
                Err(ServiceError::Cancelled)
            }
            _ = tokio::time::sleep(GENERATE_DELAY) => {
                self.completed.set(self.completed.get() + 1);
                if self.failing.borrow().contains(prompt) {
                    Err(ServiceError::failed("model overloaded"))
                } else {
                    Ok(image_url(prompt))
                }
            }
        }
    }
}

// ─── Preload ─────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct ScriptedPreloader {
    pub loaded: RefCell<Vec<String>>,
    broken: RefCell<HashSet<String>>,
}

impl ScriptedPreloader {
    pub fn break_url(&self, url: &str) {
        self.broken.borrow_mut().insert(url.to_string());
    }
}

impl ImagePreloader for ScriptedPreloader {
    async fn preload(&self, url: &str) -> Result<(), ServiceError> {
        tokio::time::sleep(PRELOAD_DELAY).await;
        if self.broken.borrow().contains(url) {
            return Err(ServiceError::failed(format!("404 for {url}")));
        }
        self.loaded.borrow_mut().push(url.to_string());
        Ok(())
    }
}

// ─── Variations ──────────────────────────────────────────────────────────

pub enum VariationScript {
    /// Return `"<prompt> v1"` … `"<prompt> vN"`.
    Numbered(usize),
    Fail(&'static str),
}

pub struct ScriptedVariations {
    pub script: RefCell<VariationScript>,
    pub calls: Cell<usize>,
}

impl Default for ScriptedVariations {
    fn default() -> Self {
        Self {
            script: RefCell::new(VariationScript::Numbered(4)),
            calls: Cell::new(0),
        }
    }
}

impl VariationService for ScriptedVariations {
    async fn variations(&self, prompt: &str, _count: usize) -> Result<Variations, ServiceError> {
        self.calls.set(self.calls.get() + 1);
        tokio::time::sleep(VARIATION_DELAY).await;
        match &*self.script.borrow() {
            VariationScript::Numbered(n) => {
                Ok((1..=*n).map(|i| format!("{prompt} v{i}")).collect())
            }
            VariationScript::Fail(message) => Err(ServiceError::failed(*message)),
        }
    }
}

// ─── Canvas fixture ──────────────────────────────────────────────────────

pub type TestCanvas =
    Canvas<Rc<ScriptedGenerator>, Rc<ScriptedVariations>, Rc<ScriptedPreloader>>;

pub struct Fixture {
    pub canvas: TestCanvas,
    pub generator: Rc<ScriptedGenerator>,
    pub variations: Rc<ScriptedVariations>,
    pub preloader: Rc<ScriptedPreloader>,
}

pub fn fixture() -> Fixture {
    fixture_with(CanvasConfig::default())
}

pub fn fixture_with(config: CanvasConfig) -> Fixture {
    let generator = Rc::new(ScriptedGenerator::default());
    let variations = Rc::new(ScriptedVariations::default());
    let preloader = Rc::new(ScriptedPreloader::default());
    let canvas = Canvas::new(
        config,
        Rc::clone(&generator),
        Rc::clone(&variations),
        Rc::clone(&preloader),
    );
    Fixture {
        canvas,
        generator,
        variations,
        preloader,
    }
}

/// Add a tile with an explicit id at `z`.
pub fn place(canvas: &TestCanvas, name: &str, x: f32, y: f32, z: u32) -> TileId {
    let id = TileId::intern(name);
    canvas.add_tile(CanvasTile::new(id, Position::new(x, y), Size::new(100.0, 100.0), z));
    id
}
