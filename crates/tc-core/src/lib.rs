pub mod config;
pub mod document;
pub mod id;
pub mod layout;
pub mod model;
pub mod store;
pub mod zindex;

pub use config::CanvasConfig;
pub use document::{Document, DocumentError, StoredTile};
pub use id::TileId;
pub use layout::{CrossDirection, CrossLayout, Placement};
pub use model::*;
pub use store::TileStore;
pub use zindex::{MAX_Z, ZIndexAllocator};
