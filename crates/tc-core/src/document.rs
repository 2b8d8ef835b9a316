//! Persistent document shape.
//!
//! The document store only ever sees `StoredTile`s: the durable fields of a
//! tile with UI-only state (`selected`, `display_state`) stripped. Loading
//! puts every tile back into `Loading` so its stored URL is re-verified by a
//! fresh preload instead of being trusted.

use crate::id::TileId;
use crate::model::{CanvasTile, DisplayState, Position, Size};
use crate::store::TileStore;
use crate::zindex::ZIndexAllocator;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Current on-disk format version.
pub const DOCUMENT_VERSION: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("invalid document JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to encode document: {0}")]
    Encode(#[from] rmp_serde::encode::Error),
    #[error("failed to decode document: {0}")]
    Decode(#[from] rmp_serde::decode::Error),
    #[error("unsupported document version {found}")]
    UnsupportedVersion { found: u32 },
}

/// The serializable part of a tile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredTile {
    pub id: TileId,
    pub position: Position,
    pub size: Size,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    pub z_index: u32,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub src: String,
}

impl From<&CanvasTile> for StoredTile {
    fn from(tile: &CanvasTile) -> Self {
        Self {
            id: tile.id,
            position: tile.position,
            size: tile.size,
            prompt: tile.prompt.clone(),
            z_index: tile.z_index,
            src: tile.src.clone(),
        }
    }
}

impl From<StoredTile> for CanvasTile {
    fn from(stored: StoredTile) -> Self {
        CanvasTile {
            id: stored.id,
            position: stored.position,
            size: stored.size,
            prompt: stored.prompt,
            display_state: DisplayState::Loading,
            src: stored.src,
            selected: false,
            z_index: stored.z_index,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub tiles: Vec<StoredTile>,
}

fn default_version() -> u32 {
    DOCUMENT_VERSION
}

impl Default for Document {
    fn default() -> Self {
        Self {
            version: DOCUMENT_VERSION,
            tiles: Vec::new(),
        }
    }
}

impl Document {
    /// Snapshot a store for persistence.
    pub fn from_store(store: &TileStore) -> Self {
        Self {
            version: DOCUMENT_VERSION,
            tiles: store.iter().map(StoredTile::from).collect(),
        }
    }

    /// Rebuild a store with the default z ceiling.
    pub fn into_store(self) -> TileStore {
        self.into_store_with(&ZIndexAllocator::default())
    }

    /// Rebuild a store. Duplicate ids keep their first occurrence; a
    /// z-order with duplicates or values outside `1..=ceiling` is
    /// renormalized by `allocator`.
    pub fn into_store_with(self, allocator: &ZIndexAllocator) -> TileStore {
        let mut seen = HashSet::new();
        let mut store = TileStore::new();
        for stored in self.tiles {
            if !seen.insert(stored.id) {
                log::warn!("document: dropping duplicate tile {}", stored.id);
                continue;
            }
            store.add(CanvasTile::from(stored));
        }

        if !allocator.is_compact(&store) {
            log::warn!("document: z-order out of range or not distinct, renormalizing");
            allocator.renormalize(&mut store);
        }
        store
    }

    pub fn to_json(&self) -> Result<String, DocumentError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self, DocumentError> {
        let doc: Document = serde_json::from_str(text)?;
        doc.check_version()
    }

    /// Compact binary encoding (MessagePack).
    pub fn to_bytes(&self) -> Result<Vec<u8>, DocumentError> {
        Ok(rmp_serde::to_vec_named(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DocumentError> {
        let doc: Document = rmp_serde::from_slice(bytes)?;
        doc.check_version()
    }

    fn check_version(self) -> Result<Self, DocumentError> {
        if self.version > DOCUMENT_VERSION {
            return Err(DocumentError::UnsupportedVersion {
                found: self.version,
            });
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_tile_uses_camel_case_fields() {
        let stored = StoredTile {
            id: TileId::intern("doc_camel"),
            position: Position::new(1.0, 2.0),
            size: Size::new(3.0, 4.0),
            prompt: None,
            z_index: 9,
            src: String::new(),
        };
        let json = serde_json::to_value(&stored).unwrap();
        assert_eq!(json["zIndex"], 9);
        assert_eq!(json["id"], "doc_camel");
        assert!(json.get("prompt").is_none());
        assert!(json.get("src").is_none());
    }

    #[test]
    fn newer_version_is_rejected() {
        let err = Document::from_json(r#"{ "version": 99, "tiles": [] }"#).unwrap_err();
        assert!(matches!(err, DocumentError::UnsupportedVersion { found: 99 }));
    }

    #[test]
    fn missing_fields_default() {
        let doc = Document::from_json("{}").unwrap();
        assert_eq!(doc, Document::default());
    }

    #[test]
    fn duplicate_z_is_renormalized_on_load() {
        let doc = Document::from_json(
            r#"{ "tiles": [
                { "id": "dup_a", "position": {"x":0,"y":0}, "size": {"width":1,"height":1}, "zIndex": 5 },
                { "id": "dup_b", "position": {"x":0,"y":0}, "size": {"width":1,"height":1}, "zIndex": 5 }
            ] }"#,
        )
        .unwrap();
        let store = doc.into_store();
        let zs: Vec<u32> = store.iter().map(|t| t.z_index).collect();
        assert_eq!(zs, [1, 2]);
    }

    #[test]
    fn load_respects_configured_ceiling() {
        let tile = |name, z| StoredTile {
            id: TileId::intern(name),
            position: Position::default(),
            size: Size::default(),
            prompt: None,
            z_index: z,
            src: String::new(),
        };
        let doc = Document {
            version: DOCUMENT_VERSION,
            tiles: vec![tile("ceil_a", 40), tile("ceil_b", 7)],
        };
        let store = doc.into_store_with(&ZIndexAllocator::new(20));
        let zs: Vec<u32> = store.iter().map(|t| t.z_index).collect();
        assert_eq!(zs, [2, 1]);
    }

    #[test]
    fn duplicate_ids_keep_first() {
        let tile = |z| StoredTile {
            id: TileId::intern("doc_same"),
            position: Position::default(),
            size: Size::default(),
            prompt: Some(format!("p{z}")),
            z_index: z,
            src: String::new(),
        };
        let doc = Document {
            version: DOCUMENT_VERSION,
            tiles: vec![tile(1), tile(2)],
        };
        let store = doc.into_store();
        assert_eq!(store.len(), 1);
        assert_eq!(
            store.iter().next().unwrap().prompt.as_deref(),
            Some("p1")
        );
    }
}
