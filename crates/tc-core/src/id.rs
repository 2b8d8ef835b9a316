//! Tile identifiers.
//!
//! Ids are interned, so a `TileId` is a `Copy` key that hashes in O(1).
//! Tiles created at runtime get `tile-<uuid>`; tiles read from a document
//! keep whatever id the document stored.

use lasso::{Spur, ThreadedRodeo};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;

static TILE_IDS: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileId(Spur);

impl TileId {
    /// Prefix of ids minted by [`TileId::generate`].
    pub const GENERATED_PREFIX: &'static str = "tile-";

    pub fn intern(name: &str) -> Self {
        TileId(TILE_IDS.get_or_intern(name))
    }

    pub fn as_str(self) -> &'static str {
        TILE_IDS.resolve(&self.0)
    }

    /// Mint a fresh id. Uuids keep ids from separate sessions apart once
    /// their documents are merged onto one canvas.
    pub fn generate() -> Self {
        Self::intern(&format!(
            "{}{}",
            Self::GENERATED_PREFIX,
            uuid::Uuid::new_v4()
        ))
    }
}

impl fmt::Debug for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.as_str())
    }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for TileId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Documents must name every tile; a blank id is rejected on load.
impl<'de> Deserialize<'de> for TileId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        if name.trim().is_empty() {
            return Err(D::Error::custom("tile id must not be blank"));
        }
        Ok(TileId::intern(&name))
    }
}
