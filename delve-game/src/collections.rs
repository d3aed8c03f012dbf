//! Collectible item catalog embedded from `assets/collections.json`.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::encounters::EncounterKind;

const DEFAULT_COLLECTIONS_DATA: &str = include_str!("../assets/collections.json");

/// An item as it sits in a player's inventory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CollectedItem {
    pub id: String,
    #[serde(rename = "type")]
    pub item_type: String,
    pub set_id: String,
    pub value: u32,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDef {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub value: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionSet {
    pub id: String,
    pub name: String,
    pub item_type: String,
    /// Encounter kinds whose drops come from this set.
    #[serde(default)]
    pub sources: Vec<EncounterKind>,
    #[serde(default)]
    pub items: Vec<ItemDef>,
}

impl CollectionSet {
    #[must_use]
    pub fn item(&self, def: &ItemDef, value: u32) -> CollectedItem {
        CollectedItem {
            id: def.id.clone(),
            item_type: self.item_type.clone(),
            set_id: self.id.clone(),
            value,
            name: def.name.clone(),
            description: def.description.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CollectionCatalog {
    #[serde(default)]
    pub sets: Vec<CollectionSet>,
}

impl CollectionCatalog {
    /// Parse a catalog.
    ///
    /// # Errors
    ///
    /// Returns the JSON error for malformed data.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    #[must_use]
    pub fn load_from_static() -> Self {
        Self::from_json(DEFAULT_COLLECTIONS_DATA).unwrap_or_else(|err| {
            log::warn!("bundled collection catalog failed to parse: {err}");
            Self::default()
        })
    }

    /// Sets that `kind` drops from.
    pub fn sets_for(&self, kind: EncounterKind) -> impl Iterator<Item = &CollectionSet> {
        self.sets
            .iter()
            .filter(move |set| set.sources.contains(&kind) && !set.items.is_empty())
    }

    #[must_use]
    pub fn set(&self, set_id: &str) -> Option<&CollectionSet> {
        self.sets.iter().find(|set| set.id == set_id)
    }
}

static CATALOG: Lazy<CollectionCatalog> = Lazy::new(CollectionCatalog::load_from_static);

/// The bundled catalog, parsed once.
#[must_use]
pub fn catalog() -> &'static CollectionCatalog {
    &CATALOG
}
