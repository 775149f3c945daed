use super::{GAME_ASSETS, unset_reference};
use crate::entity::{Replicated, ensure_kind, to_attribute_map};
use crate::error::ModelResult;
use boardsync_types::{AttributeMap, EntityKind, Record, Timestamp, Uid};
use serde::{Deserialize, Serialize};

/// An uploaded image available to the game.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Asset {
    pub name: String,
    pub url: String,
}

impl Asset {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// The game's asset library. One per game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameAssets {
    #[serde(skip)]
    uid: Uid,
    assets: Vec<Asset>,
    #[serde(skip)]
    last_applied: Option<Timestamp>,
}

impl Default for GameAssets {
    fn default() -> Self {
        Self {
            uid: unset_reference(),
            assets: Vec::new(),
            last_applied: None,
        }
    }
}

impl GameAssets {
    pub fn new(uid: Uid) -> Self {
        Self {
            uid,
            ..Self::default()
        }
    }

    pub fn from_record(record: &Record) -> ModelResult<Self> {
        let mut assets = Self::new(record.uid.clone());
        assets.apply_remote_change(record)?;
        Ok(assets)
    }

    pub fn assets(&self) -> &[Asset] {
        &self.assets
    }

    /// Adds an asset. An asset with the same url replaces the old entry.
    pub fn add_asset(&mut self, asset: Asset) {
        match self.assets.iter_mut().find(|a| a.url == asset.url) {
            Some(existing) => *existing = asset,
            None => self.assets.push(asset),
        }
    }

    /// Removes the asset with `url`. Returns it if present.
    pub fn remove_asset(&mut self, url: &str) -> Option<Asset> {
        let index = self.assets.iter().position(|a| a.url == url)?;
        Some(self.assets.remove(index))
    }

    pub fn find(&self, url: &str) -> Option<&Asset> {
        self.assets.iter().find(|a| a.url == url)
    }
}

impl Replicated for GameAssets {
    fn kind(&self) -> EntityKind {
        EntityKind::from(GAME_ASSETS)
    }

    fn uid(&self) -> &Uid {
        &self.uid
    }

    fn attributes(&self) -> ModelResult<AttributeMap> {
        to_attribute_map(self)
    }

    fn apply_remote_change(&mut self, record: &Record) -> ModelResult<()> {
        ensure_kind(&self.kind(), record)?;
        let incoming: GameAssets = record.attributes_as()?;
        self.assets = incoming.assets;
        self.last_applied = Some(record.timestamp);
        Ok(())
    }

    fn last_applied(&self) -> Option<Timestamp> {
        self.last_applied
    }

    fn mark_written(&mut self, timestamp: Timestamp) {
        self.last_applied = self.last_applied.max(Some(timestamp));
    }
}
