//! Shared token data.
//!
//! Several tokens may display the same data (a goblin stat block placed
//! five times), and turn orders list data rather than tokens so that a
//! creature keeps its initiative slot while its token is moved around.

use super::game_assets::Asset;
use super::{CHARACTER_TOKEN_DATA, DECORATION_TOKEN_DATA, EMPTY_TOKEN_DATA};
use crate::board_entity::BoardEntity;
use crate::delete::{DeleteAction, DeleteScope};
use crate::entity::{Replicated, ensure_kind, to_attribute_map};
use crate::error::{ModelError, ModelResult};
use boardsync_types::{AttributeMap, EntityKind, Record, Timestamp, Uid};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitPoints {
    pub current: i32,
    pub max: i32,
    pub temporary: i32,
}

impl HitPoints {
    pub fn new(max: i32) -> Self {
        Self {
            current: max,
            max,
            temporary: 0,
        }
    }

    /// Applies damage, draining temporary hit points first. Negative
    /// amounts do nothing.
    pub fn damage(&mut self, amount: i32) {
        let amount = amount.max(0);
        let absorbed = amount.min(self.temporary.max(0));
        self.temporary -= absorbed;
        self.current = self.current.saturating_sub(amount - absorbed).max(0);
    }

    /// Heals up to the maximum.
    pub fn heal(&mut self, amount: i32) {
        self.current = self.current.saturating_add(amount.max(0)).min(self.max);
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeCategory {
    Tiny,
    Small,
    #[default]
    Medium,
    Large,
    Huge,
    Gargantuan,
}

impl SizeCategory {
    /// Grid cells a creature of this size occupies along one axis.
    pub fn cells(self) -> f64 {
        match self {
            Self::Tiny => 0.5,
            Self::Small | Self::Medium => 1.0,
            Self::Large => 2.0,
            Self::Huge => 3.0,
            Self::Gargantuan => 4.0,
        }
    }
}

/// The subset of a character sheet the board displays.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CharacterSheet {
    pub hit_points: HitPoints,
    pub armor_class: i32,
    pub initiative: i32,
    pub speed: u32,
    pub size: SizeCategory,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CharacterData {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tint: Option<String>,
    pub sheet: CharacterSheet,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DecorationData {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset: Option<Asset>,
}

impl DecorationData {
    /// A decoration drawn from a game asset; the asset's url is its image.
    pub fn from_asset(asset: Asset) -> Self {
        Self {
            name: asset.name.clone(),
            image: Some(asset.url.clone()),
            asset: Some(asset),
        }
    }

    fn normalize(&mut self) {
        if let Some(asset) = &self.asset {
            self.image = Some(asset.url.clone());
        }
    }
}

/// Kind-specific payload of a [`TokenData`].
#[derive(Debug, Clone, PartialEq)]
pub enum TokenDataBody {
    Character(CharacterData),
    Decoration(DecorationData),
    Empty,
}

impl TokenDataBody {
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Character(_) => EntityKind::from(CHARACTER_TOKEN_DATA),
            Self::Decoration(_) => EntityKind::from(DECORATION_TOKEN_DATA),
            Self::Empty => EntityKind::from(EMPTY_TOKEN_DATA),
        }
    }

    fn from_record(record: &Record) -> ModelResult<Self> {
        match record.kind.as_str() {
            CHARACTER_TOKEN_DATA => Ok(Self::Character(record.attributes_as()?)),
            DECORATION_TOKEN_DATA => {
                let mut data: DecorationData = record.attributes_as()?;
                data.normalize();
                Ok(Self::Decoration(data))
            }
            EMPTY_TOKEN_DATA => Ok(Self::Empty),
            _ => Err(ModelError::UnsupportedKind(record.kind.clone())),
        }
    }
}

/// Data shared by every token that displays it.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenData {
    uid: Uid,
    pub body: TokenDataBody,
    last_applied: Option<Timestamp>,
}

impl TokenData {
    pub fn new(uid: Uid, body: TokenDataBody) -> Self {
        Self {
            uid,
            body,
            last_applied: None,
        }
    }

    pub fn character(uid: Uid, data: CharacterData) -> Self {
        Self::new(uid, TokenDataBody::Character(data))
    }

    pub fn decoration(uid: Uid, mut data: DecorationData) -> Self {
        data.normalize();
        Self::new(uid, TokenDataBody::Decoration(data))
    }

    pub fn empty(uid: Uid) -> Self {
        Self::new(uid, TokenDataBody::Empty)
    }

    pub fn from_record(record: &Record) -> ModelResult<Self> {
        let mut data = Self::new(record.uid.clone(), TokenDataBody::from_record(record)?);
        data.last_applied = Some(record.timestamp);
        Ok(data)
    }

    /// Display name, empty for [`TokenDataBody::Empty`].
    pub fn name(&self) -> &str {
        match &self.body {
            TokenDataBody::Character(data) => &data.name,
            TokenDataBody::Decoration(data) => &data.name,
            TokenDataBody::Empty => "",
        }
    }

    pub fn image(&self) -> Option<&str> {
        match &self.body {
            TokenDataBody::Character(data) => data.image.as_deref(),
            TokenDataBody::Decoration(data) => data.image.as_deref(),
            TokenDataBody::Empty => None,
        }
    }

    pub fn as_character(&self) -> Option<&CharacterData> {
        match &self.body {
            TokenDataBody::Character(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_character_mut(&mut self) -> Option<&mut CharacterData> {
        match &mut self.body {
            TokenDataBody::Character(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_decoration(&self) -> Option<&DecorationData> {
        match &self.body {
            TokenDataBody::Decoration(data) => Some(data),
            _ => None,
        }
    }
}

impl Replicated for TokenData {
    fn kind(&self) -> EntityKind {
        self.body.kind()
    }

    fn uid(&self) -> &Uid {
        &self.uid
    }

    fn attributes(&self) -> ModelResult<AttributeMap> {
        match &self.body {
            TokenDataBody::Character(data) => to_attribute_map(data),
            TokenDataBody::Decoration(data) => to_attribute_map(data),
            TokenDataBody::Empty => Ok(AttributeMap::new()),
        }
    }

    fn apply_remote_change(&mut self, record: &Record) -> ModelResult<()> {
        ensure_kind(&self.kind(), record)?;
        self.body = TokenDataBody::from_record(record)?;
        self.last_applied = Some(record.timestamp);
        Ok(())
    }

    fn last_applied(&self) -> Option<Timestamp> {
        self.last_applied
    }

    fn mark_written(&mut self, timestamp: Timestamp) {
        self.last_applied = self.last_applied.max(Some(timestamp));
    }

    /// Takes every token displaying this data with it.
    fn delete_action(&self, scope: &DeleteScope<'_>, action: &mut DeleteAction) {
        if !scope.accumulate(&self.uid, self.kind(), action) {
            return;
        }
        let mut dependents: Vec<Uid> = scope
            .entities()
            .filter_map(|entity| match entity {
                BoardEntity::Token(token) if token.token_data_uid() == &self.uid => {
                    Some(token.uid().clone())
                }
                _ => None,
            })
            .collect();
        dependents.sort();
        for uid in &dependents {
            scope.cascade(uid, action);
        }
    }

    fn asset_urls(&self) -> Vec<String> {
        self.image()
            .filter(|url| !url.is_empty())
            .map(|url| vec![url.to_string()])
            .unwrap_or_default()
    }
}
