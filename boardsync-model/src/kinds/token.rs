use super::{CHARACTER_TOKEN, CHARACTER_TOKEN_DATA, DECORATION_TOKEN, DECORATION_TOKEN_DATA, EMPTY_TOKEN_DATA};
use super::{Position, unset_reference};
use crate::entity::{Replicated, ensure_kind, to_attribute_map};
use crate::error::{ModelError, ModelResult};
use boardsync_types::{AttributeMap, EntityKind, Record, Timestamp, Uid};
use serde::{Deserialize, Serialize};

/// Which token kind a [`Token`] is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TokenVariant {
    #[default]
    Character,
    Decoration,
}

impl TokenVariant {
    pub fn kind(self) -> EntityKind {
        match self {
            Self::Character => EntityKind::from(CHARACTER_TOKEN),
            Self::Decoration => EntityKind::from(DECORATION_TOKEN),
        }
    }

    pub fn from_kind(kind: &EntityKind) -> Option<Self> {
        match kind.as_str() {
            CHARACTER_TOKEN => Some(Self::Character),
            DECORATION_TOKEN => Some(Self::Decoration),
            _ => None,
        }
    }

    /// Whether a token of this variant may display data of `data_kind`.
    pub fn accepts_data(self, data_kind: &EntityKind) -> bool {
        match self {
            Self::Character => data_kind == CHARACTER_TOKEN_DATA,
            Self::Decoration => {
                data_kind == DECORATION_TOKEN_DATA || data_kind == EMPTY_TOKEN_DATA
            }
        }
    }
}

/// Render layer a token is drawn on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Layer {
    GridBackground,
    Grid,
    #[default]
    Token,
}

/// A piece on a scene, displaying shared [`TokenData`](super::TokenData).
///
/// `sceneUid` and `tokenDataUid` are fixed at creation; remote changes move,
/// resize or re-layer the token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    #[serde(skip)]
    uid: Uid,
    #[serde(skip)]
    variant: TokenVariant,
    #[serde(default = "unset_reference")]
    scene_uid: Uid,
    #[serde(default = "unset_reference")]
    token_data_uid: Uid,
    #[serde(default)]
    pub position: Position,
    #[serde(default = "default_extent")]
    pub width: f64,
    #[serde(default = "default_extent")]
    pub height: f64,
    #[serde(default)]
    pub layer: Layer,
    #[serde(skip)]
    ghost: bool,
    #[serde(skip)]
    last_applied: Option<Timestamp>,
}

fn default_extent() -> f64 {
    super::Grid::DEFAULT_CELL_SIZE
}

impl Token {
    pub fn new(variant: TokenVariant, uid: Uid, scene_uid: Uid, token_data_uid: Uid) -> Self {
        Self {
            uid,
            variant,
            scene_uid,
            token_data_uid,
            position: Position::default(),
            width: default_extent(),
            height: default_extent(),
            layer: Layer::default(),
            ghost: false,
            last_applied: None,
        }
    }

    /// Reconstructs a token whose scene and token data are already resolved.
    pub fn from_record(record: &Record, scene_uid: Uid, token_data_uid: Uid) -> ModelResult<Self> {
        let variant = TokenVariant::from_kind(&record.kind)
            .ok_or_else(|| ModelError::UnsupportedKind(record.kind.clone()))?;
        let mut token = Self::new(variant, record.uid.clone(), scene_uid, token_data_uid);
        token.apply_remote_change(record)?;
        Ok(token)
    }

    pub fn variant(&self) -> TokenVariant {
        self.variant
    }

    pub fn scene_uid(&self) -> &Uid {
        &self.scene_uid
    }

    pub fn token_data_uid(&self) -> &Uid {
        &self.token_data_uid
    }

    /// A local-only copy used as a drag preview.
    pub fn ghost(&self, uid: Uid) -> Self {
        Self {
            uid,
            ghost: true,
            last_applied: None,
            ..self.clone()
        }
    }

    pub fn is_ghost(&self) -> bool {
        self.ghost
    }
}

impl Replicated for Token {
    fn kind(&self) -> EntityKind {
        self.variant.kind()
    }

    fn uid(&self) -> &Uid {
        &self.uid
    }

    fn attributes(&self) -> ModelResult<AttributeMap> {
        to_attribute_map(self)
    }

    fn apply_remote_change(&mut self, record: &Record) -> ModelResult<()> {
        ensure_kind(&self.kind(), record)?;
        let incoming: Token = record.attributes_as()?;
        self.position = incoming.position;
        self.width = incoming.width;
        self.height = incoming.height;
        self.layer = incoming.layer;
        self.last_applied = Some(record.timestamp);
        Ok(())
    }

    fn last_applied(&self) -> Option<Timestamp> {
        self.last_applied
    }

    fn mark_written(&mut self, timestamp: Timestamp) {
        self.last_applied = self.last_applied.max(Some(timestamp));
    }

    fn is_local_only(&self) -> bool {
        self.ghost
    }
}
