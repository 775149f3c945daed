//! Concrete board entity kinds.
//!
//! Each kind keeps its replicated fields as plain struct fields with serde
//! attributes (camelCase on the wire); envelope and local-only state is
//! `#[serde(skip)]`.

mod game_assets;
mod grid;
mod scene;
mod token;
mod token_data;
mod turn_order;

pub use game_assets::{Asset, GameAssets};
pub use grid::Grid;
pub use scene::Scene;
pub use token::{Layer, Token, TokenVariant};
pub use token_data::{
    CharacterData, CharacterSheet, DecorationData, HitPoints, SizeCategory, TokenData,
    TokenDataBody,
};
pub use turn_order::TurnOrder;

use serde::{Deserialize, Serialize};

pub const GRID: &str = "Grid";
pub const SCENE: &str = "Scene";
pub const EMPTY_TOKEN_DATA: &str = "EmptyTokenData";
pub const CHARACTER_TOKEN_DATA: &str = "CharacterTokenData";
pub const DECORATION_TOKEN_DATA: &str = "DecorationTokenData";
pub const CHARACTER_TOKEN: &str = "CharacterToken";
pub const DECORATION_TOKEN: &str = "DecorationToken";
pub const TURN_ORDER: &str = "TurnOrder";
pub const GAME_ASSETS: &str = "GameAssets";

/// Built-in kinds in dependency order (referenced kinds first).
pub const BUILTIN_KINDS: [&str; 9] = [
    GRID,
    SCENE,
    EMPTY_TOKEN_DATA,
    CHARACTER_TOKEN_DATA,
    DECORATION_TOKEN_DATA,
    CHARACTER_TOKEN,
    DECORATION_TOKEN,
    TURN_ORDER,
    GAME_ASSETS,
];

/// A point on the board, in board pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Placeholder for a reference attribute missing from a record.
pub(crate) fn unset_reference() -> boardsync_types::Uid {
    boardsync_types::Uid::from_string("")
}
