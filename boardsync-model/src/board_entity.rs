//! The closed set of board entities, plus an escape hatch for kinds
//! registered at runtime.

use crate::delete::{DeleteAction, DeleteScope};
use crate::entity::Replicated;
use crate::error::ModelResult;
use crate::kinds::{GameAssets, Grid, Scene, Token, TokenData, TurnOrder};
use boardsync_types::{AttributeMap, EntityKind, Record, Timestamp, Uid};

/// A live entity owned by the store.
#[derive(Debug)]
pub enum BoardEntity {
    Grid(Grid),
    Scene(Scene),
    Token(Token),
    TokenData(TokenData),
    GameAssets(GameAssets),
    TurnOrder(TurnOrder),
    /// A kind outside the built-in set.
    Extension(Box<dyn Replicated>),
}

macro_rules! delegate {
    ($self:expr, $entity:ident => $body:expr) => {
        match $self {
            BoardEntity::Grid($entity) => $body,
            BoardEntity::Scene($entity) => $body,
            BoardEntity::Token($entity) => $body,
            BoardEntity::TokenData($entity) => $body,
            BoardEntity::GameAssets($entity) => $body,
            BoardEntity::TurnOrder($entity) => $body,
            BoardEntity::Extension($entity) => $body,
        }
    };
}

macro_rules! accessors {
    ($($variant:ident, $ty:ty, $as_ref:ident, $as_mut:ident;)*) => {
        $(
            pub fn $as_ref(&self) -> Option<&$ty> {
                match self {
                    Self::$variant(entity) => Some(entity),
                    _ => None,
                }
            }

            pub fn $as_mut(&mut self) -> Option<&mut $ty> {
                match self {
                    Self::$variant(entity) => Some(entity),
                    _ => None,
                }
            }
        )*
    };
}

impl BoardEntity {
    accessors! {
        Grid, Grid, as_grid, as_grid_mut;
        Scene, Scene, as_scene, as_scene_mut;
        Token, Token, as_token, as_token_mut;
        TokenData, TokenData, as_token_data, as_token_data_mut;
        GameAssets, GameAssets, as_game_assets, as_game_assets_mut;
        TurnOrder, TurnOrder, as_turn_order, as_turn_order_mut;
    }

    pub fn as_extension(&self) -> Option<&dyn Replicated> {
        match self {
            Self::Extension(entity) => Some(entity.as_ref()),
            _ => None,
        }
    }

    pub fn as_extension_mut(&mut self) -> Option<&mut (dyn Replicated + 'static)> {
        match self {
            Self::Extension(entity) => Some(entity.as_mut()),
            _ => None,
        }
    }
}

impl Replicated for BoardEntity {
    fn kind(&self) -> EntityKind {
        delegate!(self, e => e.kind())
    }

    fn uid(&self) -> &Uid {
        delegate!(self, e => e.uid())
    }

    fn attributes(&self) -> ModelResult<AttributeMap> {
        delegate!(self, e => e.attributes())
    }

    fn apply_remote_change(&mut self, record: &Record) -> ModelResult<()> {
        delegate!(self, e => e.apply_remote_change(record))
    }

    fn last_applied(&self) -> Option<Timestamp> {
        delegate!(self, e => e.last_applied())
    }

    fn mark_written(&mut self, timestamp: Timestamp) {
        delegate!(self, e => e.mark_written(timestamp))
    }

    fn should_apply_change(&self, record: &Record) -> bool {
        delegate!(self, e => e.should_apply_change(record))
    }

    fn delete_action(&self, scope: &DeleteScope<'_>, action: &mut DeleteAction) {
        delegate!(self, e => e.delete_action(scope, action))
    }

    fn asset_urls(&self) -> Vec<String> {
        delegate!(self, e => e.asset_urls())
    }

    fn is_local_only(&self) -> bool {
        delegate!(self, e => e.is_local_only())
    }
}

impl From<Grid> for BoardEntity {
    fn from(grid: Grid) -> Self {
        Self::Grid(grid)
    }
}

impl From<Scene> for BoardEntity {
    fn from(scene: Scene) -> Self {
        Self::Scene(scene)
    }
}

impl From<Token> for BoardEntity {
    fn from(token: Token) -> Self {
        Self::Token(token)
    }
}

impl From<TokenData> for BoardEntity {
    fn from(data: TokenData) -> Self {
        Self::TokenData(data)
    }
}

impl From<GameAssets> for BoardEntity {
    fn from(assets: GameAssets) -> Self {
        Self::GameAssets(assets)
    }
}

impl From<TurnOrder> for BoardEntity {
    fn from(turn_order: TurnOrder) -> Self {
        Self::TurnOrder(turn_order)
    }
}

impl From<Box<dyn Replicated>> for BoardEntity {
    fn from(entity: Box<dyn Replicated>) -> Self {
        Self::Extension(entity)
    }
}
