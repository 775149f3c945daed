//! Replicated entity model for boardsync.
//!
//! Defines the contract every synchronizable game object fulfils and the
//! concrete board kinds built on it:
//! - [`Replicated`]: serialize to a [`Record`](boardsync_types::Record),
//!   apply a remote change, compute a delete closure
//! - [`should_apply_change`]: the last-write-wins rule
//! - [`BoardEntity`]: closed enum over the known kinds plus an
//!   `Extension` variant for kinds registered at runtime
//! - [`DeleteAction`]: what must be removed together, and how to clean up
//! - [`Notifier`] / [`BoardEvent`]: change notifications for the UI layer
//!
//! Entities refer to each other by [`Uid`](boardsync_types::Uid); the
//! entity store in `boardsync-store` owns every instance.

mod board_entity;
mod delete;
mod entity;
mod error;
mod event;
pub mod kinds;

pub use board_entity::BoardEntity;
pub use delete::{Cleanup, DeleteAction, DeleteScope, EntityLookup};
pub use entity::{Replicated, should_apply_change, to_attribute_map, write_timestamp};
pub use error::{ModelError, ModelResult};
pub use event::{BoardEvent, Notifier};
pub use kinds::{
    Asset, CharacterData, CharacterSheet, DecorationData, GameAssets, Grid, HitPoints, Layer,
    Position, Scene, Size, SizeCategory, Token, TokenData, TokenDataBody, TokenVariant, TurnOrder,
};
