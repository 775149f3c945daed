//! Entity store for boardsync.
//!
//! The [`EntityStore`] owns every live entity of a session. Remote records
//! are staged, sorted by their kind's priority in the [`KindRegistry`] and
//! converted so that dependencies (Grid before Scene, Scene and TokenData
//! before Token) always resolve within a batch.

pub mod assets;
pub mod converters;
pub mod error;
pub mod registry;
pub mod store;

pub use assets::AssetRefs;
pub use error::{StoreError, StoreResult};
pub use registry::{Converter, KindRegistry};
pub use store::{Conversion, ConversionReport, EntityStore};
