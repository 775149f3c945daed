use super::{GRID, Position, Size, unset_reference};
use crate::entity::{Replicated, ensure_kind, to_attribute_map};
use crate::error::ModelResult;
use boardsync_types::{AttributeMap, EntityKind, Record, Timestamp, Uid};
use serde::{Deserialize, Serialize};

/// The square grid drawn under a scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Grid {
    #[serde(skip)]
    uid: Uid,
    pub cell_size: f64,
    pub size: Size,
    pub hover: bool,
    pub position: Position,
    pub opacity: f64,
    #[serde(skip)]
    last_applied: Option<Timestamp>,
}

impl Grid {
    pub const DEFAULT_CELL_SIZE: f64 = 200.0;
    pub const DEFAULT_EXTENT: f64 = 6000.0;

    /// A grid with default geometry.
    pub fn new(uid: Uid) -> Self {
        Self {
            uid,
            ..Self::default()
        }
    }

    /// Reconstructs a grid from a record.
    pub fn from_record(record: &Record) -> ModelResult<Self> {
        let mut grid = Self::new(record.uid.clone());
        grid.apply_remote_change(record)?;
        Ok(grid)
    }

    /// Number of whole cells along each axis.
    pub fn cells(&self) -> (u32, u32) {
        if self.cell_size <= 0.0 {
            return (0, 0);
        }
        (
            (self.size.width / self.cell_size).floor() as u32,
            (self.size.height / self.cell_size).floor() as u32,
        )
    }

    /// Snaps a board position to the top-left corner of its cell.
    pub fn snap(&self, position: Position) -> Position {
        if self.cell_size <= 0.0 {
            return position;
        }
        let snap_axis = |value: f64, origin: f64| {
            origin + ((value - origin) / self.cell_size).floor() * self.cell_size
        };
        Position::new(
            snap_axis(position.x, self.position.x),
            snap_axis(position.y, self.position.y),
        )
    }
}

impl Default for Grid {
    fn default() -> Self {
        Self {
            uid: unset_reference(),
            cell_size: Self::DEFAULT_CELL_SIZE,
            size: Size::new(Self::DEFAULT_EXTENT, Self::DEFAULT_EXTENT),
            hover: true,
            position: Position::default(),
            opacity: 1.0,
            last_applied: None,
        }
    }
}

impl Replicated for Grid {
    fn kind(&self) -> EntityKind {
        EntityKind::from(GRID)
    }

    fn uid(&self) -> &Uid {
        &self.uid
    }

    fn attributes(&self) -> ModelResult<AttributeMap> {
        to_attribute_map(self)
    }

    fn apply_remote_change(&mut self, record: &Record) -> ModelResult<()> {
        ensure_kind(&self.kind(), record)?;
        let incoming: Grid = record.attributes_as()?;
        self.cell_size = incoming.cell_size;
        self.size = incoming.size;
        self.hover = incoming.hover;
        self.position = incoming.position;
        self.opacity = incoming.opacity;
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
