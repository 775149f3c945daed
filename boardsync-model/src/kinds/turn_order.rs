use super::{TURN_ORDER, unset_reference};
use crate::entity::{Replicated, ensure_kind, to_attribute_map};
use crate::error::ModelResult;
use boardsync_types::{AttributeMap, EntityKind, Record, Timestamp, Uid};
use serde::{Deserialize, Serialize};

/// Initiative order of a scene, as an ordered list of token data uids.
///
/// The list order is the turn sequence and survives round-trips.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnOrder {
    #[serde(skip)]
    uid: Uid,
    #[serde(default = "unset_reference")]
    scene_uid: Uid,
    #[serde(default)]
    token_data_uids: Vec<Uid>,
    #[serde(skip)]
    last_applied: Option<Timestamp>,
}

impl TurnOrder {
    pub fn new(uid: Uid, scene_uid: Uid) -> Self {
        Self {
            uid,
            scene_uid,
            token_data_uids: Vec::new(),
            last_applied: None,
        }
    }

    /// Reconstructs a turn order whose scene is resolved. Participants are
    /// taken from `participants`, already filtered to live token data.
    pub fn from_record(record: &Record, scene_uid: Uid, participants: Vec<Uid>) -> ModelResult<Self> {
        ensure_kind(&EntityKind::from(TURN_ORDER), record)?;
        let mut turn_order = Self::new(record.uid.clone(), scene_uid);
        turn_order.token_data_uids = participants;
        turn_order.last_applied = Some(record.timestamp);
        Ok(turn_order)
    }

    /// Reads the participant list of a record without building an entity.
    pub fn participants_of(record: &Record) -> ModelResult<Vec<Uid>> {
        let incoming: TurnOrder = record.attributes_as()?;
        Ok(incoming.token_data_uids)
    }

    pub fn scene_uid(&self) -> &Uid {
        &self.scene_uid
    }

    pub fn participants(&self) -> &[Uid] {
        &self.token_data_uids
    }

    pub fn contains(&self, token_data_uid: &Uid) -> bool {
        self.token_data_uids.contains(token_data_uid)
    }

    /// Appends a participant. Returns false if already listed.
    pub fn add_participant(&mut self, token_data_uid: Uid) -> bool {
        if self.contains(&token_data_uid) {
            return false;
        }
        self.token_data_uids.push(token_data_uid);
        true
    }

    /// Removes a participant, keeping the others in order.
    pub fn remove_participant(&mut self, token_data_uid: &Uid) -> bool {
        let before = self.token_data_uids.len();
        self.token_data_uids.retain(|uid| uid != token_data_uid);
        self.token_data_uids.len() != before
    }

    /// Keeps only participants for which `keep` returns true.
    pub fn retain_participants(&mut self, keep: impl FnMut(&Uid) -> bool) {
        self.token_data_uids.retain(keep);
    }
}

impl Replicated for TurnOrder {
    fn kind(&self) -> EntityKind {
        EntityKind::from(TURN_ORDER)
    }

    fn uid(&self) -> &Uid {
        &self.uid
    }

    fn attributes(&self) -> ModelResult<AttributeMap> {
        to_attribute_map(self)
    }

    /// Replaces the participant list. The caller filters out token data
    /// that is not live; see the store's turn order converter.
    fn apply_remote_change(&mut self, record: &Record) -> ModelResult<()> {
        ensure_kind(&self.kind(), record)?;
        self.token_data_uids = Self::participants_of(record)?;
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
