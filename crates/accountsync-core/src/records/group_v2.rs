//! V2 group records
//!
//! A V2 group is addressed by its master key. A payload whose master key isn't
//! exactly [`GROUP_V2_MASTER_KEY_LENGTH`] bytes can't be represented here:
//! [`GroupV2Record::from_proto`] returns `None` and the translation layer
//! degrades the item to an unknown record.

use tracing::warn;

use crate::error::SyncResult;
use crate::proto::{self, StorySendMode};
use crate::records::diff::FieldDiff;
use crate::types::StorageId;

pub const GROUP_V2_MASTER_KEY_LENGTH: usize = 32;

#[derive(Debug, Clone, PartialEq)]
pub struct GroupV2Record {
    id: StorageId,
    proto: proto::GroupV2Record,
    unknown_fields: Option<Vec<u8>>,
    master_key: [u8; GROUP_V2_MASTER_KEY_LENGTH],
}

impl GroupV2Record {
    /// `None` if the master key has the wrong length
    pub fn from_proto(
        raw_id: impl Into<Vec<u8>>,
        proto: proto::GroupV2Record,
        unknown_fields: Option<Vec<u8>>,
    ) -> Option<Self> {
        let id = StorageId::for_group_v2(raw_id);
        let master_key = match <[u8; GROUP_V2_MASTER_KEY_LENGTH]>::try_from(proto.master_key.as_slice()) {
            Ok(key) => key,
            Err(_) => {
                warn!(%id, len = proto.master_key.len(), "GroupV2 master key has wrong length");
                return None;
            }
        };
        Some(Self {
            id,
            proto,
            unknown_fields,
            master_key,
        })
    }

    pub fn decode_payload(raw_id: impl Into<Vec<u8>>, payload: &[u8]) -> SyncResult<Option<Self>> {
        let (proto, unknown_fields) = proto::decode_with_unknown(payload)?;
        Ok(Self::from_proto(raw_id, proto, unknown_fields))
    }

    pub fn encode_payload(&self) -> Vec<u8> {
        proto::encode_with_unknown(&self.proto, self.unknown_fields.as_deref())
    }

    pub fn with_raw_id(&self, raw_id: impl Into<Vec<u8>>) -> Self {
        Self {
            id: self.id.with_new_bytes(raw_id),
            ..self.clone()
        }
    }

    pub fn to_builder(&self) -> GroupV2RecordBuilder {
        GroupV2RecordBuilder {
            raw_id: self.id.raw().to_vec(),
            proto: self.proto.clone(),
            unknown_fields: self.unknown_fields.clone(),
            master_key: self.master_key,
        }
    }

    pub fn id(&self) -> &StorageId {
        &self.id
    }

    pub fn proto(&self) -> &proto::GroupV2Record {
        &self.proto
    }

    pub fn has_unknown_fields(&self) -> bool {
        self.unknown_fields.is_some()
    }

    pub fn unknown_fields(&self) -> Option<&[u8]> {
        self.unknown_fields.as_deref()
    }

    pub fn master_key(&self) -> &[u8; GROUP_V2_MASTER_KEY_LENGTH] {
        &self.master_key
    }

    pub fn is_blocked(&self) -> bool {
        self.proto.blocked
    }

    pub fn is_profile_sharing_enabled(&self) -> bool {
        self.proto.whitelisted
    }

    pub fn is_archived(&self) -> bool {
        self.proto.archived
    }

    pub fn is_forced_unread(&self) -> bool {
        self.proto.marked_unread
    }

    pub fn muted_until(&self) -> u64 {
        self.proto.muted_until_timestamp
    }

    pub fn notify_for_mentions_when_muted(&self) -> bool {
        !self.proto.dont_notify_for_mentions_if_muted
    }

    pub fn should_hide_story(&self) -> bool {
        self.proto.hide_story
    }

    /// Unrecognized modes read as [`StorySendMode::Default`]
    pub fn story_send_mode(&self) -> StorySendMode {
        self.proto.story_send_mode()
    }

    pub fn describe_diff(&self, other: &GroupV2Record) -> Vec<&'static str> {
        FieldDiff::new()
            .field("id", &self.id, &other.id)
            .field("master_key", &self.master_key, &other.master_key)
            .field("blocked", &self.is_blocked(), &other.is_blocked())
            .field(
                "profile_sharing",
                &self.is_profile_sharing_enabled(),
                &other.is_profile_sharing_enabled(),
            )
            .field("archived", &self.is_archived(), &other.is_archived())
            .field("forced_unread", &self.is_forced_unread(), &other.is_forced_unread())
            .field("muted_until", &self.muted_until(), &other.muted_until())
            .field(
                "notify_for_mentions_when_muted",
                &self.notify_for_mentions_when_muted(),
                &other.notify_for_mentions_when_muted(),
            )
            .field("hide_story", &self.should_hide_story(), &other.should_hide_story())
            .field("story_send_mode", &self.story_send_mode(), &other.story_send_mode())
            .field("unknown_fields", &self.unknown_fields, &other.unknown_fields)
            .finish()
    }
}

/// Builder for [`GroupV2Record`].
///
/// Takes the master key as a fixed-size array, so a built record always has a
/// valid key.
#[derive(Debug, Clone)]
pub struct GroupV2RecordBuilder {
    raw_id: Vec<u8>,
    proto: proto::GroupV2Record,
    unknown_fields: Option<Vec<u8>>,
    master_key: [u8; GROUP_V2_MASTER_KEY_LENGTH],
}

impl GroupV2RecordBuilder {
    pub fn new(raw_id: impl Into<Vec<u8>>, master_key: [u8; GROUP_V2_MASTER_KEY_LENGTH]) -> Self {
        Self {
            raw_id: raw_id.into(),
            proto: proto::GroupV2Record::default(),
            unknown_fields: None,
            master_key,
        }
    }

    pub fn from_unknown_fields(
        raw_id: impl Into<Vec<u8>>,
        master_key: [u8; GROUP_V2_MASTER_KEY_LENGTH],
        unknown_fields: &[u8],
    ) -> SyncResult<Self> {
        let (proto, unknown_fields) = proto::decode_with_unknown(unknown_fields)?;
        Ok(Self {
            raw_id: raw_id.into(),
            proto,
            unknown_fields,
            master_key,
        })
    }

    pub fn with_blocked(mut self, blocked: bool) -> Self {
        self.proto.blocked = blocked;
        self
    }

    pub fn with_profile_sharing(mut self, enabled: bool) -> Self {
        self.proto.whitelisted = enabled;
        self
    }

    pub fn with_archived(mut self, archived: bool) -> Self {
        self.proto.archived = archived;
        self
    }

    pub fn with_forced_unread(mut self, unread: bool) -> Self {
        self.proto.marked_unread = unread;
        self
    }

    pub fn with_muted_until(mut self, timestamp: u64) -> Self {
        self.proto.muted_until_timestamp = timestamp;
        self
    }

    pub fn with_notify_for_mentions_when_muted(mut self, notify: bool) -> Self {
        self.proto.dont_notify_for_mentions_if_muted = !notify;
        self
    }

    pub fn with_hide_story(mut self, hide: bool) -> Self {
        self.proto.hide_story = hide;
        self
    }

    pub fn with_story_send_mode(mut self, mode: StorySendMode) -> Self {
        self.proto.set_story_send_mode(mode);
        self
    }

    pub fn build(mut self) -> GroupV2Record {
        self.proto.master_key = self.master_key.to_vec();
        let id = StorageId::for_group_v2(self.raw_id);
        GroupV2Record {
            id,
            proto: self.proto,
            unknown_fields: self.unknown_fields,
            master_key: self.master_key,
        }
    }
}
