//! Typed storage records
//!
//! Each remote item decrypts to exactly one record kind. [`StorageRecord`] is
//! the sum of those kinds plus [`StorageRecord::Unknown`] for items this client
//! can't interpret. Every typed record keeps:
//!
//! - its [`StorageId`], whose type tag always matches the record kind
//! - the decoded wire payload
//! - eagerly validated views of the payload's optional fields
//! - the exact bytes of any fields this client version doesn't recognize
//!
//! Records are immutable. Changes go through the per-kind builder, which can be
//! seeded from a previously captured unknown-field blob so data written by
//! newer clients is carried forward.

use std::fmt;

use crate::error::{SyncError, SyncResult};
use crate::types::{StorageId, StorageIdType};

pub mod account;
pub mod call_link;
pub mod contact;
pub(crate) mod diff;
pub mod group_v1;
pub mod group_v2;
pub mod story_distribution_list;

pub use account::{
    AccountRecord, AccountRecordBuilder, Payments, PinnedConversation, Subscriber,
    PAYMENTS_ENTROPY_LENGTH, SUBSCRIBER_ID_LENGTH,
};
pub use call_link::{CallLinkRecord, CallLinkRecordBuilder};
pub use contact::{ContactRecord, ContactRecordBuilder};
pub use group_v1::{GroupV1Record, GroupV1RecordBuilder};
pub use group_v2::{GroupV2Record, GroupV2RecordBuilder, GROUP_V2_MASTER_KEY_LENGTH};
pub use story_distribution_list::{
    StoryDistributionListRecord, StoryDistributionListRecordBuilder,
};

/// One decrypted storage item
#[derive(Debug, Clone, PartialEq)]
pub enum StorageRecord {
    Contact(ContactRecord),
    GroupV1(GroupV1Record),
    GroupV2(GroupV2Record),
    Account(AccountRecord),
    StoryDistributionList(StoryDistributionListRecord),
    CallLink(CallLinkRecord),
    /// An item whose kind this client doesn't know, or whose payload didn't
    /// match its identifier. Read-only: it is never re-uploaded.
    Unknown(StorageId),
}

impl StorageRecord {
    pub fn id(&self) -> &StorageId {
        match self {
            StorageRecord::Contact(r) => r.id(),
            StorageRecord::GroupV1(r) => r.id(),
            StorageRecord::GroupV2(r) => r.id(),
            StorageRecord::Account(r) => r.id(),
            StorageRecord::StoryDistributionList(r) => r.id(),
            StorageRecord::CallLink(r) => r.id(),
            StorageRecord::Unknown(id) => id,
        }
    }

    /// The record kind, `None` for [`StorageRecord::Unknown`]
    pub fn kind(&self) -> Option<StorageIdType> {
        match self {
            StorageRecord::Contact(_) => Some(StorageIdType::Contact),
            StorageRecord::GroupV1(_) => Some(StorageIdType::GroupV1),
            StorageRecord::GroupV2(_) => Some(StorageIdType::GroupV2),
            StorageRecord::Account(_) => Some(StorageIdType::Account),
            StorageRecord::StoryDistributionList(_) => Some(StorageIdType::StoryDistributionList),
            StorageRecord::CallLink(_) => Some(StorageIdType::CallLink),
            StorageRecord::Unknown(_) => None,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            StorageRecord::Contact(_) => "ContactRecord",
            StorageRecord::GroupV1(_) => "GroupV1Record",
            StorageRecord::GroupV2(_) => "GroupV2Record",
            StorageRecord::Account(_) => "AccountRecord",
            StorageRecord::StoryDistributionList(_) => "StoryDistributionListRecord",
            StorageRecord::CallLink(_) => "CallLinkRecord",
            StorageRecord::Unknown(_) => "UnknownRecord",
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, StorageRecord::Unknown(_))
    }

    /// True when the record carries fields this client doesn't recognize
    pub fn has_unknown_fields(&self) -> bool {
        self.unknown_fields().is_some()
    }

    pub fn unknown_fields(&self) -> Option<&[u8]> {
        match self {
            StorageRecord::Contact(r) => r.unknown_fields(),
            StorageRecord::GroupV1(r) => r.unknown_fields(),
            StorageRecord::GroupV2(r) => r.unknown_fields(),
            StorageRecord::Account(r) => r.unknown_fields(),
            StorageRecord::StoryDistributionList(r) => r.unknown_fields(),
            StorageRecord::CallLink(r) => r.unknown_fields(),
            StorageRecord::Unknown(_) => None,
        }
    }

    /// Same record under a freshly generated raw key.
    ///
    /// Used when a changed record is written back: the old key is deleted and
    /// the record is inserted under the new one.
    pub fn rotated(&self) -> SyncResult<StorageRecord> {
        let raw = StorageId::generate_raw_key();
        Ok(match self {
            StorageRecord::Contact(r) => StorageRecord::Contact(r.with_raw_id(raw)),
            StorageRecord::GroupV1(r) => StorageRecord::GroupV1(r.with_raw_id(raw)),
            StorageRecord::GroupV2(r) => StorageRecord::GroupV2(r.with_raw_id(raw)),
            StorageRecord::Account(r) => StorageRecord::Account(r.with_raw_id(raw)),
            StorageRecord::StoryDistributionList(r) => {
                StorageRecord::StoryDistributionList(r.with_raw_id(raw))
            }
            StorageRecord::CallLink(r) => StorageRecord::CallLink(r.with_raw_id(raw)),
            StorageRecord::Unknown(id) => return Err(SyncError::UnknownRecordWrite(id.clone())),
        })
    }

    /// Compare two records field by field, for logs only.
    ///
    /// Records of different kinds yield [`DiffDescription::DifferentVariant`].
    pub fn describe_diff(&self, other: &StorageRecord) -> DiffDescription {
        let fields = match (self, other) {
            (StorageRecord::Contact(a), StorageRecord::Contact(b)) => a.describe_diff(b),
            (StorageRecord::GroupV1(a), StorageRecord::GroupV1(b)) => a.describe_diff(b),
            (StorageRecord::GroupV2(a), StorageRecord::GroupV2(b)) => a.describe_diff(b),
            (StorageRecord::Account(a), StorageRecord::Account(b)) => a.describe_diff(b),
            (StorageRecord::StoryDistributionList(a), StorageRecord::StoryDistributionList(b)) => {
                a.describe_diff(b)
            }
            (StorageRecord::CallLink(a), StorageRecord::CallLink(b)) => a.describe_diff(b),
            (StorageRecord::Unknown(a), StorageRecord::Unknown(b)) => {
                diff::FieldDiff::new().field("id", a, b).finish()
            }
            _ => {
                return DiffDescription::DifferentVariant {
                    ours: self.kind_name(),
                    theirs: other.kind_name(),
                }
            }
        };
        DiffDescription::Fields(fields)
    }
}

impl From<ContactRecord> for StorageRecord {
    fn from(record: ContactRecord) -> Self {
        StorageRecord::Contact(record)
    }
}

impl From<GroupV1Record> for StorageRecord {
    fn from(record: GroupV1Record) -> Self {
        StorageRecord::GroupV1(record)
    }
}

impl From<GroupV2Record> for StorageRecord {
    fn from(record: GroupV2Record) -> Self {
        StorageRecord::GroupV2(record)
    }
}

impl From<AccountRecord> for StorageRecord {
    fn from(record: AccountRecord) -> Self {
        StorageRecord::Account(record)
    }
}

impl From<StoryDistributionListRecord> for StorageRecord {
    fn from(record: StoryDistributionListRecord) -> Self {
        StorageRecord::StoryDistributionList(record)
    }
}

impl From<CallLinkRecord> for StorageRecord {
    fn from(record: CallLinkRecord) -> Self {
        StorageRecord::CallLink(record)
    }
}

/// Result of [`StorageRecord::describe_diff`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffDescription {
    /// Same kind; names of the fields that differ, in declaration order
    Fields(Vec<&'static str>),
    /// The records are different kinds and can't be compared field by field
    DifferentVariant {
        ours: &'static str,
        theirs: &'static str,
    },
}

impl DiffDescription {
    /// True when both records are the same kind and no field differs
    pub fn is_empty(&self) -> bool {
        matches!(self, DiffDescription::Fields(fields) if fields.is_empty())
    }
}

impl fmt::Display for DiffDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiffDescription::Fields(fields) => write!(f, "[{}]", fields.join(", ")),
            DiffDescription::DifferentVariant { ours, theirs } => {
                write!(f, "Different record type: {} vs {}", ours, theirs)
            }
        }
    }
}

/// Non-empty valid UTF-8, absent otherwise
pub(crate) fn non_empty_string(value: &[u8]) -> Option<String> {
    match std::str::from_utf8(value) {
        Ok(text) if !text.is_empty() => Some(text.to_string()),
        _ => None,
    }
}

pub(crate) fn utf8(value: &[u8]) -> Option<&str> {
    std::str::from_utf8(value).ok()
}

pub(crate) fn non_empty_bytes(value: &[u8]) -> Option<Vec<u8>> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_vec())
    }
}
