//! Storage identifiers
//!
//! A [`StorageId`] addresses one record slot in the remote store. It pairs an
//! integer type tag with the opaque raw key the item is stored under. The type
//! tag is open-ended: values outside [`StorageIdType`] are legal and must be
//! carried through untouched so newer clients don't lose their records.

use std::fmt;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// Length of raw keys generated for newly written items.
pub const RAW_STORAGE_ID_LENGTH: usize = 16;

/// Record kinds this client understands.
///
/// Discriminants are the wire values. Tag 6 is not assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum StorageIdType {
    Contact = 1,
    GroupV1 = 2,
    GroupV2 = 3,
    Account = 4,
    StoryDistributionList = 5,
    CallLink = 7,
}

impl StorageIdType {
    /// Every known type, in wire order
    pub const ALL: [StorageIdType; 6] = [
        StorageIdType::Contact,
        StorageIdType::GroupV1,
        StorageIdType::GroupV2,
        StorageIdType::Account,
        StorageIdType::StoryDistributionList,
        StorageIdType::CallLink,
    ];

    /// Map a wire value onto a known type, `None` if this client doesn't know it
    pub fn from_raw(value: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_raw() == value)
    }

    /// The wire value of this type
    pub fn as_raw(self) -> i32 {
        self as i32
    }

    /// Upper-case name used in logs
    pub fn name(self) -> &'static str {
        match self {
            StorageIdType::Contact => "CONTACT",
            StorageIdType::GroupV1 => "GROUPV1",
            StorageIdType::GroupV2 => "GROUPV2",
            StorageIdType::Account => "ACCOUNT",
            StorageIdType::StoryDistributionList => "STORY_DISTRIBUTION_LIST",
            StorageIdType::CallLink => "CALL_LINK",
        }
    }
}

impl fmt::Display for StorageIdType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Identifier of one item in the remote store.
///
/// Equality and hashing cover both the type tag and the raw key. Identifiers
/// are immutable; [`StorageId::with_new_bytes`] returns a fresh value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StorageId {
    id_type: i32,
    raw: Vec<u8>,
}

impl StorageId {
    pub fn for_contact(raw: impl Into<Vec<u8>>) -> Self {
        Self::for_known(raw, StorageIdType::Contact)
    }

    pub fn for_group_v1(raw: impl Into<Vec<u8>>) -> Self {
        Self::for_known(raw, StorageIdType::GroupV1)
    }

    pub fn for_group_v2(raw: impl Into<Vec<u8>>) -> Self {
        Self::for_known(raw, StorageIdType::GroupV2)
    }

    pub fn for_account(raw: impl Into<Vec<u8>>) -> Self {
        Self::for_known(raw, StorageIdType::Account)
    }

    pub fn for_story_distribution_list(raw: impl Into<Vec<u8>>) -> Self {
        Self::for_known(raw, StorageIdType::StoryDistributionList)
    }

    pub fn for_call_link(raw: impl Into<Vec<u8>>) -> Self {
        Self::for_known(raw, StorageIdType::CallLink)
    }

    /// Identifier for a known record kind
    pub fn for_known(raw: impl Into<Vec<u8>>, id_type: StorageIdType) -> Self {
        Self::for_type(raw, id_type.as_raw())
    }

    /// Identifier for an arbitrary, possibly unknown, wire type tag
    pub fn for_type(raw: impl Into<Vec<u8>>, id_type: i32) -> Self {
        Self {
            id_type,
            raw: raw.into(),
        }
    }

    /// Generate a random raw key for a newly written item
    pub fn generate_raw_key() -> Vec<u8> {
        let mut raw = vec![0u8; RAW_STORAGE_ID_LENGTH];
        rand::rng().fill_bytes(&mut raw);
        raw
    }

    /// Copy of this identifier with the same type and a different raw key
    pub fn with_new_bytes(&self, raw: impl Into<Vec<u8>>) -> Self {
        Self::for_type(raw, self.id_type)
    }

    /// Copy of this identifier under a freshly generated raw key.
    ///
    /// Remote items are immutable, so a changed record is uploaded under a new
    /// key and the old key is deleted in the same write.
    pub fn rotate(&self) -> Self {
        self.with_new_bytes(Self::generate_raw_key())
    }

    /// The wire type tag, known or not
    pub fn id_type_raw(&self) -> i32 {
        self.id_type
    }

    /// The type tag as a known kind, `None` when [`is_unknown`](Self::is_unknown)
    pub fn id_type(&self) -> Option<StorageIdType> {
        StorageIdType::from_raw(self.id_type)
    }

    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// True iff the type tag is outside the types this client knows
    pub fn is_unknown(&self) -> bool {
        self.id_type().is_none()
    }
}

impl fmt::Display for StorageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id_type() {
            Some(known) => write!(f, "{}:{}", known, BASE64.encode(&self.raw)),
            None => write!(f, "UNKNOWN({}):{}", self.id_type, BASE64.encode(&self.raw)),
        }
    }
}
