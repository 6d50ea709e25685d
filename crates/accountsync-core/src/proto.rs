//! Wire schema for the storage service
//!
//! Protobuf-compatible messages declared with `prost` derives. Every enum-typed
//! field is stored as a raw `int32` so values this client doesn't know survive
//! a decode/encode cycle unchanged.
//!
//! Text fields are declared as `bytes`. A value that isn't valid UTF-8 then
//! reads as absent in the typed record instead of failing the whole payload,
//! and the original bytes are written back untouched.
//!
//! Nested messages inside records (payments, pinned conversations, nickname)
//! are also carried as `bytes`. The typed records decode them on demand and
//! re-encode them with [`unknown_fields::reencode_nested`], so fields a newer
//! client added inside them survive.
//!
//! ## Layering
//!
//! ```text
//! StorageManifest { version, value: encrypt(ManifestRecord) }
//! StorageItem     { key: raw id, value: encrypt(StorageRecord) }
//! StorageRecord   { oneof record: Contact | GroupV1 | GroupV2 | Account
//!                                 | StoryDistributionList | CallLink }
//! ```
//!
//! `StorageRecord` is never decoded through prost directly: the nested record
//! payload has to be split from its unknown fields first, see
//! [`unknown_fields`].

pub mod unknown_fields;

pub use unknown_fields::{decode_with_unknown, encode_with_unknown, KnownFields};

/// Encrypted manifest as stored remotely
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct StorageManifest {
    #[prost(uint64, tag = "1")]
    pub version: u64,
    #[prost(bytes = "vec", tag = "2")]
    pub value: Vec<u8>,
}

/// One encrypted record as stored remotely
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct StorageItem {
    #[prost(bytes = "vec", tag = "1")]
    pub key: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub value: Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct StorageItems {
    #[prost(message, repeated, tag = "1")]
    pub items: Vec<StorageItem>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ReadOperation {
    #[prost(bytes = "vec", repeated, tag = "1")]
    pub read_key: Vec<Vec<u8>>,
}

/// Body of a manifest write: the new manifest plus item inserts and deletes
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct WriteOperation {
    #[prost(message, optional, tag = "1")]
    pub manifest: Option<StorageManifest>,
    #[prost(message, repeated, tag = "2")]
    pub insert_item: Vec<StorageItem>,
    #[prost(bytes = "vec", repeated, tag = "3")]
    pub delete_key: Vec<Vec<u8>>,
    #[prost(bool, tag = "4")]
    pub clear_all: bool,
}

/// Decrypted manifest contents
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ManifestRecord {
    #[prost(uint64, tag = "1")]
    pub version: u64,
    #[prost(message, repeated, tag = "2")]
    pub identifiers: Vec<manifest_record::Identifier>,
    #[prost(uint32, tag = "3")]
    pub source_device: u32,
}

pub mod manifest_record {
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Identifier {
        #[prost(bytes = "vec", tag = "1")]
        pub raw: Vec<u8>,
        /// Open-ended type tag, see [`crate::types::StorageIdType`]
        #[prost(int32, tag = "2")]
        pub id_type: i32,
    }
}

/// Decrypted item envelope
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct StorageRecord {
    #[prost(oneof = "storage_record::Record", tags = "1, 2, 3, 4, 5, 7")]
    pub record: Option<storage_record::Record>,
}

pub mod storage_record {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Record {
        #[prost(message, tag = "1")]
        Contact(super::ContactRecord),
        #[prost(message, tag = "2")]
        GroupV1(super::GroupV1Record),
        #[prost(message, tag = "3")]
        GroupV2(super::GroupV2Record),
        #[prost(message, tag = "4")]
        Account(super::AccountRecord),
        #[prost(message, tag = "5")]
        StoryDistributionList(super::StoryDistributionListRecord),
        #[prost(message, tag = "7")]
        CallLink(super::CallLinkRecord),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum IdentityState {
    Default = 0,
    Verified = 1,
    Unverified = 2,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ContactRecord {
    #[prost(bytes = "vec", tag = "1")]
    pub aci: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub e164: Vec<u8>,
    #[prost(bytes = "vec", tag = "3")]
    pub profile_key: Vec<u8>,
    #[prost(bytes = "vec", tag = "4")]
    pub identity_key: Vec<u8>,
    #[prost(enumeration = "IdentityState", tag = "5")]
    pub identity_state: i32,
    #[prost(bytes = "vec", tag = "6")]
    pub given_name: Vec<u8>,
    #[prost(bytes = "vec", tag = "7")]
    pub family_name: Vec<u8>,
    #[prost(bytes = "vec", tag = "8")]
    pub username: Vec<u8>,
    #[prost(bool, tag = "9")]
    pub blocked: bool,
    #[prost(bool, tag = "10")]
    pub whitelisted: bool,
    #[prost(bool, tag = "11")]
    pub archived: bool,
    #[prost(bool, tag = "12")]
    pub marked_unread: bool,
    #[prost(uint64, tag = "13")]
    pub muted_until_timestamp: u64,
    #[prost(bool, tag = "14")]
    pub hide_story: bool,
    #[prost(bytes = "vec", tag = "15")]
    pub pni: Vec<u8>,
    #[prost(uint64, tag = "16")]
    pub unregistered_at_timestamp: u64,
    #[prost(bytes = "vec", tag = "17")]
    pub system_given_name: Vec<u8>,
    #[prost(bytes = "vec", tag = "18")]
    pub system_family_name: Vec<u8>,
    #[prost(bytes = "vec", tag = "19")]
    pub system_nickname: Vec<u8>,
    #[prost(bool, tag = "20")]
    pub hidden: bool,
    #[prost(bool, tag = "21")]
    pub pni_signature_verified: bool,
    /// Encoded [`contact_record::Name`]
    #[prost(bytes = "vec", optional, tag = "22")]
    pub nickname: Option<Vec<u8>>,
    #[prost(bytes = "vec", tag = "23")]
    pub note: Vec<u8>,
}

pub mod contact_record {
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Name {
        #[prost(bytes = "vec", tag = "1")]
        pub given: Vec<u8>,
        #[prost(bytes = "vec", tag = "2")]
        pub family: Vec<u8>,
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GroupV1Record {
    #[prost(bytes = "vec", tag = "1")]
    pub id: Vec<u8>,
    #[prost(bool, tag = "2")]
    pub blocked: bool,
    #[prost(bool, tag = "3")]
    pub whitelisted: bool,
    #[prost(bool, tag = "4")]
    pub archived: bool,
    #[prost(bool, tag = "5")]
    pub marked_unread: bool,
    #[prost(uint64, tag = "6")]
    pub muted_until_timestamp: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum StorySendMode {
    Default = 0,
    Disabled = 1,
    Enabled = 2,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GroupV2Record {
    #[prost(bytes = "vec", tag = "1")]
    pub master_key: Vec<u8>,
    #[prost(bool, tag = "2")]
    pub blocked: bool,
    #[prost(bool, tag = "3")]
    pub whitelisted: bool,
    #[prost(bool, tag = "4")]
    pub archived: bool,
    #[prost(bool, tag = "5")]
    pub marked_unread: bool,
    #[prost(uint64, tag = "6")]
    pub muted_until_timestamp: u64,
    #[prost(bool, tag = "7")]
    pub dont_notify_for_mentions_if_muted: bool,
    #[prost(bool, tag = "8")]
    pub hide_story: bool,
    #[prost(enumeration = "StorySendMode", tag = "10")]
    pub story_send_mode: i32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum PhoneNumberSharingMode {
    Unknown = 0,
    Everybody = 1,
    Nobody = 2,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum OptionalBool {
    Unset = 0,
    Enabled = 1,
    Disabled = 2,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AccountRecord {
    #[prost(bytes = "vec", tag = "1")]
    pub profile_key: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub given_name: Vec<u8>,
    #[prost(bytes = "vec", tag = "3")]
    pub family_name: Vec<u8>,
    #[prost(bytes = "vec", tag = "4")]
    pub avatar_url_path: Vec<u8>,
    #[prost(bool, tag = "5")]
    pub note_to_self_archived: bool,
    #[prost(bool, tag = "6")]
    pub read_receipts: bool,
    #[prost(bool, tag = "7")]
    pub sealed_sender_indicators: bool,
    #[prost(bool, tag = "8")]
    pub typing_indicators: bool,
    #[prost(bool, tag = "10")]
    pub note_to_self_marked_unread: bool,
    #[prost(bool, tag = "11")]
    pub link_previews: bool,
    #[prost(enumeration = "PhoneNumberSharingMode", tag = "12")]
    pub phone_number_sharing_mode: i32,
    #[prost(bool, tag = "13")]
    pub unlisted_phone_number: bool,
    /// Encoded [`account_record::PinnedConversation`]s
    #[prost(bytes = "vec", repeated, tag = "14")]
    pub pinned_conversations: Vec<Vec<u8>>,
    #[prost(bool, tag = "15")]
    pub prefer_contact_avatars: bool,
    /// Encoded [`account_record::Payments`]
    #[prost(bytes = "vec", optional, tag = "16")]
    pub payments: Option<Vec<u8>>,
    #[prost(uint32, tag = "17")]
    pub universal_expire_timer: u32,
    #[prost(bytes = "vec", tag = "19")]
    pub e164: Vec<u8>,
    #[prost(bytes = "vec", repeated, tag = "20")]
    pub preferred_reaction_emoji: Vec<Vec<u8>>,
    #[prost(bytes = "vec", tag = "21")]
    pub subscriber_id: Vec<u8>,
    #[prost(bytes = "vec", tag = "22")]
    pub subscriber_currency_code: Vec<u8>,
    #[prost(bool, tag = "23")]
    pub display_badges_on_profile: bool,
    #[prost(bool, tag = "24")]
    pub subscription_manually_cancelled: bool,
    #[prost(bool, tag = "25")]
    pub keep_muted_chats_archived: bool,
    #[prost(bool, tag = "26")]
    pub has_set_my_stories_privacy: bool,
    #[prost(bool, tag = "27")]
    pub has_viewed_onboarding_story: bool,
    #[prost(bool, tag = "29")]
    pub stories_disabled: bool,
    #[prost(enumeration = "OptionalBool", tag = "30")]
    pub story_view_receipts_enabled: i32,
    #[prost(bytes = "vec", tag = "33")]
    pub username: Vec<u8>,
}

pub mod account_record {
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct PinnedConversation {
        #[prost(oneof = "pinned_conversation::Identifier", tags = "1, 3, 4")]
        pub identifier: Option<pinned_conversation::Identifier>,
    }

    pub mod pinned_conversation {
        #[derive(Clone, PartialEq, ::prost::Message)]
        pub struct Contact {
            #[prost(bytes = "vec", tag = "1")]
            pub service_id: Vec<u8>,
            #[prost(bytes = "vec", tag = "2")]
            pub e164: Vec<u8>,
        }

        #[derive(Clone, PartialEq, ::prost::Oneof)]
        pub enum Identifier {
            #[prost(message, tag = "1")]
            Contact(Contact),
            #[prost(bytes, tag = "3")]
            LegacyGroupId(Vec<u8>),
            #[prost(bytes, tag = "4")]
            GroupMasterKey(Vec<u8>),
        }
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Payments {
        #[prost(bool, tag = "1")]
        pub enabled: bool,
        #[prost(bytes = "vec", tag = "2")]
        pub entropy: Vec<u8>,
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct StoryDistributionListRecord {
    #[prost(bytes = "vec", tag = "1")]
    pub identifier: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub name: Vec<u8>,
    #[prost(bytes = "vec", repeated, tag = "3")]
    pub recipient_service_ids: Vec<Vec<u8>>,
    #[prost(uint64, tag = "4")]
    pub deleted_at_timestamp: u64,
    #[prost(bool, tag = "5")]
    pub allows_replies: bool,
    #[prost(bool, tag = "6")]
    pub is_block_list: bool,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CallLinkRecord {
    #[prost(bytes = "vec", tag = "1")]
    pub root_key: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub admin_passkey: Vec<u8>,
    #[prost(uint64, tag = "3")]
    pub deleted_at_timestamp_ms: u64,
}

impl KnownFields for ContactRecord {
    const KNOWN_TAGS: &'static [u32] = &[
        1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23,
    ];
}

impl KnownFields for GroupV1Record {
    const KNOWN_TAGS: &'static [u32] = &[1, 2, 3, 4, 5, 6];
}

impl KnownFields for GroupV2Record {
    const KNOWN_TAGS: &'static [u32] = &[1, 2, 3, 4, 5, 6, 7, 8, 10];
}

impl KnownFields for AccountRecord {
    const KNOWN_TAGS: &'static [u32] = &[
        1, 2, 3, 4, 5, 6, 7, 8, 10, 11, 12, 13, 14, 15, 16, 17, 19, 20, 21, 22, 23, 24, 25, 26,
        27, 29, 30, 33,
    ];
}

impl KnownFields for StoryDistributionListRecord {
    const KNOWN_TAGS: &'static [u32] = &[1, 2, 3, 4, 5, 6];
}

impl KnownFields for CallLinkRecord {
    const KNOWN_TAGS: &'static [u32] = &[1, 2, 3];
}

impl KnownFields for contact_record::Name {
    const KNOWN_TAGS: &'static [u32] = &[1, 2];
}

impl KnownFields for account_record::PinnedConversation {
    const KNOWN_TAGS: &'static [u32] = &[1, 3, 4];
}

impl KnownFields for account_record::Payments {
    const KNOWN_TAGS: &'static [u32] = &[1, 2];
}
