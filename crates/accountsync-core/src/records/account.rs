//! Account record
//!
//! Exactly one per account. Holds profile basics, privacy and UI settings,
//! pinned conversations, payments state and the donation subscriber.
//!
//! ## Validation rules
//!
//! - **Payments**: entropy must be exactly [`PAYMENTS_ENTROPY_LENGTH`] bytes.
//!   Anything else drops the entropy and forces payments off.
//! - **Subscriber**: needs both a currency code and a
//!   [`SUBSCRIBER_ID_LENGTH`]-byte id. With only one of them, both read as
//!   absent.
//! - **E164**: malformed numbers read as absent.
//! - **Text**: anything that isn't valid UTF-8 reads as absent.
//!
//! The raw payload is never rewritten by validation, so the original bytes go
//! back out unchanged unless a builder sets the field. Payments and pinned
//! conversations are nested messages; their own unknown fields are kept too.

use prost::Message;
use tracing::debug;

use crate::error::SyncResult;
use crate::proto::{
    self,
    account_record::{self, pinned_conversation},
    unknown_fields::reencode_nested,
    OptionalBool, PhoneNumberSharingMode,
};
use crate::records::diff::FieldDiff;
use crate::records::{non_empty_bytes, non_empty_string, utf8};
use crate::types::{is_valid_e164, ServiceId, StorageId};

pub const PAYMENTS_ENTROPY_LENGTH: usize = 32;

pub const SUBSCRIBER_ID_LENGTH: usize = 32;

/// Payments state. Enabled only when valid entropy is present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Payments {
    enabled: bool,
    entropy: Option<Vec<u8>>,
}

impl Payments {
    pub fn new(enabled: bool, entropy: Option<&[u8]>) -> Self {
        let entropy = entropy
            .filter(|e| e.len() == PAYMENTS_ENTROPY_LENGTH)
            .map(<[u8]>::to_vec);
        Self {
            enabled: enabled && entropy.is_some(),
            entropy,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn entropy(&self) -> Option<&[u8]> {
        self.entropy.as_deref()
    }
}

/// Donation subscriber. Both parts present or neither.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Subscriber {
    currency_code: Option<String>,
    id: Option<Vec<u8>>,
}

impl Subscriber {
    pub fn new(currency_code: Option<&str>, id: Option<&[u8]>) -> Self {
        match (
            currency_code.filter(|c| !c.is_empty()),
            id.filter(|i| i.len() == SUBSCRIBER_ID_LENGTH),
        ) {
            (Some(code), Some(id)) => Self {
                currency_code: Some(code.to_string()),
                id: Some(id.to_vec()),
            },
            _ => Self::default(),
        }
    }

    pub fn currency_code(&self) -> Option<&str> {
        self.currency_code.as_deref()
    }

    pub fn subscriber_id(&self) -> Option<&[u8]> {
        self.id.as_deref()
    }

    pub fn is_present(&self) -> bool {
        self.id.is_some()
    }
}

/// A conversation pinned to the top of the chat list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PinnedConversation {
    Contact {
        service_id: Option<ServiceId>,
        e164: Option<String>,
    },
    LegacyGroup(Vec<u8>),
    /// V2 group, by master key
    Group(Vec<u8>),
    /// Entry with no identifier this client understands, as its encoded bytes
    Unknown(Vec<u8>),
}

impl PinnedConversation {
    fn decode(encoded: &[u8]) -> Self {
        let identifier = account_record::PinnedConversation::decode(encoded)
            .ok()
            .and_then(|pinned| pinned.identifier);
        match identifier {
            Some(pinned_conversation::Identifier::Contact(contact)) => {
                PinnedConversation::Contact {
                    service_id: utf8(&contact.service_id).and_then(ServiceId::parse_or_none),
                    e164: utf8(&contact.e164)
                        .filter(|e| is_valid_e164(e))
                        .map(str::to_string),
                }
            }
            Some(pinned_conversation::Identifier::LegacyGroupId(id)) => {
                PinnedConversation::LegacyGroup(id)
            }
            Some(pinned_conversation::Identifier::GroupMasterKey(key)) => {
                PinnedConversation::Group(key)
            }
            None => PinnedConversation::Unknown(encoded.to_vec()),
        }
    }

    /// Fresh encoding. An E164 that isn't valid is left out.
    fn encode(&self) -> Vec<u8> {
        let identifier = match self {
            PinnedConversation::Contact { service_id, e164 } => {
                pinned_conversation::Identifier::Contact(pinned_conversation::Contact {
                    service_id: service_id
                        .map(|s| s.to_service_id_string().into_bytes())
                        .unwrap_or_default(),
                    e164: e164
                        .as_deref()
                        .filter(|e| is_valid_e164(e))
                        .map(|e| e.as_bytes().to_vec())
                        .unwrap_or_default(),
                })
            }
            PinnedConversation::LegacyGroup(id) => {
                pinned_conversation::Identifier::LegacyGroupId(id.clone())
            }
            PinnedConversation::Group(key) => {
                pinned_conversation::Identifier::GroupMasterKey(key.clone())
            }
            PinnedConversation::Unknown(encoded) => return encoded.clone(),
        };
        account_record::PinnedConversation {
            identifier: Some(identifier),
        }
        .encode_to_vec()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AccountRecord {
    id: StorageId,
    proto: proto::AccountRecord,
    unknown_fields: Option<Vec<u8>>,
    profile_key: Option<Vec<u8>>,
    given_name: Option<String>,
    family_name: Option<String>,
    avatar_url_path: Option<String>,
    pinned_conversations: Vec<PinnedConversation>,
    payments: Payments,
    e164: Option<String>,
    preferred_reaction_emoji: Vec<String>,
    subscriber: Subscriber,
    username: Option<String>,
}

impl AccountRecord {
    pub fn from_proto(
        raw_id: impl Into<Vec<u8>>,
        proto: proto::AccountRecord,
        unknown_fields: Option<Vec<u8>>,
    ) -> Self {
        let id = StorageId::for_account(raw_id);

        let raw_payments = proto.payments.as_deref().and_then(|bytes| {
            account_record::Payments::decode(bytes)
                .map_err(|err| debug!(%id, %err, "Payments are malformed, treating as disabled"))
                .ok()
        });
        let payments = match &raw_payments {
            Some(p) => Payments::new(p.enabled, Some(p.entropy.as_slice())),
            None => Payments::default(),
        };
        if let Some(p) = &raw_payments {
            if p.enabled && !payments.is_enabled() {
                debug!(%id, len = p.entropy.len(), "Payments entropy invalid, forcing payments off");
            }
        }

        let subscriber = Subscriber::new(
            utf8(&proto.subscriber_currency_code),
            Some(proto.subscriber_id.as_slice()),
        );
        if !subscriber.is_present()
            && (!proto.subscriber_currency_code.is_empty() || !proto.subscriber_id.is_empty())
        {
            debug!(%id, "Partial subscriber data, treating as absent");
        }

        let e164 = utf8(&proto.e164)
            .filter(|e| is_valid_e164(e))
            .map(str::to_string);
        let preferred_reaction_emoji = proto
            .preferred_reaction_emoji
            .iter()
            .filter_map(|emoji| utf8(emoji).map(str::to_string))
            .collect();

        Self {
            profile_key: non_empty_bytes(&proto.profile_key),
            given_name: non_empty_string(&proto.given_name),
            family_name: non_empty_string(&proto.family_name),
            avatar_url_path: non_empty_string(&proto.avatar_url_path),
            pinned_conversations: proto
                .pinned_conversations
                .iter()
                .map(|encoded| PinnedConversation::decode(encoded))
                .collect(),
            payments,
            e164,
            preferred_reaction_emoji,
            subscriber,
            username: non_empty_string(&proto.username),
            id,
            proto,
            unknown_fields,
        }
    }

    pub fn decode_payload(raw_id: impl Into<Vec<u8>>, payload: &[u8]) -> SyncResult<Self> {
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

    pub fn to_builder(&self) -> AccountRecordBuilder {
        AccountRecordBuilder {
            raw_id: self.id.raw().to_vec(),
            proto: self.proto.clone(),
            unknown_fields: self.unknown_fields.clone(),
        }
    }

    pub fn id(&self) -> &StorageId {
        &self.id
    }

    pub fn proto(&self) -> &proto::AccountRecord {
        &self.proto
    }

    pub fn has_unknown_fields(&self) -> bool {
        self.unknown_fields.is_some()
    }

    pub fn unknown_fields(&self) -> Option<&[u8]> {
        self.unknown_fields.as_deref()
    }

    pub fn profile_key(&self) -> Option<&[u8]> {
        self.profile_key.as_deref()
    }

    pub fn given_name(&self) -> Option<&str> {
        self.given_name.as_deref()
    }

    pub fn family_name(&self) -> Option<&str> {
        self.family_name.as_deref()
    }

    pub fn avatar_url_path(&self) -> Option<&str> {
        self.avatar_url_path.as_deref()
    }

    pub fn is_note_to_self_archived(&self) -> bool {
        self.proto.note_to_self_archived
    }

    pub fn is_note_to_self_forced_unread(&self) -> bool {
        self.proto.note_to_self_marked_unread
    }

    pub fn is_read_receipts_enabled(&self) -> bool {
        self.proto.read_receipts
    }

    pub fn is_sealed_sender_indicators_enabled(&self) -> bool {
        self.proto.sealed_sender_indicators
    }

    pub fn is_typing_indicators_enabled(&self) -> bool {
        self.proto.typing_indicators
    }

    pub fn is_link_previews_enabled(&self) -> bool {
        self.proto.link_previews
    }

    /// Unrecognized modes read as [`PhoneNumberSharingMode::Unknown`]
    pub fn phone_number_sharing_mode(&self) -> PhoneNumberSharingMode {
        self.proto.phone_number_sharing_mode()
    }

    pub fn is_phone_number_unlisted(&self) -> bool {
        self.proto.unlisted_phone_number
    }

    pub fn pinned_conversations(&self) -> &[PinnedConversation] {
        &self.pinned_conversations
    }

    pub fn is_prefer_contact_avatars(&self) -> bool {
        self.proto.prefer_contact_avatars
    }

    pub fn payments(&self) -> &Payments {
        &self.payments
    }

    pub fn universal_expire_timer(&self) -> u32 {
        self.proto.universal_expire_timer
    }

    pub fn e164(&self) -> Option<&str> {
        self.e164.as_deref()
    }

    /// Entries that aren't valid UTF-8 are skipped
    pub fn preferred_reaction_emoji(&self) -> &[String] {
        &self.preferred_reaction_emoji
    }

    pub fn subscriber(&self) -> &Subscriber {
        &self.subscriber
    }

    pub fn is_display_badges_on_profile(&self) -> bool {
        self.proto.display_badges_on_profile
    }

    pub fn is_subscription_manually_cancelled(&self) -> bool {
        self.proto.subscription_manually_cancelled
    }

    pub fn is_keep_muted_chats_archived(&self) -> bool {
        self.proto.keep_muted_chats_archived
    }

    pub fn has_set_my_stories_privacy(&self) -> bool {
        self.proto.has_set_my_stories_privacy
    }

    pub fn has_viewed_onboarding_story(&self) -> bool {
        self.proto.has_viewed_onboarding_story
    }

    pub fn is_stories_disabled(&self) -> bool {
        self.proto.stories_disabled
    }

    pub fn story_view_receipts_state(&self) -> OptionalBool {
        self.proto.story_view_receipts_enabled()
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn describe_diff(&self, other: &AccountRecord) -> Vec<&'static str> {
        FieldDiff::new()
            .field("id", &self.id, &other.id)
            .field("profile_key", &self.profile_key, &other.profile_key)
            .field("given_name", &self.given_name, &other.given_name)
            .field("family_name", &self.family_name, &other.family_name)
            .field("avatar_url_path", &self.avatar_url_path, &other.avatar_url_path)
            .field(
                "note_to_self_archived",
                &self.is_note_to_self_archived(),
                &other.is_note_to_self_archived(),
            )
            .field(
                "note_to_self_forced_unread",
                &self.is_note_to_self_forced_unread(),
                &other.is_note_to_self_forced_unread(),
            )
            .field(
                "read_receipts",
                &self.is_read_receipts_enabled(),
                &other.is_read_receipts_enabled(),
            )
            .field(
                "sealed_sender_indicators",
                &self.is_sealed_sender_indicators_enabled(),
                &other.is_sealed_sender_indicators_enabled(),
            )
            .field(
                "typing_indicators",
                &self.is_typing_indicators_enabled(),
                &other.is_typing_indicators_enabled(),
            )
            .field(
                "link_previews",
                &self.is_link_previews_enabled(),
                &other.is_link_previews_enabled(),
            )
            .field(
                "phone_number_sharing_mode",
                &self.phone_number_sharing_mode(),
                &other.phone_number_sharing_mode(),
            )
            .field(
                "unlisted_phone_number",
                &self.is_phone_number_unlisted(),
                &other.is_phone_number_unlisted(),
            )
            .field(
                "pinned_conversations",
                &self.pinned_conversations,
                &other.pinned_conversations,
            )
            .field(
                "prefer_contact_avatars",
                &self.is_prefer_contact_avatars(),
                &other.is_prefer_contact_avatars(),
            )
            .field("payments", &self.payments, &other.payments)
            .field(
                "universal_expire_timer",
                &self.universal_expire_timer(),
                &other.universal_expire_timer(),
            )
            .field("e164", &self.e164, &other.e164)
            .field(
                "preferred_reaction_emoji",
                self.preferred_reaction_emoji(),
                other.preferred_reaction_emoji(),
            )
            .field("subscriber", &self.subscriber, &other.subscriber)
            .field(
                "display_badges_on_profile",
                &self.is_display_badges_on_profile(),
                &other.is_display_badges_on_profile(),
            )
            .field(
                "subscription_manually_cancelled",
                &self.is_subscription_manually_cancelled(),
                &other.is_subscription_manually_cancelled(),
            )
            .field(
                "keep_muted_chats_archived",
                &self.is_keep_muted_chats_archived(),
                &other.is_keep_muted_chats_archived(),
            )
            .field(
                "has_set_my_stories_privacy",
                &self.has_set_my_stories_privacy(),
                &other.has_set_my_stories_privacy(),
            )
            .field(
                "has_viewed_onboarding_story",
                &self.has_viewed_onboarding_story(),
                &other.has_viewed_onboarding_story(),
            )
            .field(
                "stories_disabled",
                &self.is_stories_disabled(),
                &other.is_stories_disabled(),
            )
            .field(
                "story_view_receipts_state",
                &self.story_view_receipts_state(),
                &other.story_view_receipts_state(),
            )
            .field("username", &self.username, &other.username)
            .field("unknown_fields", &self.unknown_fields, &other.unknown_fields)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct AccountRecordBuilder {
    raw_id: Vec<u8>,
    proto: proto::AccountRecord,
    unknown_fields: Option<Vec<u8>>,
}

impl AccountRecordBuilder {
    pub fn new(raw_id: impl Into<Vec<u8>>) -> Self {
        Self {
            raw_id: raw_id.into(),
            proto: proto::AccountRecord::default(),
            unknown_fields: None,
        }
    }

    pub fn from_unknown_fields(
        raw_id: impl Into<Vec<u8>>,
        unknown_fields: &[u8],
    ) -> SyncResult<Self> {
        let (proto, unknown_fields) = proto::decode_with_unknown(unknown_fields)?;
        Ok(Self {
            raw_id: raw_id.into(),
            proto,
            unknown_fields,
        })
    }

    pub fn with_profile_key(mut self, profile_key: Option<&[u8]>) -> Self {
        self.proto.profile_key = profile_key.unwrap_or_default().to_vec();
        self
    }

    pub fn with_given_name(mut self, name: &str) -> Self {
        self.proto.given_name = name.as_bytes().to_vec();
        self
    }

    pub fn with_family_name(mut self, name: &str) -> Self {
        self.proto.family_name = name.as_bytes().to_vec();
        self
    }

    pub fn with_avatar_url_path(mut self, path: &str) -> Self {
        self.proto.avatar_url_path = path.as_bytes().to_vec();
        self
    }

    pub fn with_note_to_self_archived(mut self, archived: bool) -> Self {
        self.proto.note_to_self_archived = archived;
        self
    }

    pub fn with_note_to_self_forced_unread(mut self, unread: bool) -> Self {
        self.proto.note_to_self_marked_unread = unread;
        self
    }

    pub fn with_read_receipts(mut self, enabled: bool) -> Self {
        self.proto.read_receipts = enabled;
        self
    }

    pub fn with_sealed_sender_indicators(mut self, enabled: bool) -> Self {
        self.proto.sealed_sender_indicators = enabled;
        self
    }

    pub fn with_typing_indicators(mut self, enabled: bool) -> Self {
        self.proto.typing_indicators = enabled;
        self
    }

    pub fn with_link_previews(mut self, enabled: bool) -> Self {
        self.proto.link_previews = enabled;
        self
    }

    pub fn with_phone_number_sharing_mode(mut self, mode: PhoneNumberSharingMode) -> Self {
        self.proto.set_phone_number_sharing_mode(mode);
        self
    }

    pub fn with_unlisted_phone_number(mut self, unlisted: bool) -> Self {
        self.proto.unlisted_phone_number = unlisted;
        self
    }

    /// Entries equal to one already pinned keep their original encoding,
    /// unknown fields included. New contact entries drop an E164 that isn't
    /// valid.
    pub fn with_pinned_conversations(mut self, pinned: &[PinnedConversation]) -> Self {
        let previous: Vec<(PinnedConversation, Vec<u8>)> =
            std::mem::take(&mut self.proto.pinned_conversations)
                .into_iter()
                .map(|encoded| (PinnedConversation::decode(&encoded), encoded))
                .collect();
        self.proto.pinned_conversations = pinned
            .iter()
            .map(|entry| {
                previous
                    .iter()
                    .find(|(existing, _)| existing == entry)
                    .map(|(_, encoded)| encoded.clone())
                    .unwrap_or_else(|| entry.encode())
            })
            .collect();
        self
    }

    pub fn with_prefer_contact_avatars(mut self, prefer: bool) -> Self {
        self.proto.prefer_contact_avatars = prefer;
        self
    }

    /// Invalid entropy is dropped and payments written as disabled. Fields of
    /// the previous payments message this client doesn't know are kept.
    pub fn with_payments(mut self, enabled: bool, entropy: Option<&[u8]>) -> Self {
        let payments = Payments::new(enabled, entropy);
        let message = account_record::Payments {
            enabled: payments.is_enabled(),
            entropy: payments.entropy().unwrap_or_default().to_vec(),
        };
        self.proto.payments = Some(reencode_nested(&message, self.proto.payments.as_deref()));
        self
    }

    pub fn with_universal_expire_timer(mut self, seconds: u32) -> Self {
        self.proto.universal_expire_timer = seconds;
        self
    }

    pub fn with_e164(mut self, e164: Option<&str>) -> Self {
        self.proto.e164 = e164.unwrap_or_default().as_bytes().to_vec();
        self
    }

    pub fn with_preferred_reaction_emoji(mut self, emoji: Vec<String>) -> Self {
        self.proto.preferred_reaction_emoji = emoji.into_iter().map(String::into_bytes).collect();
        self
    }

    /// Writes both subscriber fields, or clears both
    pub fn with_subscriber(mut self, subscriber: &Subscriber) -> Self {
        self.proto.subscriber_currency_code =
            subscriber.currency_code().unwrap_or_default().as_bytes().to_vec();
        self.proto.subscriber_id = subscriber.subscriber_id().unwrap_or_default().to_vec();
        self
    }

    pub fn with_display_badges_on_profile(mut self, display: bool) -> Self {
        self.proto.display_badges_on_profile = display;
        self
    }

    pub fn with_subscription_manually_cancelled(mut self, cancelled: bool) -> Self {
        self.proto.subscription_manually_cancelled = cancelled;
        self
    }

    pub fn with_keep_muted_chats_archived(mut self, keep: bool) -> Self {
        self.proto.keep_muted_chats_archived = keep;
        self
    }

    pub fn with_has_set_my_stories_privacy(mut self, set: bool) -> Self {
        self.proto.has_set_my_stories_privacy = set;
        self
    }

    pub fn with_has_viewed_onboarding_story(mut self, viewed: bool) -> Self {
        self.proto.has_viewed_onboarding_story = viewed;
        self
    }

    pub fn with_stories_disabled(mut self, disabled: bool) -> Self {
        self.proto.stories_disabled = disabled;
        self
    }

    pub fn with_story_view_receipts_state(mut self, state: OptionalBool) -> Self {
        self.proto.set_story_view_receipts_enabled(state);
        self
    }

    pub fn with_username(mut self, username: Option<&str>) -> Self {
        self.proto.username = username.unwrap_or_default().as_bytes().to_vec();
        self
    }

    pub fn build(self) -> AccountRecord {
        AccountRecord::from_proto(self.raw_id, self.proto, self.unknown_fields)
    }
}
