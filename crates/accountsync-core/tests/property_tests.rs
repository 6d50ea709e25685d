//! Property-based tests for records, manifest and translation
//!
//! Uses proptest to check the round-trip and forward-compatibility invariants
//! over arbitrary inputs.

use accountsync_core::proto::unknown_fields::{encode_len_field, put_varint, split_unknown_fields};
use accountsync_core::proto::{
    KnownFields, OptionalBool, PhoneNumberSharingMode, StorySendMode,
};
use accountsync_core::records::{PinnedConversation, Subscriber, SUBSCRIBER_ID_LENGTH};
use accountsync_core::{
    local_to_remote_record, proto, remote_to_local_record, AccountRecordBuilder, Aci,
    CallLinkRecordBuilder, ContactRecordBuilder, GroupV1RecordBuilder, GroupV2RecordBuilder,
    Manifest, Pni, ServiceId, StorageCipher, StorageId, StorageIdType, StorageKey, StorageRecord,
    StoryDistributionListRecordBuilder,
};
use proptest::prelude::*;
use uuid::Uuid;

// ============================================================================
// Strategy Generators
// ============================================================================

fn raw_key_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 16)
}

fn storage_id_strategy() -> impl Strategy<Value = StorageId> {
    (raw_key_strategy(), prop_oneof![3 => 1..=7i32, 1 => any::<i32>()])
        .prop_map(|(raw, id_type)| StorageId::for_type(raw, id_type))
}

fn e164_strategy() -> impl Strategy<Value = Option<String>> {
    prop::option::of(prop::string::string_regex(r"\+[1-9][0-9]{6,14}").expect("valid regex"))
}

fn name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z ]{0,30}").expect("valid regex")
}

/// Field numbers no record kind declares
fn unknown_field_number_strategy() -> impl Strategy<Value = u32> {
    100u32..10_000
}

fn field_key(number: u32, wire_type: u8) -> Vec<u8> {
    let mut out = Vec::new();
    put_varint(&mut out, (u64::from(number) << 3) | u64::from(wire_type));
    out
}

/// One unknown field of any wire type, groups included
fn unknown_field_strategy() -> impl Strategy<Value = Vec<u8>> {
    let number = unknown_field_number_strategy;
    prop_oneof![
        (number(), any::<u64>()).prop_map(|(n, value)| {
            let mut out = field_key(n, 0);
            put_varint(&mut out, value);
            out
        }),
        (number(), any::<u64>()).prop_map(|(n, value)| {
            let mut out = field_key(n, 1);
            out.extend_from_slice(&value.to_le_bytes());
            out
        }),
        (number(), prop::collection::vec(any::<u8>(), 0..64))
            .prop_map(|(n, payload)| encode_len_field(n, &payload)),
        (number(), any::<u32>()).prop_map(|(n, value)| {
            let mut out = field_key(n, 5);
            out.extend_from_slice(&value.to_le_bytes());
            out
        }),
        (number(), any::<u64>()).prop_map(|(n, value)| {
            let mut out = field_key(n, 3);
            out.extend(field_key(1, 0));
            put_varint(&mut out, value);
            out.extend(field_key(n, 4));
            out
        }),
    ]
}

fn unknown_blob_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(unknown_field_strategy(), 1..6).prop_map(|fields| fields.concat())
}

fn service_id_strategy() -> impl Strategy<Value = ServiceId> {
    (any::<[u8; 16]>(), any::<bool>())
        .prop_filter("nil uuid", |(bytes, _)| *bytes != [0u8; 16])
        .prop_map(|(bytes, pni)| {
            let uuid = Uuid::from_bytes(bytes);
            if pni {
                ServiceId::Pni(Pni(uuid))
            } else {
                ServiceId::Aci(Aci(uuid))
            }
        })
}

fn timestamp_strategy() -> impl Strategy<Value = u64> {
    prop_oneof![Just(0u64), 1_600_000_000_000u64..1_900_000_000_000]
}

#[derive(Debug, Clone)]
struct ContactFields {
    e164: Option<String>,
    given_name: String,
    family_name: String,
    blocked: bool,
    archived: bool,
    hidden: bool,
    muted_until: u64,
    profile_key: Option<Vec<u8>>,
}

fn contact_fields_strategy() -> impl Strategy<Value = ContactFields> {
    (
        e164_strategy(),
        name_strategy(),
        name_strategy(),
        any::<(bool, bool, bool)>(),
        any::<u64>(),
        prop::option::of(prop::collection::vec(any::<u8>(), 32)),
    )
        .prop_map(
            |(e164, given_name, family_name, (blocked, archived, hidden), muted_until, profile_key)| {
                ContactFields {
                    e164,
                    given_name,
                    family_name,
                    blocked,
                    archived,
                    hidden,
                    muted_until,
                    profile_key,
                }
            },
        )
}

fn contact_record_strategy() -> impl Strategy<Value = StorageRecord> {
    (raw_key_strategy(), contact_fields_strategy())
        .prop_map(|(raw, fields)| build_contact(raw, &fields).build().into())
}

fn group_v1_record_strategy() -> impl Strategy<Value = StorageRecord> {
    (
        raw_key_strategy(),
        prop::collection::vec(any::<u8>(), 16),
        any::<(bool, bool, bool, bool)>(),
        timestamp_strategy(),
    )
        .prop_map(|(raw, group_id, (blocked, sharing, archived, unread), muted)| {
            GroupV1RecordBuilder::new(raw, &group_id)
                .with_blocked(blocked)
                .with_profile_sharing(sharing)
                .with_archived(archived)
                .with_forced_unread(unread)
                .with_muted_until(muted)
                .build()
                .into()
        })
}

fn story_send_mode_strategy() -> impl Strategy<Value = StorySendMode> {
    prop_oneof![
        Just(StorySendMode::Default),
        Just(StorySendMode::Disabled),
        Just(StorySendMode::Enabled),
    ]
}

fn group_v2_record_strategy() -> impl Strategy<Value = StorageRecord> {
    (
        raw_key_strategy(),
        any::<[u8; 32]>(),
        any::<(bool, bool, bool, bool, bool, bool)>(),
        timestamp_strategy(),
        story_send_mode_strategy(),
    )
        .prop_map(
            |(raw, master_key, (blocked, sharing, archived, unread, notify, hide), muted, mode)| {
                GroupV2RecordBuilder::new(raw, master_key)
                    .with_blocked(blocked)
                    .with_profile_sharing(sharing)
                    .with_archived(archived)
                    .with_forced_unread(unread)
                    .with_muted_until(muted)
                    .with_notify_for_mentions_when_muted(notify)
                    .with_hide_story(hide)
                    .with_story_send_mode(mode)
                    .build()
                    .into()
            },
        )
}

fn pinned_conversation_strategy() -> impl Strategy<Value = PinnedConversation> {
    prop_oneof![
        (prop::option::of(service_id_strategy()), e164_strategy())
            .prop_map(|(service_id, e164)| PinnedConversation::Contact { service_id, e164 }),
        prop::collection::vec(any::<u8>(), 16).prop_map(PinnedConversation::LegacyGroup),
        prop::collection::vec(any::<u8>(), 32).prop_map(PinnedConversation::Group),
    ]
}

fn subscriber_strategy() -> impl Strategy<Value = Subscriber> {
    prop::option::of((
        "[A-Z]{3}",
        prop::collection::vec(any::<u8>(), SUBSCRIBER_ID_LENGTH),
    ))
    .prop_map(|parts| match parts {
        Some((code, id)) => Subscriber::new(Some(code.as_str()), Some(id.as_slice())),
        None => Subscriber::default(),
    })
}

fn account_record_strategy() -> impl Strategy<Value = StorageRecord> {
    let profile = (
        raw_key_strategy(),
        prop::option::of(prop::collection::vec(any::<u8>(), 32)),
        name_strategy(),
        name_strategy(),
        e164_strategy(),
        prop::option::of("[a-z]{3,12}\\.[0-9]{2}"),
    );
    let settings = (
        any::<(bool, bool, bool, bool, bool, bool)>(),
        prop_oneof![
            Just(PhoneNumberSharingMode::Unknown),
            Just(PhoneNumberSharingMode::Everybody),
            Just(PhoneNumberSharingMode::Nobody),
        ],
        prop_oneof![
            Just(OptionalBool::Unset),
            Just(OptionalBool::Enabled),
            Just(OptionalBool::Disabled),
        ],
        any::<u32>(),
    );
    let extras = (
        prop::collection::vec(pinned_conversation_strategy(), 0..4),
        (
            any::<bool>(),
            prop::option::of(prop::collection::vec(any::<u8>(), 30..34)),
        ),
        subscriber_strategy(),
        prop::collection::vec(any::<String>(), 0..4),
    );

    (profile, settings, extras).prop_map(
        |(
            (raw, profile_key, given, family, e164, username),
            ((receipts, typing, previews, unlisted, stories_off, badges), sharing, story_receipts, timer),
            (pinned, (payments_on, entropy), subscriber, emoji),
        )| {
            AccountRecordBuilder::new(raw)
                .with_profile_key(profile_key.as_deref())
                .with_given_name(&given)
                .with_family_name(&family)
                .with_e164(e164.as_deref())
                .with_username(username.as_deref())
                .with_read_receipts(receipts)
                .with_typing_indicators(typing)
                .with_link_previews(previews)
                .with_unlisted_phone_number(unlisted)
                .with_stories_disabled(stories_off)
                .with_display_badges_on_profile(badges)
                .with_phone_number_sharing_mode(sharing)
                .with_story_view_receipts_state(story_receipts)
                .with_universal_expire_timer(timer)
                .with_pinned_conversations(&pinned)
                .with_payments(payments_on, entropy.as_deref())
                .with_subscriber(&subscriber)
                .with_preferred_reaction_emoji(emoji)
                .build()
                .into()
        },
    )
}

fn story_distribution_list_record_strategy() -> impl Strategy<Value = StorageRecord> {
    (
        raw_key_strategy(),
        any::<[u8; 16]>(),
        name_strategy(),
        prop::collection::vec(service_id_strategy(), 0..5),
        timestamp_strategy(),
        any::<(bool, bool)>(),
    )
        .prop_map(|(raw, list_id, name, recipients, deleted_at, (replies, block_list))| {
            StoryDistributionListRecordBuilder::new(raw)
                .with_identifier(Uuid::from_bytes(list_id))
                .with_name(&name)
                .with_recipients(&recipients)
                .with_deleted_at(deleted_at)
                .with_allows_replies(replies)
                .with_block_list(block_list)
                .build()
                .into()
        })
}

fn call_link_record_strategy() -> impl Strategy<Value = StorageRecord> {
    (
        raw_key_strategy(),
        prop::collection::vec(any::<u8>(), 16..=32),
        prop::option::of(prop::collection::vec(any::<u8>(), 1..32)),
        timestamp_strategy(),
    )
        .prop_map(|(raw, root_key, passkey, deleted_at)| {
            CallLinkRecordBuilder::new(raw)
                .with_root_key(&root_key)
                .with_admin_passkey(passkey.as_deref())
                .with_deleted_at(deleted_at)
                .build()
                .into()
        })
}

/// Any known record kind with arbitrary valid fields
fn record_strategy() -> impl Strategy<Value = StorageRecord> {
    prop_oneof![
        contact_record_strategy(),
        group_v1_record_strategy(),
        group_v2_record_strategy(),
        account_record_strategy(),
        story_distribution_list_record_strategy(),
        call_link_record_strategy(),
    ]
}

fn encrypt_item(keys: &StorageKey, raw: &[u8], plaintext: &[u8]) -> proto::StorageItem {
    proto::StorageItem {
        key: raw.to_vec(),
        value: keys.encrypt(&keys.item_key(raw), plaintext).unwrap(),
    }
}

fn build_contact(raw: Vec<u8>, fields: &ContactFields) -> ContactRecordBuilder {
    ContactRecordBuilder::new(raw)
        .with_e164(fields.e164.as_deref())
        .with_given_name(&fields.given_name)
        .with_family_name(&fields.family_name)
        .with_blocked(fields.blocked)
        .with_archived(fields.archived)
        .with_hidden(fields.hidden)
        .with_muted_until(fields.muted_until)
        .with_profile_key(fields.profile_key.as_deref())
}

// ============================================================================
// Identifier Properties
// ============================================================================

proptest! {
    /// is_unknown holds exactly for tags outside the declared kinds
    #[test]
    fn unknown_iff_outside_enumeration(raw in raw_key_strategy(), id_type in any::<i32>()) {
        let id = StorageId::for_type(raw, id_type);
        prop_assert_eq!(id.is_unknown(), StorageIdType::from_raw(id_type).is_none());
        prop_assert_eq!(id.id_type_raw(), id_type);
    }

    /// with_new_bytes keeps the type and never touches the original
    #[test]
    fn with_new_bytes_keeps_type(id in storage_id_strategy(), raw in raw_key_strategy()) {
        let before = id.clone();
        let moved = id.with_new_bytes(raw.clone());
        prop_assert_eq!(moved.id_type_raw(), id.id_type_raw());
        prop_assert_eq!(moved.raw(), raw.as_slice());
        prop_assert_eq!(id, before);
    }
}

// ============================================================================
// Manifest Properties
// ============================================================================

proptest! {
    /// Every type tag survives serialize/deserialize unchanged
    #[test]
    fn manifest_roundtrip(
        version in any::<u64>(),
        device in any::<u32>(),
        ids in prop::collection::vec(storage_id_strategy(), 0..40),
    ) {
        let manifest = Manifest::new(version, device, ids.clone());
        let decoded = Manifest::deserialize(&manifest.serialize()).unwrap();

        prop_assert_eq!(decoded.storage_ids(), ids.as_slice());
        prop_assert_eq!(decoded.version(), version);
        prop_assert_eq!(decoded.source_device_id(), device);
    }

    /// The per-type index is a regrouping of the id list
    #[test]
    fn manifest_index_consistent(ids in prop::collection::vec(storage_id_strategy(), 0..40)) {
        let manifest = Manifest::new(1, 1, ids.clone());
        for id_type in StorageIdType::ALL {
            let expected: Vec<StorageId> = ids
                .iter()
                .filter(|id| id.id_type() == Some(id_type))
                .cloned()
                .collect();
            prop_assert_eq!(manifest.storage_ids_by_type(id_type), expected.as_slice());
        }
        prop_assert_eq!(manifest.has_unknown_ids(), ids.iter().any(StorageId::is_unknown));
    }

    /// Serialization is deterministic
    #[test]
    fn manifest_serialize_deterministic(ids in prop::collection::vec(storage_id_strategy(), 0..20)) {
        let a = Manifest::new(9, 2, ids.clone());
        let b = Manifest::new(9, 2, ids);
        prop_assert_eq!(a.serialize(), b.serialize());
    }
}

// ============================================================================
// Record Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Local -> remote -> local reproduces the record
    #[test]
    fn contact_translation_roundtrip(raw in raw_key_strategy(), fields in contact_fields_strategy()) {
        let keys = StorageKey::new([3u8; 32]);
        let record: StorageRecord = build_contact(raw, &fields).build().into();

        let item = local_to_remote_record(&record, &keys).unwrap();
        let resolved = remote_to_local_record(&item, StorageIdType::Contact.as_raw(), &keys).unwrap();

        prop_assert!(record.describe_diff(&resolved).is_empty());
        prop_assert_eq!(resolved, record);
    }

    /// Unknown bytes come back unchanged after rebuild and re-encode
    #[test]
    fn unknown_fields_preserved(fields in contact_fields_strategy(), blob in unknown_blob_strategy()) {
        let record = ContactRecordBuilder::from_unknown_fields(vec![1u8; 16], &blob)
            .unwrap()
            .build();
        prop_assert_eq!(record.unknown_fields(), Some(blob.as_slice()));

        let seeded = record.to_builder().with_blocked(fields.blocked).build();
        let decoded = accountsync_core::ContactRecord::decode_payload(
            vec![1u8; 16],
            &seeded.encode_payload(),
        )
        .unwrap();
        prop_assert_eq!(decoded.unknown_fields(), Some(blob.as_slice()));
        prop_assert_eq!(decoded.is_blocked(), fields.blocked);
    }

    /// Toggling one flag shows up as exactly that flag
    #[test]
    fn single_flag_diff(fields in contact_fields_strategy()) {
        let a = build_contact(vec![1u8; 16], &fields).build();
        let b = a.to_builder().with_archived(!fields.archived).build();

        prop_assert!(a.describe_diff(&a).is_empty());
        prop_assert_eq!(a.describe_diff(&b), vec!["archived"]);
    }

    /// Subscriber is present only with both parts valid
    #[test]
    fn subscriber_all_or_nothing(
        currency in prop::option::of("[A-Z]{0,3}"),
        id in prop::option::of(prop::collection::vec(any::<u8>(), 0..40)),
    ) {
        let subscriber = Subscriber::new(currency.as_deref(), id.as_deref());
        let valid = currency.as_deref().is_some_and(|c| !c.is_empty())
            && id.as_ref().is_some_and(|i| i.len() == SUBSCRIBER_ID_LENGTH);

        prop_assert_eq!(subscriber.currency_code().is_some(), valid);
        prop_assert_eq!(subscriber.subscriber_id().is_some(), valid);
    }
}

// ============================================================================
// All Record Kinds
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// Every known kind survives local -> remote -> local
    #[test]
    fn all_kinds_translation_roundtrip(record in record_strategy()) {
        let keys = StorageKey::new([5u8; 32]);
        let item = local_to_remote_record(&record, &keys).unwrap();
        let resolved = remote_to_local_record(&item, record.id().id_type_raw(), &keys).unwrap();

        prop_assert!(record.describe_diff(&resolved).is_empty());
        prop_assert_eq!(resolved, record);
    }

    /// Unknown fields of every wire type come back byte for byte, for every kind
    #[test]
    fn all_kinds_unknown_fields_byte_exact(
        record in record_strategy(),
        blob in unknown_blob_strategy(),
    ) {
        let keys = StorageKey::new([5u8; 32]);
        let id = record.id().clone();

        // What a newer client would have written: known fields, then its own
        let written = local_to_remote_record(&record, &keys).unwrap();
        let plaintext = keys.decrypt(&keys.item_key(id.raw()), &written.value).unwrap();
        let payload = split_known_payload(&plaintext);
        let mut extended = payload.to_vec();
        extended.extend_from_slice(&blob);
        let envelope = encode_len_field(id.id_type_raw() as u32, &extended);

        let item = encrypt_item(&keys, id.raw(), &envelope);
        let resolved = remote_to_local_record(&item, id.id_type_raw(), &keys).unwrap();
        prop_assert_eq!(resolved.unknown_fields(), Some(blob.as_slice()));

        let rewritten = local_to_remote_record(&resolved, &keys).unwrap();
        let replayed = keys.decrypt(&keys.item_key(id.raw()), &rewritten.value).unwrap();
        prop_assert_eq!(replayed, envelope);
    }
}

/// The record payload inside a single-field envelope
fn split_known_payload(envelope: &[u8]) -> &[u8] {
    let field = accountsync_core::proto::unknown_fields::FieldIter::new(envelope)
        .next()
        .expect("envelope has one field")
        .expect("envelope is well formed");
    field.payload
}

// ============================================================================
// Wire Robustness
// ============================================================================

proptest! {
    /// Arbitrary bytes never panic the field scanner
    #[test]
    fn split_unknown_fields_never_panics(data in prop::collection::vec(any::<u8>(), 0..256)) {
        let _ = split_unknown_fields(&data, proto::ContactRecord::KNOWN_TAGS);
    }

    /// Manifest decode rejects or accepts, never panics
    #[test]
    fn manifest_deserialize_never_panics(data in prop::collection::vec(any::<u8>(), 0..256)) {
        let _ = Manifest::deserialize(&data);
    }

    /// Arbitrary decrypted plaintext resolves or errors, never panics
    #[test]
    fn remote_to_local_record_never_panics(
        raw in raw_key_strategy(),
        expected_type in -1i32..10,
        plaintext in prop::collection::vec(any::<u8>(), 0..256),
    ) {
        let keys = StorageKey::new([6u8; 32]);
        let item = encrypt_item(&keys, &raw, &plaintext);
        if let Ok(record) = remote_to_local_record(&item, expected_type, &keys) {
            prop_assert_eq!(record.id().raw(), raw.as_slice());
        }
    }

    /// Arbitrary bytes inside a known kind's envelope never panic either
    #[test]
    fn known_kind_payload_never_panics(
        kind in prop::sample::select(StorageIdType::ALL.to_vec()),
        payload in prop::collection::vec(any::<u8>(), 0..256),
    ) {
        let keys = StorageKey::new([6u8; 32]);
        let envelope = encode_len_field(kind.as_raw() as u32, &payload);
        let item = encrypt_item(&keys, &[1u8; 16], &envelope);
        let _ = remote_to_local_record(&item, kind.as_raw(), &keys);
    }
}
