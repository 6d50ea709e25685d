//! Story distribution list records
//!
//! A list of recipients a story is sent to (or withheld from, for block
//! lists). The list itself is addressed by a 16-byte UUID.

use tracing::debug;
use uuid::Uuid;

use crate::error::SyncResult;
use crate::proto;
use crate::records::diff::FieldDiff;
use crate::records::{non_empty_string, utf8};
use crate::types::{ServiceId, StorageId};

#[derive(Debug, Clone, PartialEq)]
pub struct StoryDistributionListRecord {
    id: StorageId,
    proto: proto::StoryDistributionListRecord,
    unknown_fields: Option<Vec<u8>>,
    identifier: Option<Uuid>,
    name: Option<String>,
    recipients: Vec<ServiceId>,
}

impl StoryDistributionListRecord {
    pub fn from_proto(
        raw_id: impl Into<Vec<u8>>,
        proto: proto::StoryDistributionListRecord,
        unknown_fields: Option<Vec<u8>>,
    ) -> Self {
        let id = StorageId::for_story_distribution_list(raw_id);
        let identifier = Uuid::from_slice(&proto.identifier).ok();

        let recipients: Vec<ServiceId> = proto
            .recipient_service_ids
            .iter()
            .filter_map(|s| utf8(s).and_then(ServiceId::parse_or_none))
            .collect();
        let dropped = proto.recipient_service_ids.len() - recipients.len();
        if dropped > 0 {
            debug!(%id, dropped, "Dropped unparseable distribution list recipients");
        }

        Self {
            name: non_empty_string(&proto.name),
            id,
            identifier,
            recipients,
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

    pub fn to_builder(&self) -> StoryDistributionListRecordBuilder {
        StoryDistributionListRecordBuilder {
            raw_id: self.id.raw().to_vec(),
            proto: self.proto.clone(),
            unknown_fields: self.unknown_fields.clone(),
        }
    }

    pub fn id(&self) -> &StorageId {
        &self.id
    }

    pub fn proto(&self) -> &proto::StoryDistributionListRecord {
        &self.proto
    }

    pub fn has_unknown_fields(&self) -> bool {
        self.unknown_fields.is_some()
    }

    pub fn unknown_fields(&self) -> Option<&[u8]> {
        self.unknown_fields.as_deref()
    }

    /// List UUID, absent unless the payload holds exactly 16 bytes
    pub fn identifier(&self) -> Option<Uuid> {
        self.identifier
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Recipients whose service ids parsed
    pub fn recipients(&self) -> &[ServiceId] {
        &self.recipients
    }

    /// Zero while the list is live
    pub fn deleted_at(&self) -> u64 {
        self.proto.deleted_at_timestamp
    }

    pub fn is_deleted(&self) -> bool {
        self.proto.deleted_at_timestamp > 0
    }

    pub fn allows_replies(&self) -> bool {
        self.proto.allows_replies
    }

    pub fn is_block_list(&self) -> bool {
        self.proto.is_block_list
    }

    pub fn describe_diff(&self, other: &StoryDistributionListRecord) -> Vec<&'static str> {
        FieldDiff::new()
            .field("id", &self.id, &other.id)
            .field("identifier", &self.identifier, &other.identifier)
            .field("name", &self.name, &other.name)
            .field("recipients", &self.recipients, &other.recipients)
            .field("deleted_at", &self.deleted_at(), &other.deleted_at())
            .field("allows_replies", &self.allows_replies(), &other.allows_replies())
            .field("is_block_list", &self.is_block_list(), &other.is_block_list())
            .field("unknown_fields", &self.unknown_fields, &other.unknown_fields)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct StoryDistributionListRecordBuilder {
    raw_id: Vec<u8>,
    proto: proto::StoryDistributionListRecord,
    unknown_fields: Option<Vec<u8>>,
}

impl StoryDistributionListRecordBuilder {
    pub fn new(raw_id: impl Into<Vec<u8>>) -> Self {
        Self {
            raw_id: raw_id.into(),
            proto: proto::StoryDistributionListRecord::default(),
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

    pub fn with_identifier(mut self, identifier: Uuid) -> Self {
        self.proto.identifier = identifier.as_bytes().to_vec();
        self
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.proto.name = name.as_bytes().to_vec();
        self
    }

    pub fn with_recipients(mut self, recipients: &[ServiceId]) -> Self {
        self.proto.recipient_service_ids = recipients
            .iter()
            .map(|s| s.to_service_id_string().into_bytes())
            .collect();
        self
    }

    pub fn with_deleted_at(mut self, timestamp: u64) -> Self {
        self.proto.deleted_at_timestamp = timestamp;
        self
    }

    pub fn with_allows_replies(mut self, allows: bool) -> Self {
        self.proto.allows_replies = allows;
        self
    }

    pub fn with_block_list(mut self, is_block_list: bool) -> Self {
        self.proto.is_block_list = is_block_list;
        self
    }

    pub fn build(self) -> StoryDistributionListRecord {
        StoryDistributionListRecord::from_proto(self.raw_id, self.proto, self.unknown_fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Aci, Pni};

    const ACI: &str = "5f8a0b3c-6d1e-4f2a-9b7c-0123456789ab";
    const PNI: &str = "PNI:0e1d2c3b-4a59-4687-b6a5-f4e3d2c1b0a9";

    fn recipients() -> Vec<ServiceId> {
        vec![
            ServiceId::Aci(Aci::parse_or_none(ACI).unwrap()),
            ServiceId::Pni(Pni::parse_or_none(PNI).unwrap()),
        ]
    }

    #[test]
    fn test_builder_and_roundtrip() {
        let list_id = Uuid::from_bytes([6u8; 16]);
        let record = StoryDistributionListRecordBuilder::new(vec![1u8; 16])
            .with_identifier(list_id)
            .with_name("Close friends")
            .with_recipients(&recipients())
            .with_allows_replies(true)
            .build();

        assert_eq!(record.identifier(), Some(list_id));
        assert_eq!(record.name(), Some("Close friends"));
        assert_eq!(record.recipients(), recipients().as_slice());
        assert!(record.allows_replies());
        assert!(!record.is_block_list());
        assert!(!record.is_deleted());

        let decoded =
            StoryDistributionListRecord::decode_payload(vec![1u8; 16], &record.encode_payload())
                .unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn test_invalid_recipients_dropped() {
        let proto = proto::StoryDistributionListRecord {
            recipient_service_ids: vec![
                ACI.as_bytes().to_vec(),
                b"not-a-uuid".to_vec(),
                b"00000000-0000-0000-0000-000000000000".to_vec(),
                vec![0xff; 36],
            ],
            ..Default::default()
        };
        let record = StoryDistributionListRecord::from_proto(vec![1u8; 16], proto, None);

        assert_eq!(record.recipients().len(), 1);
        // Raw list untouched
        assert_eq!(record.proto().recipient_service_ids.len(), 4);
    }

    #[test]
    fn test_short_identifier_is_absent() {
        let proto = proto::StoryDistributionListRecord {
            identifier: vec![6u8; 10],
            ..Default::default()
        };
        let record = StoryDistributionListRecord::from_proto(vec![1u8; 16], proto, None);
        assert!(record.identifier().is_none());
    }

    #[test]
    fn test_describe_diff() {
        let a = StoryDistributionListRecordBuilder::new(vec![1u8; 16])
            .with_name("Friends")
            .build();
        let b = a.to_builder().with_deleted_at(1_700_000_000_000).with_name("Old").build();
        assert_eq!(a.describe_diff(&b), vec!["name", "deleted_at"]);
    }
}
