//! Account service identifiers and phone-number validation
//!
//! Records carry account identifiers as text. They are parsed once, when the
//! record is constructed, and anything malformed becomes `None` instead of
//! failing the whole record.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

const PNI_PREFIX: &str = "PNI:";

/// Account identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Aci(pub Uuid);

/// Phone-number identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pni(pub Uuid);

/// Either kind of service identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServiceId {
    Aci(Aci),
    Pni(Pni),
}

impl Aci {
    /// Parse a bare UUID, `None` if malformed or nil
    pub fn parse_or_none(value: &str) -> Option<Self> {
        parse_uuid(value).map(Aci)
    }

    pub fn to_service_id_string(&self) -> String {
        self.0.to_string()
    }
}

impl Pni {
    /// Parse a bare or `PNI:`-prefixed UUID, `None` if malformed or nil
    pub fn parse_or_none(value: &str) -> Option<Self> {
        parse_uuid(value.strip_prefix(PNI_PREFIX).unwrap_or(value)).map(Pni)
    }

    pub fn to_service_id_string(&self) -> String {
        format!("{}{}", PNI_PREFIX, self.0)
    }
}

impl ServiceId {
    /// A `PNI:`-prefixed UUID is a [`Pni`], a bare UUID is an [`Aci`]
    pub fn parse_or_none(value: &str) -> Option<Self> {
        match value.strip_prefix(PNI_PREFIX) {
            Some(rest) => parse_uuid(rest).map(|u| ServiceId::Pni(Pni(u))),
            None => parse_uuid(value).map(|u| ServiceId::Aci(Aci(u))),
        }
    }

    pub fn to_service_id_string(&self) -> String {
        match self {
            ServiceId::Aci(aci) => aci.to_service_id_string(),
            ServiceId::Pni(pni) => pni.to_service_id_string(),
        }
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_service_id_string())
    }
}

fn parse_uuid(value: &str) -> Option<Uuid> {
    Uuid::parse_str(value).ok().filter(|u| !u.is_nil())
}

/// `+` followed by 1 to 15 digits
pub fn is_valid_e164(value: &str) -> bool {
    match value.strip_prefix('+') {
        Some(digits) => {
            (1..=15).contains(&digits.len()) && digits.bytes().all(|b| b.is_ascii_digit())
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UUID: &str = "5f8a0b3c-6d1e-4f2a-9b7c-0123456789ab";

    #[test]
    fn test_aci_parse() {
        let aci = Aci::parse_or_none(UUID).unwrap();
        assert_eq!(aci.to_service_id_string(), UUID);
        assert!(Aci::parse_or_none("not-a-uuid").is_none());
        assert!(Aci::parse_or_none("").is_none());
        assert!(Aci::parse_or_none("00000000-0000-0000-0000-000000000000").is_none());
    }

    #[test]
    fn test_pni_accepts_prefix() {
        let bare = Pni::parse_or_none(UUID).unwrap();
        let prefixed = Pni::parse_or_none(&format!("PNI:{}", UUID)).unwrap();
        assert_eq!(bare, prefixed);
        assert_eq!(prefixed.to_service_id_string(), format!("PNI:{}", UUID));
    }

    #[test]
    fn test_service_id_dispatch() {
        assert!(matches!(
            ServiceId::parse_or_none(UUID),
            Some(ServiceId::Aci(_))
        ));
        assert!(matches!(
            ServiceId::parse_or_none(&format!("PNI:{}", UUID)),
            Some(ServiceId::Pni(_))
        ));
        assert!(ServiceId::parse_or_none("PNI:garbage").is_none());
    }

    #[test]
    fn test_e164() {
        assert!(is_valid_e164("+15551234567"));
        assert!(is_valid_e164("+1"));
        assert!(!is_valid_e164("15551234567"));
        assert!(!is_valid_e164("+"));
        assert!(!is_valid_e164("+1555123456789012"));
        assert!(!is_valid_e164("+1555-123"));
    }
}
