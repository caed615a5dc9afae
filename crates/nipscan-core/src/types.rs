//! Shared types used across nipscan.
//!
//! This module defines the identifier newtype and the confirmed-result record
//! persisted to the journal.

use crate::checksum;
use crate::error::NipscanError;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Newtype for a 10-digit tax identifier whose checksum is consistent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Nip(String);

impl Nip {
    /// Parse an externally supplied identifier.
    ///
    /// Separators are stripped, so `526-000-12-46` parses to `5260001246`.
    ///
    /// # Errors
    /// Returns a validation error if the input is not ten digits with a valid
    /// control digit.
    pub fn parse(input: &str) -> Result<Self, NipscanError> {
        let digits = checksum::digits_of(input).ok_or_else(|| {
            NipscanError::Validation(format!(
                "invalid NIP '{input}': expected exactly 10 digits"
            ))
        })?;

        let normalized: String = digits.iter().map(|d| char::from(b'0' + d)).collect();
        if !checksum::is_valid(&normalized) {
            return Err(NipscanError::Validation(format!(
                "invalid NIP '{input}': checksum mismatch"
            )));
        }

        Ok(Self(normalized))
    }

    /// Wrap a string produced by the generator, which is valid by construction.
    pub(crate) fn from_generated(digits: String) -> Self {
        debug_assert!(checksum::is_valid(&digits));
        Self(digits)
    }

    /// Get the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Nip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for Nip {
    type Error = NipscanError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Nip> for String {
    fn from(nip: Nip) -> Self {
        nip.0
    }
}

/// A candidate the registry confirmed as a registered entity.
///
/// Serialized field names match the journal format (`nip`, `nazwa`,
/// `statusVat`, `regon`, `adres`, `konta`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmedResult {
    /// Identifier as reported by the registry
    pub nip: String,
    /// Registered name
    #[serde(rename = "nazwa", default, deserialize_with = "null_as_default")]
    pub name: String,
    /// VAT status code (e.g. `Czynny`)
    #[serde(rename = "statusVat", default, deserialize_with = "null_as_default")]
    pub vat_status: String,
    /// National business-registry number, if any
    #[serde(default)]
    pub regon: Option<String>,
    /// Registered working address (may be empty)
    #[serde(rename = "adres", default, deserialize_with = "null_as_default")]
    pub address: String,
    /// Associated bank account numbers, in registry order
    #[serde(rename = "konta", default, deserialize_with = "null_as_default")]
    pub accounts: Vec<String>,
}

/// Journals written by earlier tools carry `null` where the registry had no
/// value; read those as empty.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nip_parse_valid() {
        let nip = Nip::parse("5260001246").expect("valid NIP");
        assert_eq!(nip.as_str(), "5260001246");
        assert_eq!(nip.to_string(), "5260001246");
    }

    #[test]
    fn test_nip_parse_strips_separators() {
        let nip = Nip::parse("526-000-12-46").expect("valid NIP");
        assert_eq!(nip.as_str(), "5260001246");
    }

    #[test]
    fn test_nip_parse_invalid() {
        assert!(Nip::parse("5260001245").is_err());
        assert!(Nip::parse("1234567890").is_err());
        assert!(Nip::parse("123").is_err());

        let err = Nip::parse("5260001245").unwrap_err();
        assert!(matches!(err, NipscanError::Validation(_)));
        assert!(err.to_string().contains("checksum"));
    }

    #[test]
    fn test_nip_serde_roundtrip_rejects_invalid() {
        let json = serde_json::to_string(&Nip::parse("5260001246").unwrap()).unwrap();
        assert_eq!(json, "\"5260001246\"");
        assert!(serde_json::from_str::<Nip>("\"5260001245\"").is_err());
    }

    #[test]
    fn test_confirmed_result_journal_field_names() {
        let result = ConfirmedResult {
            nip: "5260001246".to_string(),
            name: "ACME SP. Z O.O.".to_string(),
            vat_status: "Czynny".to_string(),
            regon: None,
            address: "UL. PROSTA 1, 00-001 WARSZAWA".to_string(),
            accounts: vec!["12345678901234567890123456".to_string()],
        };

        let value = serde_json::to_value(&result).expect("serialize result");
        let obj = value.as_object().expect("object");
        for key in ["nip", "nazwa", "statusVat", "regon", "adres", "konta"] {
            assert!(obj.contains_key(key), "missing {key}");
        }
        assert!(obj["regon"].is_null());
    }

    #[test]
    fn test_confirmed_result_defaults_optional_fields() {
        let json = r#"{"nip":"5260001246","nazwa":"ACME","statusVat":"Czynny"}"#;
        let result: ConfirmedResult = serde_json::from_str(json).expect("parse result");
        assert_eq!(result.regon, None);
        assert!(result.address.is_empty());
        assert!(result.accounts.is_empty());
    }

    #[test]
    fn test_confirmed_result_accepts_null_fields() {
        let json = r#"{
            "nip": "5260001246",
            "nazwa": null,
            "statusVat": null,
            "regon": null,
            "adres": null,
            "konta": null
        }"#;
        let result: ConfirmedResult = serde_json::from_str(json).expect("parse result");
        assert_eq!(result.nip, "5260001246");
        assert!(result.name.is_empty());
        assert!(result.vat_status.is_empty());
        assert!(result.address.is_empty());
        assert!(result.accounts.is_empty());

        let json = r#"{"nip":"5260001246","nazwa":"ACME","adres":null}"#;
        let result: ConfirmedResult = serde_json::from_str(json).expect("parse result");
        assert_eq!(result.name, "ACME");
        assert!(result.vat_status.is_empty());
    }
}
