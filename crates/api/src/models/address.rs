//! Saved delivery addresses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use sabzi_core::{AddressId, AddressType, UserId};

/// A saved address.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Address {
    pub id: AddressId,
    #[serde(skip)]
    pub user_id: UserId,
    pub name: String,
    pub street: String,
    pub city: String,
    pub zip_code: String,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub address_type: AddressType,
    /// At most one address per user is the default.
    pub is_default: bool,
    #[serde(skip)]
    pub created_at: DateTime<Utc>,
}

/// Client-supplied address fields for create and update.
#[derive(Debug, Clone, Deserialize)]
pub struct AddressInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub zip_code: String,
    #[serde(rename = "type", default)]
    pub address_type: AddressType,
    #[serde(default)]
    pub is_default: bool,
}

impl AddressInput {
    /// Names of required fields left blank.
    #[must_use]
    pub fn blank_fields(&self) -> Vec<&'static str> {
        [
            ("name", &self.name),
            ("street", &self.street),
            ("city", &self.city),
            ("zip_code", &self.zip_code),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
        .collect()
    }
}

/// A partial update; absent fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddressPatch {
    pub name: Option<String>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub zip_code: Option<String>,
    #[serde(rename = "type")]
    pub address_type: Option<AddressType>,
    pub is_default: Option<bool>,
}

impl AddressPatch {
    /// The full field set after applying this patch to `current`.
    #[must_use]
    pub fn apply(self, current: &Address) -> AddressInput {
        AddressInput {
            name: self.name.unwrap_or_else(|| current.name.clone()),
            street: self.street.unwrap_or_else(|| current.street.clone()),
            city: self.city.unwrap_or_else(|| current.city.clone()),
            zip_code: self.zip_code.unwrap_or_else(|| current.zip_code.clone()),
            address_type: self.address_type.unwrap_or(current.address_type),
            is_default: self.is_default.unwrap_or(current.is_default),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn stored() -> Address {
        Address {
            id: AddressId::new(1),
            user_id: UserId::new(9),
            name: "Home".to_string(),
            street: "12 MG Road".to_string(),
            city: "Pune".to_string(),
            zip_code: "411001".to_string(),
            address_type: AddressType::Home,
            is_default: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_blank_fields_reported_by_name() {
        let input: AddressInput =
            serde_json::from_str(r#"{"name": "Office", "street": "  ", "type": "WORK"}"#).unwrap();
        assert_eq!(input.blank_fields(), vec!["street", "city", "zip_code"]);
        assert_eq!(input.address_type, AddressType::Work);
        assert!(!input.is_default);
    }

    #[test]
    fn test_patch_keeps_unset_fields() {
        let patch: AddressPatch = serde_json::from_str(r#"{"city": "Mumbai"}"#).unwrap();
        let merged = patch.apply(&stored());
        assert_eq!(merged.city, "Mumbai");
        assert_eq!(merged.name, "Home");
        assert_eq!(merged.address_type, AddressType::Home);
        assert!(merged.is_default);
    }
}
