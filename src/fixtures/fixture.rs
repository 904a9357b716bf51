//! Fixture payloads
//!
//! Values stored in the cache. The serialized form carries a `kind`
//! discriminator so disk records decode back into the right variant.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// == User ==
/// Registration data for a generated user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserData {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub day: u8,
    pub month: u8,
    pub year: u16,
}

// == Product ==
/// A generated catalogue product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductData {
    pub name: String,
    /// Price formatted with two decimals, e.g. `"42.50"`
    pub price: String,
    pub description: String,
    pub category: String,
}

// == Address ==
/// A generated postal address with phone number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressData {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
    pub phone: String,
}

// == Fixture ==
/// A cached test fixture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum Fixture {
    User(UserData),
    Product(ProductData),
    Address(AddressData),
    SearchTerm(String),
    /// Free-form string mapping for scenario-specific data
    Record(BTreeMap<String, String>),
}

impl Fixture {
    /// Discriminator used in the serialized form.
    pub fn kind(&self) -> &'static str {
        match self {
            Fixture::User(_) => "user",
            Fixture::Product(_) => "product",
            Fixture::Address(_) => "address",
            Fixture::SearchTerm(_) => "search_term",
            Fixture::Record(_) => "record",
        }
    }

    pub fn into_user(self) -> Option<UserData> {
        match self {
            Fixture::User(user) => Some(user),
            _ => None,
        }
    }

    pub fn into_product(self) -> Option<ProductData> {
        match self {
            Fixture::Product(product) => Some(product),
            _ => None,
        }
    }

    pub fn into_address(self) -> Option<AddressData> {
        match self {
            Fixture::Address(address) => Some(address),
            _ => None,
        }
    }

    pub fn into_search_term(self) -> Option<String> {
        match self {
            Fixture::SearchTerm(term) => Some(term),
            _ => None,
        }
    }

    /// Flattens the fixture into a string map keyed by field name.
    ///
    /// Search terms map to a single `searchTerm` field.
    pub fn to_record(&self) -> BTreeMap<String, String> {
        match self {
            Fixture::Record(map) => map.clone(),
            Fixture::SearchTerm(term) => BTreeMap::from([("searchTerm".to_string(), term.clone())]),
            other => {
                let data = match serde_json::to_value(other) {
                    Ok(serde_json::Value::Object(mut outer)) => outer.remove("data"),
                    _ => None,
                };
                match data {
                    Some(serde_json::Value::Object(fields)) => fields
                        .into_iter()
                        .map(|(name, value)| {
                            let text = match value {
                                serde_json::Value::String(s) => s,
                                v => v.to_string(),
                            };
                            (name, text)
                        })
                        .collect(),
                    _ => BTreeMap::new(),
                }
            }
        }
    }
}

impl From<UserData> for Fixture {
    fn from(user: UserData) -> Self {
        Fixture::User(user)
    }
}

impl From<ProductData> for Fixture {
    fn from(product: ProductData) -> Self {
        Fixture::Product(product)
    }
}

impl From<AddressData> for Fixture {
    fn from(address: AddressData) -> Self {
        Fixture::Address(address)
    }
}

impl From<BTreeMap<String, String>> for Fixture {
    fn from(map: BTreeMap<String, String>) -> Self {
        Fixture::Record(map)
    }
}

impl From<String> for Fixture {
    fn from(term: String) -> Self {
        Fixture::SearchTerm(term)
    }
}

impl From<&str> for Fixture {
    fn from(term: &str) -> Self {
        Fixture::SearchTerm(term.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> UserData {
        UserData {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada.lovelace1815@example.com".to_string(),
            password: "Xy7!abcdEFGH".to_string(),
            confirm_password: "Xy7!abcdEFGH".to_string(),
            day: 10,
            month: 12,
            year: 1985,
        }
    }

    #[test]
    fn test_tagged_serialization() {
        let json = serde_json::to_value(Fixture::from(sample_user())).unwrap();
        assert_eq!(json["kind"], "user");
        assert_eq!(json["data"]["firstName"], "Ada");
        assert_eq!(json["data"]["confirmPassword"], "Xy7!abcdEFGH");

        let term = serde_json::to_value(Fixture::from("laptop")).unwrap();
        assert_eq!(term, serde_json::json!({"kind": "search_term", "data": "laptop"}));
    }

    #[test]
    fn test_decode_rejects_unknown_kind() {
        let result = serde_json::from_str::<Fixture>(r#"{"kind":"invoice","data":{}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_decode_rejects_mismatched_payload() {
        // A product payload tagged as a user must not decode
        let json = r#"{"kind":"user","data":{"name":"Lamp","price":"1.00","description":"d","category":"Home"}}"#;
        assert!(serde_json::from_str::<Fixture>(json).is_err());
    }

    #[test]
    fn test_accessors() {
        let fixture = Fixture::from(sample_user());
        assert_eq!(fixture.kind(), "user");
        assert!(fixture.clone().into_product().is_none());
        assert_eq!(fixture.into_user(), Some(sample_user()));
        assert_eq!(
            Fixture::from("shoes").into_search_term(),
            Some("shoes".to_string())
        );
    }

    #[test]
    fn test_to_record_flattens_fields() {
        let record = Fixture::from(sample_user()).to_record();
        assert_eq!(record.get("email").map(String::as_str), Some("ada.lovelace1815@example.com"));
        assert_eq!(record.get("day").map(String::as_str), Some("10"));
        assert_eq!(record.get("year").map(String::as_str), Some("1985"));

        let term = Fixture::from("watch").to_record();
        assert_eq!(term.get("searchTerm").map(String::as_str), Some("watch"));
    }
}
