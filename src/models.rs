//! Data models for the Bitwarden session and vault items.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use zeroize::Zeroize;

/// Session token returned by `bw unlock --raw`.
///
/// Lives only in memory and is wiped on drop.
#[derive(Clone, PartialEq, Eq, Zeroize)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Drop for SessionToken {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(<redacted>)")
    }
}

/// A JSON member that can be missing, explicitly `null`, or carry a value.
///
/// `bw` emits `null` for many unset members and omits others entirely; both
/// forms have to survive a decode/encode cycle. Use with
/// `#[serde(default, skip_serializing_if = "Field::is_absent")]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field<T> {
    Absent,
    Null,
    Value(T),
}

impl<T> Default for Field<T> {
    fn default() -> Self {
        Field::Absent
    }
}

impl<T> Field<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Field::Absent)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Field::Null)
    }

    /// The value, treating null and absent alike.
    pub fn value(&self) -> Option<&T> {
        match self {
            Field::Value(value) => Some(value),
            Field::Absent | Field::Null => None,
        }
    }
}

impl Field<String> {
    pub fn as_deref(&self) -> Option<&str> {
        self.value().map(String::as_str)
    }
}

impl<T: Serialize> Serialize for Field<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Field::Value(value) => value.serialize(serializer),
            // Absent members are skipped by the container attribute
            Field::Absent | Field::Null => serializer.serialize_none(),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Field<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Option::<T>::deserialize(deserializer)?.map_or(Field::Null, Field::Value))
    }
}

/// A single record as emitted by `bw list items`.
///
/// Fields are passed through untouched: members the CLI leaves out stay out
/// when re-encoded, `null` members stay `null`, and fields this struct does
/// not name are kept in `extra`. Only `id`, `object` and `name` are required.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VaultItem {
    pub id: String,
    pub object: String,
    pub name: String,
    /// Item kind: 1 login, 2 secure note, 3 card, 4 identity.
    #[serde(rename = "type", default, skip_serializing_if = "Field::is_absent")]
    pub item_type: Field<u8>,
    #[serde(default, skip_serializing_if = "Field::is_absent")]
    pub reprompt: Field<u8>,
    #[serde(default, skip_serializing_if = "Field::is_absent")]
    pub favorite: Field<bool>,
    #[serde(default, skip_serializing_if = "Field::is_absent")]
    pub notes: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_absent")]
    pub folder_id: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_absent")]
    pub organization_id: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_absent")]
    pub deleted_date: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_absent")]
    pub creation_date: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_absent")]
    pub revision_date: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_absent")]
    pub collection_ids: Field<Vec<String>>,
    #[serde(default, skip_serializing_if = "Field::is_absent")]
    pub password_history: Field<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Field::is_absent")]
    pub login: Field<VaultItemLogin>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl VaultItem {
    /// Username of the login sub-record, if any.
    pub fn username(&self) -> Option<&str> {
        self.login.value()?.username.as_deref()
    }

    pub fn is_favorite(&self) -> bool {
        self.favorite.value().copied().unwrap_or(false)
    }
}

/// Login sub-record of a [`VaultItem`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VaultItemLogin {
    #[serde(default, skip_serializing_if = "Field::is_absent")]
    pub username: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_absent")]
    pub password: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_absent")]
    pub totp: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_absent")]
    pub password_revision_date: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_absent")]
    pub uris: Field<Vec<LoginUri>>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl VaultItemLogin {
    /// URI entries, empty when the member is null or missing.
    pub fn uris(&self) -> &[LoginUri] {
        self.uris.value().map(Vec::as_slice).unwrap_or(&[])
    }
}

/// One URI entry of a login.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoginUri {
    #[serde(rename = "match", default, skip_serializing_if = "Field::is_absent")]
    pub match_type: Field<u8>,
    #[serde(default, skip_serializing_if = "Field::is_absent")]
    pub uri: Field<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Decode the stdout of `bw list items`, preserving order.
pub fn parse_items(json: &str) -> serde_json::Result<Vec<VaultItem>> {
    serde_json::from_str(json)
}
