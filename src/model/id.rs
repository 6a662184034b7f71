//! Lenient id deserialization.
//!
//! Clients written against older builds send ids as JSON numbers (`"id": 3`),
//! newer ones as strings (`"id": "3"`). Both decode to the same `String`.

use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum IdRepr {
    Str(String),
    Num(u64),
}

impl From<IdRepr> for String {
    fn from(repr: IdRepr) -> Self {
        match repr {
            IdRepr::Str(s) => s,
            IdRepr::Num(n) => n.to_string(),
        }
    }
}

/// Deserialize a required id from a string or an unsigned integer.
pub fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    IdRepr::deserialize(deserializer).map(String::from)
}

/// Deserialize an optional id from a string, an unsigned integer or `null`.
pub fn opt_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<IdRepr>::deserialize(deserializer)?.map(String::from))
}
