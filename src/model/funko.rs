//! The collectible record and its partial-update counterpart.

use serde::{Deserialize, Serialize};

use crate::model::id;

/// Product line of a Funko.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FunkoType {
    #[serde(rename = "Pop!", alias = "pop")]
    Pop,
    #[serde(rename = "Pop! Rides", alias = "pop-rides")]
    PopRides,
    #[serde(rename = "Vynil Soda", alias = "vynil-soda")]
    VynilSoda,
    #[serde(rename = "Vynil Gold", alias = "vynil-gold")]
    VynilGold,
}

/// Genre tag of a Funko.
///
/// The serialized names match files written by earlier builds, including the
/// trailing space some of them stored after `Música`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FunkoGenre {
    #[serde(rename = "Animación, Películas y TV", alias = "animation")]
    Animation,
    #[serde(rename = "Videojuegos", alias = "videogames")]
    Videogames,
    #[serde(rename = "Deportes", alias = "sports")]
    Sports,
    #[serde(rename = "Música", alias = "Música ", alias = "music")]
    Music,
    #[serde(rename = "Ánime", alias = "anime")]
    Anime,
    #[serde(rename = "Otros", alias = "other")]
    Other,
}

/// A single collectible owned by one user's collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Funko {
    /// Assigned by the collection; empty until the item is added.
    #[serde(default, deserialize_with = "id::string_or_number")]
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: FunkoType,
    pub genre: FunkoGenre,
    pub franchise: String,
    /// Number within the franchise line.
    pub number: u32,
    #[serde(default)]
    pub exclusive: bool,
    #[serde(alias = "marketValue")]
    pub market_value: f64,
}

impl Funko {
    /// Numeric value of the id, if it has one.
    pub fn numeric_id(&self) -> Option<u64> {
        self.id.parse().ok()
    }

    /// Check field invariants, logging any violation.
    ///
    /// Violations are flagged rather than rejected so that collections written
    /// by older builds still load.
    pub fn validate(&self) -> bool {
        check_market_value(&self.id, self.market_value)
    }

    /// Set the market value, flagging non-positive amounts.
    pub fn set_market_value(&mut self, value: f64) {
        check_market_value(&self.id, value);
        self.market_value = value;
    }

    /// Apply every field present in `patch`, leaving the rest untouched.
    pub fn apply(&mut self, patch: FunkoPatch) {
        let FunkoPatch {
            name,
            description,
            kind,
            genre,
            franchise,
            number,
            exclusive,
            market_value,
        } = patch;

        if let Some(name) = name {
            self.name = name;
        }
        if let Some(description) = description {
            self.description = description;
        }
        if let Some(kind) = kind {
            self.kind = kind;
        }
        if let Some(genre) = genre {
            self.genre = genre;
        }
        if let Some(franchise) = franchise {
            self.franchise = franchise;
        }
        if let Some(number) = number {
            self.number = number;
        }
        if let Some(exclusive) = exclusive {
            self.exclusive = exclusive;
        }
        if let Some(value) = market_value {
            self.set_market_value(value);
        }
    }
}

fn check_market_value(id: &str, value: f64) -> bool {
    if value > 0.0 {
        return true;
    }
    tracing::warn!(funko_id = %id, market_value = value, "Market value must be a positive number");
    false
}

/// Partial field set for `update` requests. Absent fields are left as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FunkoPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<FunkoType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre: Option<FunkoGenre>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub franchise: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclusive: Option<bool>,
    #[serde(alias = "marketValue", skip_serializing_if = "Option::is_none")]
    pub market_value: Option<f64>,
}

impl FunkoPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
pub(crate) fn sample(name: &str) -> Funko {
    Funko {
        id: String::new(),
        name: name.to_string(),
        description: format!("{name} figure"),
        kind: FunkoType::Pop,
        genre: FunkoGenre::Animation,
        franchise: "Guardians of the Galaxy".to_string(),
        number: 49,
        exclusive: false,
        market_value: 25.0,
    }
}
