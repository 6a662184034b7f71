//! Inbound request decoding.
//!
//! Wire shape:
//! ```text
//! { "type": "add"|"update"|"remove"|"show"|"list",
//!   "user": "<username>",
//!   "id":   "<id>" | <number>,      (update, remove, show)
//!   "item": { ...Funko fields... }  (add: full, update: partial) }
//! ```
//! `funko` is accepted in place of `item`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::model::{id, Funko, FunkoPatch};
use crate::protocol::error::ProtocolError;

/// The operations a client can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestKind {
    Add,
    Update,
    Remove,
    Show,
    List,
}

impl RequestKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Update => "update",
            Self::Remove => "remove",
            Self::Show => "show",
            Self::List => "list",
        }
    }

    /// Whether this kind changes stored state.
    pub fn is_mutation(&self) -> bool {
        matches!(self, Self::Add | Self::Update | Self::Remove)
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestKind {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "add" => Ok(Self::Add),
            "update" => Ok(Self::Update),
            "remove" => Ok(Self::Remove),
            // older clients call it `read`
            "show" | "read" => Ok(Self::Show),
            "list" => Ok(Self::List),
            other => Err(ProtocolError::InvalidType(other.to_string())),
        }
    }
}

/// What to do, with the arguments each operation needs.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Add(Funko),
    Update { id: String, patch: FunkoPatch },
    Remove { id: String },
    Show { id: String },
    List,
}

/// A fully validated request.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub user: String,
    pub command: Command,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct WireRequest {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user: Option<String>,
    #[serde(
        default,
        deserialize_with = "id::opt_string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    id: Option<String>,
    #[serde(default, alias = "funko", skip_serializing_if = "Option::is_none")]
    item: Option<serde_json::Value>,
}

impl Request {
    pub fn new(user: impl Into<String>, command: Command) -> Self {
        Self {
            user: user.into(),
            command,
        }
    }

    pub fn kind(&self) -> RequestKind {
        match self.command {
            Command::Add(_) => RequestKind::Add,
            Command::Update { .. } => RequestKind::Update,
            Command::Remove { .. } => RequestKind::Remove,
            Command::Show { .. } => RequestKind::Show,
            Command::List => RequestKind::List,
        }
    }

    /// Decode one request from a complete JSON document.
    pub fn parse(bytes: &[u8]) -> Result<Self, ProtocolError> {
        let wire: WireRequest = serde_json::from_slice(bytes).map_err(ProtocolError::InvalidJson)?;

        let kind: RequestKind = wire.kind.as_deref().unwrap_or_default().parse()?;
        let user = wire
            .user
            .filter(|u| !u.is_empty())
            .ok_or(ProtocolError::MissingField { kind, field: "user" })?;

        let require_id = |id: Option<String>| id.ok_or(ProtocolError::MissingField { kind, field: "id" });
        let require_item = |item: Option<serde_json::Value>| {
            item.ok_or(ProtocolError::MissingField { kind, field: "item" })
        };

        let command = match kind {
            RequestKind::Add => {
                let funko = serde_json::from_value(require_item(wire.item)?)
                    .map_err(|source| ProtocolError::InvalidItem { kind, source })?;
                Command::Add(funko)
            }
            RequestKind::Update => {
                let id = require_id(wire.id)?;
                let patch = serde_json::from_value(require_item(wire.item)?)
                    .map_err(|source| ProtocolError::InvalidItem { kind, source })?;
                Command::Update { id, patch }
            }
            RequestKind::Remove => Command::Remove {
                id: require_id(wire.id)?,
            },
            RequestKind::Show => Command::Show {
                id: require_id(wire.id)?,
            },
            RequestKind::List => Command::List,
        };

        Ok(Self { user, command })
    }

    /// Encode for sending. The inverse of [`Request::parse`].
    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        let mut wire = WireRequest {
            kind: Some(self.kind().as_str().to_string()),
            user: Some(self.user.clone()),
            ..Default::default()
        };
        match &self.command {
            Command::Add(funko) => {
                let mut item = serde_json::to_value(funko)?;
                if let Some(fields) = item.as_object_mut() {
                    fields.remove("id");
                }
                wire.item = Some(item);
            }
            Command::Update { id, patch } => {
                wire.id = Some(id.clone());
                wire.item = Some(serde_json::to_value(patch)?);
            }
            Command::Remove { id } | Command::Show { id } => wire.id = Some(id.clone()),
            Command::List => {}
        }
        serde_json::to_vec(&wire)
    }
}
