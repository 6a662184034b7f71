//! Outbound response encoding.
//!
//! Wire shape:
//! ```text
//! { "type": <request kind> | "error",
//!   "success": bool,
//!   "message": "...",
//!   "item":  { ...Funko... },    (add, update, show)
//!   "items": [ ...Funko... ] }   (list)
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::Funko;
use crate::protocol::error::ProtocolError;
use crate::protocol::request::RequestKind;

/// Response `type` field: the request kind it answers, or `error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseKind {
    Add,
    Update,
    Remove,
    Show,
    List,
    Error,
}

impl ResponseKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Update => "update",
            Self::Remove => "remove",
            Self::Show => "show",
            Self::List => "list",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for ResponseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<RequestKind> for ResponseKind {
    fn from(kind: RequestKind) -> Self {
        match kind {
            RequestKind::Add => Self::Add,
            RequestKind::Update => Self::Update,
            RequestKind::Remove => Self::Remove,
            RequestKind::Show => Self::Show,
            RequestKind::List => Self::List,
        }
    }
}

/// One response per connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    #[serde(rename = "type")]
    pub kind: ResponseKind,
    pub success: bool,
    pub message: String,
    #[serde(default, alias = "funko", skip_serializing_if = "Option::is_none")]
    pub item: Option<Funko>,
    #[serde(default, alias = "funkoPops", skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<Funko>>,
}

impl Response {
    pub fn ok(kind: RequestKind, message: impl Into<String>) -> Self {
        Self::new(kind.into(), true, message)
    }

    pub fn fail(kind: RequestKind, message: impl Into<String>) -> Self {
        Self::new(kind.into(), false, message)
    }

    /// A `type: "error"` response for requests that could not be understood.
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(ResponseKind::Error, false, message)
    }

    fn new(kind: ResponseKind, success: bool, message: impl Into<String>) -> Self {
        Self {
            kind,
            success,
            message: message.into(),
            item: None,
            items: None,
        }
    }

    pub fn with_item(mut self, funko: Funko) -> Self {
        self.item = Some(funko);
        self
    }

    pub fn with_items(mut self, funkos: Vec<Funko>) -> Self {
        self.items = Some(funkos);
        self
    }

    /// Encode as a single JSON line.
    pub fn to_line(&self) -> Vec<u8> {
        let mut bytes = serde_json::to_vec(self).unwrap_or_else(|e| {
            tracing::error!(error = %e, "Failed to encode response");
            br#"{"type":"error","success":false,"message":"Internal error"}"#.to_vec()
        });
        bytes.push(b'\n');
        bytes
    }
}

impl From<&ProtocolError> for Response {
    fn from(err: &ProtocolError) -> Self {
        Self::error(err.client_message())
    }
}
