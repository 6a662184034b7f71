//! Wire protocol subsystem.
//!
//! # Data Flow
//! ```text
//! TCP bytes
//!     → frame.rs (buffer until newline-closed document or half-close)
//!     → request.rs (JSON → typed Request)
//!     → [dispatch]
//!     → response.rs (Response → one JSON line)
//! ```
//!
//! # Design Decisions
//! - One request and one response per connection
//! - Malformed input is answered, never dropped silently
//! - Legacy field names (`funko`, `funkoPops`, `read`) are accepted on input

pub mod error;
pub mod frame;
pub mod request;
pub mod response;

pub use error::ProtocolError;
pub use request::{Command, Request, RequestKind};
pub use response::{Response, ResponseKind};
