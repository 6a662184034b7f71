//! Collection data model.
//!
//! # Types
//! - `Funko`: one collectible record, owned by exactly one user's collection
//! - `FunkoPatch`: partial field set applied by `update` requests
//! - `FunkoType` / `FunkoGenre`: closed category sets
//!
//! Ids are strings on the wire and on disk, but are allocated numerically
//! by the store. Incoming ids may be sent as JSON numbers or strings.

pub mod funko;
pub mod id;

pub use funko::{Funko, FunkoGenre, FunkoPatch, FunkoType};
