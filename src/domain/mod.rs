//! Domain scaffolding: persistent entities, slug identity, shared errors.

pub mod entities;
pub mod error;
pub mod slug;
