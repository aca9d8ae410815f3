//! Ranking and engagement core for a blog publishing platform.
//!
//! The crate answers two ranked read queries, most-viewed blogs and top
//! influencers by aggregate views, from a TTL cache with per-key single
//! flight, and performs the engagement writes that feed them: idempotent
//! like toggles, view increments, and slug-identified blog publication.
//!
//! Layers follow the usual split: [`domain`] holds entities and the slug
//! identity, [`application`] the services and repository traits, [`cache`]
//! the ranked-query cache, [`infra`] the Postgres and in-memory store
//! strategies plus telemetry, and [`config`] file-and-environment settings.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
