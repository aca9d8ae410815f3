//! Application services layer scaffolding.

pub mod blogs;
pub mod comments;
pub mod engagement;
pub mod error;
pub mod influencers;
pub mod rankings;
pub mod repos;
