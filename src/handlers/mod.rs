//! HTTP handlers, grouped by the upstream service they front.

pub mod certificate_handlers;
pub mod github_handlers;
pub mod health_handlers;
pub mod profile_handlers;
