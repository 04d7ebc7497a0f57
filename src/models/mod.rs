//! Core data models for the portfolio API.
//!
//! Certificates and Drive files drive the certificate pipeline; the GitHub
//! types mirror the subset of the REST payloads the frontend renders. All of
//! them serialize naturally as JSON via `serde`.

pub mod certificate;
pub mod drive_file;
pub mod github;
pub mod profile;
