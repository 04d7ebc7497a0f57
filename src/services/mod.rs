//! Remote API clients and the pure helpers they rely on.

pub mod cache;
pub mod drive_service;
pub mod github_service;
pub mod matcher;
pub mod mock_data;
pub mod sheet_parser;
