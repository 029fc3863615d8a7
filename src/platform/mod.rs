//! Client for the hosted backend-as-a-service platform: auth, object storage
//! and the `files` / `folders` tables, all over its REST API.

pub mod auth;
pub mod client;
pub mod storage;
pub mod tables;

pub use auth::PlatformAuth;
pub use client::PlatformClient;
pub use storage::PlatformStorage;
pub use tables::PlatformTables;
