//! yadisk-core - Client library for the Yandex Disk REST API
//!
//! All calls go through one authenticated transport ([`DiskClient::dispatch`]).
//! Uploads and downloads use the API's two-phase flow: ask for a transfer
//! link, then move the bytes against it.

pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod resources;
pub mod transfer;

// Re-export commonly used types
pub use client::{authorization_url, ApiRequest, DiskClient, QueryParams};
pub use config::{
    config_exists, get_config_path, load_config, load_config_or_default, save_config,
    validate_config,
};
pub use config::{ApiConfig, ClientConfig, ConfigFile, LoggingConfig, OutputConfig, API_BASE_URL};
pub use error::{ApiError, Error, Result};
pub use models::{
    CommentIds, DiskInfo, Embedded, FilesList, JsonMap, Link, Operation, OperationState, Owner,
    Resource, UploadResult, User,
};
