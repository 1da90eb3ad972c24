//! Response structures returned by the Disk API

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Open JSON object used for custom properties and public settings
pub type JsonMap = Map<String, Value>;

/// Disk capacity and owner information
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiskInfo {
    pub total_space: i64,
    pub used_space: i64,
    pub trash_size: i64,
    pub unlimited_autoupload_enabled: bool,
    pub max_file_size: i64,
    pub paid_max_file_size: i64,
    pub is_paid: bool,
    pub system_folders: HashMap<String, String>,
    pub user: User,
    pub revision: i64,
}

impl DiskInfo {
    /// Unused bytes. Negative when the disk is over quota.
    pub fn free_space(&self) -> i64 {
        self.total_space.wrapping_sub(self.used_space)
    }

    /// Share of the quota in use, in percent. Zero for a zero-sized disk.
    pub fn usage_percentage(&self) -> f64 {
        if self.total_space == 0 {
            return 0.0;
        }
        self.used_space as f64 / self.total_space as f64 * 100.0
    }
}

/// Disk owner
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    pub country: String,
    pub login: String,
    pub display_name: String,
    pub uid: String,
}

/// File or directory metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Resource {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    pub size: i64,
    pub created: String,
    pub modified: String,
    pub mime_type: String,
    pub media_type: String,
    pub preview: String,
    pub file: String,
    pub md5: String,
    pub sha256: String,
    pub public_url: String,
    pub public_key: String,
    pub resource_id: String,
    pub custom_properties: JsonMap,
    pub comment_ids: CommentIds,
    pub owner: Owner,
    #[serde(rename = "_embedded", skip_serializing_if = "Option::is_none")]
    pub embedded: Option<Embedded>,
    pub revision: i64,
}

impl Resource {
    pub fn is_dir(&self) -> bool {
        self.resource_type == "dir"
    }

    pub fn is_file(&self) -> bool {
        self.resource_type == "file"
    }

    /// A resource is published once it has either a public URL or key
    pub fn is_published(&self) -> bool {
        !self.public_url.is_empty() || !self.public_key.is_empty()
    }

    /// Directory children embedded in the response, if any were requested
    pub fn items(&self) -> &[Resource] {
        self.embedded
            .as_ref()
            .map(|e| e.items.as_slice())
            .unwrap_or_default()
    }

    /// Total number of children reported by the API
    pub fn total_items(&self) -> i64 {
        self.embedded.as_ref().map(|e| e.total).unwrap_or(0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommentIds {
    pub private_resource: String,
    pub public_resource: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Owner {
    pub login: String,
    pub display_name: String,
    pub uid: String,
}

/// Page of directory children
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Embedded {
    pub sort: String,
    pub path: String,
    pub items: Vec<Resource>,
    pub limit: i64,
    pub offset: i64,
    pub total: i64,
}

/// Flat file listing (all files, recent uploads, published, admin queries)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilesList {
    pub items: Vec<Resource>,
    pub limit: i64,
    pub offset: i64,
    pub total: i64,
}

/// Server-issued URL used for the byte-moving half of a transfer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    #[serde(default)]
    pub href: String,
    #[serde(default)]
    pub method: String,
    /// `href` is a URI template rather than a ready URL
    #[serde(default)]
    pub templated: bool,
}

/// Result of the second upload phase.
///
/// Returned even when the storage node refuses the bytes: check `success`,
/// not just the absence of an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadResult {
    pub status: u16,
    pub success: bool,
}

impl UploadResult {
    /// Status the storage node answers with once the file is stored
    pub const CREATED: u16 = 201;

    pub fn from_status(status: u16) -> Self {
        Self {
            status,
            success: status == Self::CREATED,
        }
    }
}

/// Asynchronous server-side operation (upload from URL, large copies)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Operation {
    pub status: String,
    #[serde(rename = "type")]
    pub operation_type: String,
    pub href: String,
    pub method: String,
    pub templated: bool,
}

/// Known operation states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationState {
    InProgress,
    Success,
    Failed,
}

impl OperationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationState::InProgress => "in-progress",
            OperationState::Success => "success",
            OperationState::Failed => "failed",
        }
    }
}

impl std::fmt::Display for OperationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Operation {
    /// Parsed status; `None` for any string the API may add later
    pub fn state(&self) -> Option<OperationState> {
        match self.status.as_str() {
            "in-progress" => Some(OperationState::InProgress),
            "success" => Some(OperationState::Success),
            "failed" => Some(OperationState::Failed),
            _ => None,
        }
    }

    pub fn is_in_progress(&self) -> bool {
        self.state() == Some(OperationState::InProgress)
    }

    pub fn is_success(&self) -> bool {
        self.state() == Some(OperationState::Success)
    }

    pub fn is_failed(&self) -> bool {
        self.state() == Some(OperationState::Failed)
    }

    /// Operation id: last path segment of `href`, query stripped
    pub fn id(&self) -> Option<&str> {
        let path = self.href.split(['?', '#']).next().unwrap_or_default();
        path.trim_end_matches('/')
            .rsplit('/')
            .next()
            .filter(|id| !id.is_empty() && !id.contains(':'))
    }
}
