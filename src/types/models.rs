use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Status;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    /// Canonicalized SSH public key fingerprint (`SHA256:...`).
    pub pubkey: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repo {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatchRequest {
    pub id: i64,
    pub user_id: i64,
    pub repo_id: i64,
    pub name: String,
    pub status: Status,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patchset {
    pub id: i64,
    pub user_id: i64,
    pub patch_request_id: i64,
    /// True iff this revision carries review annotations.
    pub review: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patch {
    pub id: i64,
    pub user_id: i64,
    pub patchset_id: i64,
    pub author_name: String,
    pub author_email: String,
    pub author_date: DateTime<Utc>,
    pub title: String,
    pub body: String,
    pub body_appendix: String,
    /// The original commit identity as present in the mbox input.
    pub commit_sha: String,
    /// Normalization-stable content digest; the equality key for patches.
    pub content_sha: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_commit_sha: Option<String>,
    pub raw_text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLog {
    pub id: i64,
    pub user_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch_request_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patchset_id: Option<i64>,
    pub event: String,
    pub data: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AclEntry {
    pub id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pubkey: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    pub permission: String,
    pub created_at: DateTime<Utc>,
}
