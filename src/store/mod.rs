mod schema;
mod sqlite;

pub use sqlite::SqliteStore;

use crate::error::Result;
use crate::types::*;

/// How a new patchset relates to the patch request it lands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchsetOp {
    /// A plain follow-up revision.
    Normal,
    /// A review-annotated revision from a maintainer.
    Review,
    /// Replaces the series: all prior patches of the PR are deleted first.
    Replace,
}

/// Store defines the database interface. All mutating operations are
/// all-or-nothing through a single transaction, and every state-changing
/// operation writes its event-log entry inside that same transaction.
pub trait Store: Send + Sync {
    fn migrate(&self) -> Result<()>;

    // User operations
    fn upsert_user(&self, pubkey: &str, requested_name: &str) -> Result<User>;
    fn get_user_by_id(&self, id: i64) -> Result<Option<User>>;
    fn get_user_by_pubkey(&self, pubkey: &str) -> Result<Option<User>>;
    fn get_user_by_name(&self, name: &str) -> Result<Option<User>>;

    // Repo operations
    fn create_repo(&self, owner_id: i64, name: &str, description: Option<&str>) -> Result<Repo>;
    fn get_repo_by_id(&self, id: i64) -> Result<Option<Repo>>;
    fn get_repo_by_owner_and_name(&self, owner_id: i64, name: &str) -> Result<Option<Repo>>;

    // Patch request operations
    fn submit_patch_request(&self, repo_id: i64, user_id: i64, stream: &str)
        -> Result<PatchRequest>;
    fn submit_patchset(
        &self,
        pr_id: i64,
        user_id: i64,
        op: PatchsetOp,
        stream: &str,
    ) -> Result<Vec<Patch>>;
    /// Moves a patch request to `status`. Transition validity is enforced
    /// here rather than by callers, so a repeated transition fails with
    /// [`Error::AlreadyInState`](crate::error::Error::AlreadyInState) no
    /// matter which command path reached it.
    fn update_patch_request_status(&self, pr_id: i64, user_id: i64, status: Status) -> Result<()>;
    fn update_patch_request_name(&self, pr_id: i64, user_id: i64, name: &str) -> Result<()>;
    fn delete_patchset(&self, user_id: i64, pr_id: i64, patchset_id: i64) -> Result<()>;

    fn get_patch_requests(&self) -> Result<Vec<PatchRequest>>;
    fn get_patch_requests_by_repo(&self, repo_id: i64) -> Result<Vec<PatchRequest>>;
    fn get_patch_request_by_id(&self, id: i64) -> Result<Option<PatchRequest>>;
    fn get_patchsets_by_pr(&self, pr_id: i64) -> Result<Vec<Patchset>>;
    fn get_patchset_by_id(&self, id: i64) -> Result<Option<Patchset>>;
    fn get_patches_by_patchset(&self, patchset_id: i64) -> Result<Vec<Patch>>;

    // Event log queries, newest first
    fn get_events(&self) -> Result<Vec<EventLog>>;
    fn get_events_by_user(&self, user_id: i64) -> Result<Vec<EventLog>>;
    fn get_events_by_pr(&self, pr_id: i64) -> Result<Vec<EventLog>>;
    fn get_events_by_repo(&self, repo_id: i64) -> Result<Vec<EventLog>>;

    // Boundary ACL
    fn is_banned(&self, pubkey: &str, ip_address: Option<&str>) -> Result<bool>;
    fn ban(&self, pubkey: Option<&str>, ip_address: Option<&str>) -> Result<()>;
}
