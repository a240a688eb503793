mod models;
mod status;

pub use models::{AclEntry, EventLog, Patch, PatchRequest, Patchset, Repo, User};
pub use status::Status;
