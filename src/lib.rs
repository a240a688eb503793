//! # Patchbay
//!
//! An SSH-accessible patch request service: contributors send
//! `git format-patch` streams over SSH, maintainers review, rework and
//! accept them. No git repositories are hosted here; patches are plain
//! byte streams with a normalization-stable content identity.
//!
//! The SSH transport itself is external. sshd authenticates the key and a
//! ForceCommand entry runs `patchbay shell`, which handles exactly one
//! command per connection:
//!
//! ```text
//! command="patchbay shell --pubkey \"ssh-ed25519 AAAA... ada\"" ssh-ed25519 AAAA... ada
//! ```
//!
//! ```rust,ignore
//! use patchbay::config::Config;
//! use patchbay::session;
//! use patchbay::store::{SqliteStore, Store};
//!
//! let config = Config::load(None)?;
//! let store = SqliteStore::new(config.db_path())?;
//! store.migrate()?;
//! session::dispatch(&store, &config, pubkey, None, "pr ls", &mut stdin, &mut stdout)?;
//! ```

pub mod acl;
pub mod config;
pub mod error;
pub mod patch;
pub mod rangediff;
pub mod session;
pub mod store;
pub mod types;
