//! Actor identity and capability checks.
//!
//! Keys arrive as authorized-keys lines (possibly with an options prefix) or
//! as ready-made fingerprints. Everything downstream of the boundary works on
//! the canonical `SHA256:<base64>` fingerprint form, so the same physical key
//! always maps to the same user row regardless of comment or options.

use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD};
use base64::Engine;
use sha2::{Digest, Sha256};

use crate::config::CreateRepoPolicy;
use crate::error::{Error, Result};
use crate::types::{PatchRequest, Patchset, Repo, User};

/// Reduces a public key to its canonical `SHA256:` fingerprint.
///
/// Accepts a full authorized-keys line (options and comment tolerated), a
/// bare `<type> <base64>` pair, or an existing fingerprint (returned as-is).
pub fn canonicalize_pubkey(line: &str) -> Result<String> {
    let line = line.trim();
    if let Some(rest) = line.strip_prefix("SHA256:") {
        let fp = rest.split_whitespace().next().unwrap_or("");
        if !fp.is_empty() && fp.chars().all(is_base64_char) {
            return Ok(format!("SHA256:{fp}"));
        }
        return Err(Error::BadRequest(format!("malformed fingerprint {line:?}")));
    }

    let mut tokens = line.split_whitespace();
    while let Some(token) = tokens.next() {
        if !is_key_type(token) {
            continue;
        }
        let blob = tokens
            .next()
            .ok_or_else(|| Error::BadRequest("public key is missing its data".to_string()))?;
        let decoded = STANDARD
            .decode(blob)
            .map_err(|e| Error::BadRequest(format!("undecodable public key: {e}")))?;
        let digest = Sha256::digest(&decoded);
        return Ok(format!("SHA256:{}", STANDARD_NO_PAD.encode(digest)));
    }

    Err(Error::BadRequest(format!(
        "unrecognized public key {line:?}"
    )))
}

/// Derives a username suggestion from the key's comment field. Falls back to
/// `"user"`; the store resolves collisions.
pub fn suggest_name(line: &str) -> String {
    let mut tokens = line.trim().split_whitespace();
    let comment = loop {
        match tokens.next() {
            Some(token) if is_key_type(token) => {
                tokens.next(); // key data
                break tokens.next();
            }
            Some(_) => continue,
            None => break None,
        }
    };

    let name: String = comment
        .map(|c| c.split('@').next().unwrap_or(c))
        .unwrap_or("")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_' || *c == '.')
        .collect();
    if name.is_empty() {
        "user".to_string()
    } else {
        name
    }
}

/// Whether a canonicalized fingerprint belongs to the configured admin set.
/// Admin entries may themselves be full key lines; unparsable entries are
/// skipped with a warning rather than locking everyone out.
pub fn is_admin(admins: &[String], fingerprint: &str) -> bool {
    admins.iter().any(|entry| match canonicalize_pubkey(entry) {
        Ok(fp) => fp == fingerprint,
        Err(e) => {
            tracing::warn!(%entry, error = %e, "skipping unparsable admin key");
            false
        }
    })
}

fn is_key_type(token: &str) -> bool {
    token.starts_with("ssh-") || token.starts_with("ecdsa-sha2-") || token.starts_with("sk-")
}

fn is_base64_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '+' || c == '/' || c == '='
}

/// An authenticated caller: the resolved user row plus their admin bit.
#[derive(Debug, Clone)]
pub struct Actor {
    pub user: User,
    pub is_admin: bool,
}

impl Actor {
    pub fn new(user: User, is_admin: bool) -> Self {
        Self { user, is_admin }
    }

    fn is_submitter(&self, pr: &PatchRequest) -> bool {
        self.user.id == pr.user_id
    }

    fn owns(&self, repo: &Repo) -> bool {
        self.user.id == repo.user_id
    }

    /// Title edits, close and reopen.
    pub fn can_modify(&self, pr: &PatchRequest, repo: &Repo) -> bool {
        self.is_admin || self.is_submitter(pr) || self.owns(repo)
    }

    /// Accepting a PR or attaching a review patchset. Nobody reviews their
    /// own submission, admins included.
    pub fn can_review(&self, pr: &PatchRequest, repo: &Repo) -> bool {
        (self.is_admin || self.owns(repo)) && !self.is_submitter(pr)
    }

    pub fn can_add_patchset(&self, pr: &PatchRequest, repo: &Repo) -> bool {
        self.is_admin || self.is_submitter(pr) || self.owns(repo)
    }

    pub fn can_create_repo(&self, policy: CreateRepoPolicy) -> bool {
        match policy {
            CreateRepoPolicy::Admin => self.is_admin,
            CreateRepoPolicy::User => true,
        }
    }

    pub fn can_delete_patchset(&self, patchset: &Patchset) -> bool {
        self.is_admin || self.user.id == patchset.user_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Status;
    use chrono::Utc;

    fn key_line(seed: &[u8], comment: &str) -> String {
        let blob = STANDARD.encode(seed);
        format!("ssh-ed25519 {blob} {comment}")
    }

    fn user(id: i64) -> User {
        User {
            id,
            pubkey: format!("SHA256:user{id}"),
            name: format!("user{id}"),
            created_at: Utc::now(),
        }
    }

    fn repo(owner: i64) -> Repo {
        Repo {
            id: 1,
            user_id: owner,
            name: "test".to_string(),
            description: None,
            created_at: Utc::now(),
        }
    }

    fn pr(submitter: i64) -> PatchRequest {
        PatchRequest {
            id: 1,
            user_id: submitter,
            repo_id: 1,
            name: "a change".to_string(),
            status: Status::Open,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn fingerprint_ignores_comment_and_options() {
        let plain = canonicalize_pubkey(&key_line(b"key material", "ada@example.com")).unwrap();
        let renamed = canonicalize_pubkey(&key_line(b"key material", "other")).unwrap();
        let with_options = canonicalize_pubkey(&format!(
            "restrict,command=\"pb shell\" {}",
            key_line(b"key material", "ada@example.com")
        ))
        .unwrap();

        assert_eq!(plain, renamed);
        assert_eq!(plain, with_options);
        assert!(plain.starts_with("SHA256:"));
        // 32-byte digest, base64 without padding.
        assert_eq!(plain.len(), "SHA256:".len() + 43);
    }

    #[test]
    fn distinct_keys_get_distinct_fingerprints() {
        let a = canonicalize_pubkey(&key_line(b"key one", "x")).unwrap();
        let b = canonicalize_pubkey(&key_line(b"key two", "x")).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn existing_fingerprint_passes_through() {
        let fp = canonicalize_pubkey(&key_line(b"key material", "x")).unwrap();
        assert_eq!(canonicalize_pubkey(&fp).unwrap(), fp);
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(matches!(
            canonicalize_pubkey("not a key at all"),
            Err(Error::BadRequest(_))
        ));
        assert!(matches!(
            canonicalize_pubkey("ssh-ed25519 !!!not-base64!!!"),
            Err(Error::BadRequest(_))
        ));
        assert!(matches!(
            canonicalize_pubkey(""),
            Err(Error::BadRequest(_))
        ));
    }

    #[test]
    fn name_comes_from_comment_local_part() {
        assert_eq!(suggest_name(&key_line(b"k", "ada@example.com")), "ada");
        assert_eq!(suggest_name(&key_line(b"k", "grace.hopper")), "grace.hopper");
        assert_eq!(suggest_name("ssh-ed25519 QUJD"), "user");
    }

    #[test]
    fn admin_set_matches_by_fingerprint() {
        let line = key_line(b"admin key", "root@box");
        let fp = canonicalize_pubkey(&line).unwrap();
        let admins = vec![line, "garbage entry".to_string()];
        assert!(is_admin(&admins, &fp));
        assert!(!is_admin(&admins, "SHA256:somebodyelse"));
    }

    #[test]
    fn submitter_can_modify_but_not_review() {
        let actor = Actor::new(user(1), false);
        let pr = pr(1);
        let repo = repo(2);
        assert!(actor.can_modify(&pr, &repo));
        assert!(actor.can_add_patchset(&pr, &repo));
        assert!(!actor.can_review(&pr, &repo));
    }

    #[test]
    fn repo_owner_can_review_others_submissions() {
        let actor = Actor::new(user(2), false);
        let pr = pr(1);
        let repo = repo(2);
        assert!(actor.can_review(&pr, &repo));
        assert!(actor.can_modify(&pr, &repo));
    }

    #[test]
    fn admin_cannot_review_their_own_pr() {
        let actor = Actor::new(user(1), true);
        let pr = pr(1);
        let repo = repo(2);
        assert!(!actor.can_review(&pr, &repo));
        assert!(actor.can_modify(&pr, &repo));
    }

    #[test]
    fn unrelated_user_has_no_capabilities() {
        let actor = Actor::new(user(3), false);
        let pr = pr(1);
        let repo = repo(2);
        assert!(!actor.can_modify(&pr, &repo));
        assert!(!actor.can_review(&pr, &repo));
        assert!(!actor.can_add_patchset(&pr, &repo));
    }

    #[test]
    fn create_repo_policy_gates_non_admins() {
        let contributor = Actor::new(user(1), false);
        let admin = Actor::new(user(2), true);
        assert!(!contributor.can_create_repo(CreateRepoPolicy::Admin));
        assert!(admin.can_create_repo(CreateRepoPolicy::Admin));
        assert!(contributor.can_create_repo(CreateRepoPolicy::User));
    }

    #[test]
    fn patchset_removal_is_author_or_admin() {
        let ps = Patchset {
            id: 9,
            user_id: 1,
            patch_request_id: 1,
            review: false,
            created_at: Utc::now(),
        };
        assert!(Actor::new(user(1), false).can_delete_patchset(&ps));
        assert!(Actor::new(user(2), true).can_delete_patchset(&ps));
        assert!(!Actor::new(user(2), false).can_delete_patchset(&ps));
    }
}
