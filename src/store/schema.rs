/// Ordered, append-only migration list. `PRAGMA user_version` tracks how many
/// entries have been applied; new deployments run all of them, existing
/// databases run the tail. Entries are never edited or reordered once
/// released.
pub const MIGRATIONS: &[&str] = &[
    // 1: initial schema
    r#"
CREATE TABLE users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    pubkey TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL UNIQUE,
    created_at TEXT NOT NULL
);

CREATE TABLE repos (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    description TEXT,
    created_at TEXT NOT NULL,
    UNIQUE(user_id, name)
);

CREATE TABLE patch_requests (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    repo_id INTEGER NOT NULL REFERENCES repos(id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'open',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE patchsets (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    patch_request_id INTEGER NOT NULL REFERENCES patch_requests(id) ON DELETE CASCADE,
    review INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
);

CREATE TABLE patches (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    patchset_id INTEGER NOT NULL REFERENCES patchsets(id) ON DELETE CASCADE,
    author_name TEXT NOT NULL,
    author_email TEXT NOT NULL,
    author_date TEXT NOT NULL,
    title TEXT NOT NULL,
    body TEXT NOT NULL,
    body_appendix TEXT NOT NULL,
    commit_sha TEXT NOT NULL,
    content_sha TEXT NOT NULL,
    base_commit_sha TEXT,
    raw_text TEXT NOT NULL,
    created_at TEXT NOT NULL,
    UNIQUE(patchset_id, content_sha)
);

CREATE TABLE event_logs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    repo_id INTEGER REFERENCES repos(id) ON DELETE CASCADE,
    patch_request_id INTEGER REFERENCES patch_requests(id) ON DELETE CASCADE,
    patchset_id INTEGER REFERENCES patchsets(id) ON DELETE CASCADE,
    event TEXT NOT NULL,
    data TEXT,
    created_at TEXT NOT NULL
);

CREATE TABLE acl (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    pubkey TEXT,
    ip_address TEXT,
    permission TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX idx_repos_user ON repos(user_id);
CREATE INDEX idx_prs_repo ON patch_requests(repo_id);
CREATE INDEX idx_prs_user ON patch_requests(user_id);
CREATE INDEX idx_patchsets_pr ON patchsets(patch_request_id);
CREATE INDEX idx_patches_patchset ON patches(patchset_id);
CREATE INDEX idx_events_pr ON event_logs(patch_request_id);
CREATE INDEX idx_events_repo ON event_logs(repo_id);
CREATE INDEX idx_events_user ON event_logs(user_id);
CREATE INDEX idx_acl_pubkey ON acl(pubkey);
CREATE INDEX idx_acl_ip ON acl(ip_address);
"#,
];
