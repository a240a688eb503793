use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rand::{distributions::Alphanumeric, Rng};
use rusqlite::{Connection, OptionalExtension, Row, Transaction, params};

use super::schema::MIGRATIONS;
use super::{PatchsetOp, Store};
use crate::error::{Error, Result};
use crate::patch::{self, ParsedPatch};
use crate::types::*;

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Self::with_connection(conn)
    }

    /// An in-memory store satisfying the same contracts; used in tests.
    /// (WAL only applies to on-disk databases.)
    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|e| {
            tracing::error!("Invalid datetime in database: '{}' - {}", s, e);
            Utc::now()
        })
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn parse_status(s: &str) -> Status {
    Status::parse(s).unwrap_or_else(|| {
        tracing::error!("Invalid status in database: '{}'", s);
        Status::Open
    })
}

/// Maps a constraint violation to a domain-level conflict; everything else
/// stays a database error.
fn map_conflict(e: rusqlite::Error, what: String) -> Error {
    match e {
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            Error::Conflict(what)
        }
        e => Error::from(e),
    }
}

fn map_user(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        pubkey: row.get(1)?,
        name: row.get(2)?,
        created_at: parse_datetime(&row.get::<_, String>(3)?),
    })
}

fn map_repo(row: &Row<'_>) -> rusqlite::Result<Repo> {
    Ok(Repo {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        created_at: parse_datetime(&row.get::<_, String>(4)?),
    })
}

fn map_pr(row: &Row<'_>) -> rusqlite::Result<PatchRequest> {
    Ok(PatchRequest {
        id: row.get(0)?,
        user_id: row.get(1)?,
        repo_id: row.get(2)?,
        name: row.get(3)?,
        status: parse_status(&row.get::<_, String>(4)?),
        created_at: parse_datetime(&row.get::<_, String>(5)?),
        updated_at: parse_datetime(&row.get::<_, String>(6)?),
    })
}

fn map_patchset(row: &Row<'_>) -> rusqlite::Result<Patchset> {
    Ok(Patchset {
        id: row.get(0)?,
        user_id: row.get(1)?,
        patch_request_id: row.get(2)?,
        review: row.get(3)?,
        created_at: parse_datetime(&row.get::<_, String>(4)?),
    })
}

const PATCH_COLS: &str = "id, user_id, patchset_id, author_name, author_email, author_date, \
     title, body, body_appendix, commit_sha, content_sha, base_commit_sha, raw_text, created_at";

fn map_patch(row: &Row<'_>) -> rusqlite::Result<Patch> {
    Ok(Patch {
        id: row.get(0)?,
        user_id: row.get(1)?,
        patchset_id: row.get(2)?,
        author_name: row.get(3)?,
        author_email: row.get(4)?,
        author_date: parse_datetime(&row.get::<_, String>(5)?),
        title: row.get(6)?,
        body: row.get(7)?,
        body_appendix: row.get(8)?,
        commit_sha: row.get(9)?,
        content_sha: row.get(10)?,
        base_commit_sha: row.get(11)?,
        raw_text: row.get(12)?,
        created_at: parse_datetime(&row.get::<_, String>(13)?),
    })
}

const EVENT_COLS: &str =
    "id, user_id, repo_id, patch_request_id, patchset_id, event, data, created_at";

fn map_event(row: &Row<'_>) -> rusqlite::Result<EventLog> {
    let data: Option<String> = row.get(6)?;
    Ok(EventLog {
        id: row.get(0)?,
        user_id: row.get(1)?,
        repo_id: row.get(2)?,
        patch_request_id: row.get(3)?,
        patchset_id: row.get(4)?,
        event: row.get(5)?,
        data: data
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or(serde_json::Value::Null),
        created_at: parse_datetime(&row.get::<_, String>(7)?),
    })
}

fn log_event(
    tx: &Transaction<'_>,
    user_id: i64,
    repo_id: Option<i64>,
    pr_id: Option<i64>,
    patchset_id: Option<i64>,
    event: &str,
    data: serde_json::Value,
) -> Result<()> {
    tx.execute(
        "INSERT INTO event_logs (user_id, repo_id, patch_request_id, patchset_id, event, data, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            user_id,
            repo_id,
            pr_id,
            patchset_id,
            event,
            data.to_string(),
            format_datetime(&Utc::now()),
        ],
    )?;
    Ok(())
}

fn get_pr_tx(tx: &Transaction<'_>, pr_id: i64) -> Result<PatchRequest> {
    tx.query_row(
        "SELECT id, user_id, repo_id, name, status, created_at, updated_at
         FROM patch_requests WHERE id = ?1",
        params![pr_id],
        map_pr,
    )
    .optional()?
    .ok_or(Error::NotFound)
}

fn insert_patchset_tx(tx: &Transaction<'_>, user_id: i64, pr_id: i64, review: bool) -> Result<i64> {
    tx.execute(
        "INSERT INTO patchsets (user_id, patch_request_id, review, created_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![user_id, pr_id, review, format_datetime(&Utc::now())],
    )?;
    Ok(tx.last_insert_rowid())
}

/// Inserts one parsed patch under the given patchset. Returns `PatchExists`
/// when the PR already holds a patch with the same content identity; callers
/// skip those silently.
fn insert_patch_tx(
    tx: &Transaction<'_>,
    user_id: i64,
    pr_id: i64,
    patchset_id: i64,
    parsed: &ParsedPatch,
) -> Result<Patch> {
    let existing: i64 = tx.query_row(
        "SELECT COUNT(*) FROM patches p
         JOIN patchsets ps ON p.patchset_id = ps.id
         WHERE ps.patch_request_id = ?1 AND p.content_sha = ?2",
        params![pr_id, parsed.content_sha],
        |row| row.get(0),
    )?;
    if existing > 0 {
        return Err(Error::PatchExists);
    }

    let now = Utc::now();
    tx.execute(
        "INSERT INTO patches (user_id, patchset_id, author_name, author_email, author_date,
            title, body, body_appendix, commit_sha, content_sha, base_commit_sha, raw_text, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            user_id,
            patchset_id,
            parsed.author_name,
            parsed.author_email,
            format_datetime(&parsed.author_date),
            parsed.title,
            parsed.body,
            parsed.body_appendix,
            parsed.commit_sha,
            parsed.content_sha,
            parsed.base_commit_sha,
            parsed.raw_text,
            format_datetime(&now),
        ],
    )?;

    Ok(Patch {
        id: tx.last_insert_rowid(),
        user_id,
        patchset_id,
        author_name: parsed.author_name.clone(),
        author_email: parsed.author_email.clone(),
        author_date: parsed.author_date,
        title: parsed.title.clone(),
        body: parsed.body.clone(),
        body_appendix: parsed.body_appendix.clone(),
        commit_sha: parsed.commit_sha.clone(),
        content_sha: parsed.content_sha.clone(),
        base_commit_sha: parsed.base_commit_sha.clone(),
        raw_text: parsed.raw_text.clone(),
        created_at: now,
    })
}

impl Store for SqliteStore {
    fn migrate(&self) -> Result<()> {
        let mut conn = self.conn();
        let version: i64 =
            conn.query_row("SELECT * FROM pragma_user_version", [], |row| row.get(0))?;

        let target = MIGRATIONS.len() as i64;
        if version > target {
            return Err(Error::Config(format!(
                "database schema version {version} is newer than this binary supports ({target})"
            )));
        }

        for (idx, migration) in MIGRATIONS.iter().enumerate().skip(version as usize) {
            let tx = conn.transaction()?;
            tx.execute_batch(migration)?;
            tx.pragma_update(None, "user_version", (idx + 1) as i64)?;
            tx.commit()?;
            tracing::debug!("applied migration {}", idx + 1);
        }
        Ok(())
    }

    fn upsert_user(&self, pubkey: &str, requested_name: &str) -> Result<User> {
        if let Some(user) = self.get_user_by_pubkey(pubkey)? {
            return Ok(user);
        }

        let trimmed = requested_name.trim();
        let name = if trimmed.is_empty() { "user" } else { trimmed };

        let conn = self.conn();
        let now = format_datetime(&Utc::now());
        let inserted = conn.execute(
            "INSERT INTO users (pubkey, name, created_at) VALUES (?1, ?2, ?3)",
            params![pubkey, name, now],
        );

        let id = match inserted {
            Ok(_) => conn.last_insert_rowid(),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                // Name taken: retry once with a random alphanumeric suffix.
                let suffix: String = rand::thread_rng()
                    .sample_iter(&Alphanumeric)
                    .take(4)
                    .map(char::from)
                    .collect();
                conn.execute(
                    "INSERT INTO users (pubkey, name, created_at) VALUES (?1, ?2, ?3)",
                    params![pubkey, format!("{name}{suffix}"), now],
                )
                .map_err(|e| map_conflict(e, "could not allocate a unique username".to_string()))?;
                conn.last_insert_rowid()
            }
            Err(e) => return Err(Error::from(e)),
        };

        conn.query_row(
            "SELECT id, pubkey, name, created_at FROM users WHERE id = ?1",
            params![id],
            map_user,
        )
        .map_err(Error::from)
    }

    fn get_user_by_id(&self, id: i64) -> Result<Option<User>> {
        self.conn()
            .query_row(
                "SELECT id, pubkey, name, created_at FROM users WHERE id = ?1",
                params![id],
                map_user,
            )
            .optional()
            .map_err(Error::from)
    }

    fn get_user_by_pubkey(&self, pubkey: &str) -> Result<Option<User>> {
        self.conn()
            .query_row(
                "SELECT id, pubkey, name, created_at FROM users WHERE pubkey = ?1",
                params![pubkey],
                map_user,
            )
            .optional()
            .map_err(Error::from)
    }

    fn get_user_by_name(&self, name: &str) -> Result<Option<User>> {
        self.conn()
            .query_row(
                "SELECT id, pubkey, name, created_at FROM users WHERE name = ?1",
                params![name],
                map_user,
            )
            .optional()
            .map_err(Error::from)
    }

    fn create_repo(&self, owner_id: i64, name: &str, description: Option<&str>) -> Result<Repo> {
        if name.trim().is_empty() {
            return Err(Error::BadRequest("repo name cannot be empty".to_string()));
        }

        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let now = Utc::now();
        tx.execute(
            "INSERT INTO repos (user_id, name, description, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![owner_id, name, description, format_datetime(&now)],
        )
        .map_err(|e| map_conflict(e, format!("repo '{name}' already exists")))?;
        let id = tx.last_insert_rowid();

        log_event(
            &tx,
            owner_id,
            Some(id),
            None,
            None,
            "repo_created",
            serde_json::json!({ "name": name }),
        )?;
        tx.commit()?;

        Ok(Repo {
            id,
            user_id: owner_id,
            name: name.to_string(),
            description: description.map(str::to_string),
            created_at: now,
        })
    }

    fn get_repo_by_id(&self, id: i64) -> Result<Option<Repo>> {
        self.conn()
            .query_row(
                "SELECT id, user_id, name, description, created_at FROM repos WHERE id = ?1",
                params![id],
                map_repo,
            )
            .optional()
            .map_err(Error::from)
    }

    fn get_repo_by_owner_and_name(&self, owner_id: i64, name: &str) -> Result<Option<Repo>> {
        self.conn()
            .query_row(
                "SELECT id, user_id, name, description, created_at
                 FROM repos WHERE user_id = ?1 AND name = ?2",
                params![owner_id, name],
                map_repo,
            )
            .optional()
            .map_err(Error::from)
    }

    fn submit_patch_request(
        &self,
        repo_id: i64,
        user_id: i64,
        stream: &str,
    ) -> Result<PatchRequest> {
        let parsed = patch::parse_stream(stream)?;
        if parsed.is_empty() {
            return Err(Error::Parse(
                "patch stream contains no patches (cover letters carry no commit)".to_string(),
            ));
        }

        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let now = Utc::now();
        let name = parsed[0].title.clone();

        tx.execute(
            "INSERT INTO patch_requests (user_id, repo_id, name, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
            params![
                user_id,
                repo_id,
                name,
                Status::Open.as_str(),
                format_datetime(&now),
            ],
        )?;
        let pr_id = tx.last_insert_rowid();
        let patchset_id = insert_patchset_tx(&tx, user_id, pr_id, false)?;

        for p in &parsed {
            match insert_patch_tx(&tx, user_id, pr_id, patchset_id, p) {
                Ok(_) | Err(Error::PatchExists) => {}
                Err(e) => return Err(e),
            }
        }

        log_event(
            &tx,
            user_id,
            Some(repo_id),
            Some(pr_id),
            Some(patchset_id),
            "pr_created",
            serde_json::json!({ "name": name }),
        )?;
        tx.commit()?;

        Ok(PatchRequest {
            id: pr_id,
            user_id,
            repo_id,
            name,
            status: Status::Open,
            created_at: now,
            updated_at: now,
        })
    }

    fn submit_patchset(
        &self,
        pr_id: i64,
        user_id: i64,
        op: PatchsetOp,
        stream: &str,
    ) -> Result<Vec<Patch>> {
        let parsed = patch::parse_stream(stream)?;
        if parsed.is_empty() {
            return Err(Error::Parse(
                "patch stream contains no patches (cover letters carry no commit)".to_string(),
            ));
        }

        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let pr = get_pr_tx(&tx, pr_id)?;

        if op == PatchsetOp::Replace {
            tx.execute(
                "DELETE FROM patches WHERE patchset_id IN
                 (SELECT id FROM patchsets WHERE patch_request_id = ?1)",
                params![pr_id],
            )?;
        }

        let patchset_id = insert_patchset_tx(&tx, user_id, pr_id, op == PatchsetOp::Review)?;

        let mut inserted = Vec::new();
        for p in &parsed {
            match insert_patch_tx(&tx, user_id, pr_id, patchset_id, p) {
                Ok(patch) => inserted.push(patch),
                Err(Error::PatchExists) => {}
                Err(e) => return Err(e),
            }
        }

        if inserted.is_empty() {
            // Everything was a duplicate of patches the PR already holds;
            // dropping the transaction discards the empty patchset row too.
            return Ok(Vec::new());
        }

        // A review revision moves the PR into the reviewed state.
        let status = match op {
            PatchsetOp::Review => Status::Reviewed,
            _ => pr.status,
        };
        tx.execute(
            "UPDATE patch_requests SET status = ?1, updated_at = ?2 WHERE id = ?3",
            params![status.as_str(), format_datetime(&Utc::now()), pr_id],
        )?;

        let event = match op {
            PatchsetOp::Normal => "pr_patchset_added",
            PatchsetOp::Review => "pr_reviewed",
            PatchsetOp::Replace => "pr_patchset_replaced",
        };
        log_event(
            &tx,
            user_id,
            Some(pr.repo_id),
            Some(pr_id),
            Some(patchset_id),
            event,
            serde_json::json!({ "patches": inserted.len() }),
        )?;
        tx.commit()?;

        Ok(inserted)
    }

    fn update_patch_request_status(&self, pr_id: i64, user_id: i64, status: Status) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let pr = get_pr_tx(&tx, pr_id)?;
        pr.status.transition_to(status)?;

        tx.execute(
            "UPDATE patch_requests SET status = ?1, updated_at = ?2 WHERE id = ?3",
            params![status.as_str(), format_datetime(&Utc::now()), pr_id],
        )?;
        log_event(
            &tx,
            user_id,
            Some(pr.repo_id),
            Some(pr_id),
            None,
            "pr_status_changed",
            serde_json::json!({ "status": status.as_str() }),
        )?;
        tx.commit()?;
        Ok(())
    }

    fn update_patch_request_name(&self, pr_id: i64, user_id: i64, name: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(Error::BadRequest("title cannot be empty".to_string()));
        }

        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let pr = get_pr_tx(&tx, pr_id)?;

        tx.execute(
            "UPDATE patch_requests SET name = ?1, updated_at = ?2 WHERE id = ?3",
            params![name, format_datetime(&Utc::now()), pr_id],
        )?;
        log_event(
            &tx,
            user_id,
            Some(pr.repo_id),
            Some(pr_id),
            None,
            "pr_name_changed",
            serde_json::json!({ "name": name }),
        )?;
        tx.commit()?;
        Ok(())
    }

    fn delete_patchset(&self, user_id: i64, pr_id: i64, patchset_id: i64) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let pr = get_pr_tx(&tx, pr_id)?;

        let rows = tx.execute(
            "DELETE FROM patchsets WHERE id = ?1 AND patch_request_id = ?2",
            params![patchset_id, pr_id],
        )?;
        if rows == 0 {
            return Err(Error::NotFound);
        }

        // The event outlives the patchset, so the reference travels in `data`.
        log_event(
            &tx,
            user_id,
            Some(pr.repo_id),
            Some(pr_id),
            None,
            "patchset_deleted",
            serde_json::json!({ "patchset_id": patchset_id }),
        )?;
        tx.commit()?;
        Ok(())
    }

    fn get_patch_requests(&self) -> Result<Vec<PatchRequest>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, user_id, repo_id, name, status, created_at, updated_at
             FROM patch_requests ORDER BY id",
        )?;
        let rows = stmt.query_map([], map_pr)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn get_patch_requests_by_repo(&self, repo_id: i64) -> Result<Vec<PatchRequest>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, user_id, repo_id, name, status, created_at, updated_at
             FROM patch_requests WHERE repo_id = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map(params![repo_id], map_pr)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn get_patch_request_by_id(&self, id: i64) -> Result<Option<PatchRequest>> {
        self.conn()
            .query_row(
                "SELECT id, user_id, repo_id, name, status, created_at, updated_at
                 FROM patch_requests WHERE id = ?1",
                params![id],
                map_pr,
            )
            .optional()
            .map_err(Error::from)
    }

    fn get_patchsets_by_pr(&self, pr_id: i64) -> Result<Vec<Patchset>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, user_id, patch_request_id, review, created_at
             FROM patchsets WHERE patch_request_id = ?1 ORDER BY created_at, id",
        )?;
        let rows = stmt.query_map(params![pr_id], map_patchset)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn get_patchset_by_id(&self, id: i64) -> Result<Option<Patchset>> {
        self.conn()
            .query_row(
                "SELECT id, user_id, patch_request_id, review, created_at
                 FROM patchsets WHERE id = ?1",
                params![id],
                map_patchset,
            )
            .optional()
            .map_err(Error::from)
    }

    fn get_patches_by_patchset(&self, patchset_id: i64) -> Result<Vec<Patch>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {PATCH_COLS} FROM patches WHERE patchset_id = ?1 ORDER BY created_at, id"
        ))?;
        let rows = stmt.query_map(params![patchset_id], map_patch)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn get_events(&self) -> Result<Vec<EventLog>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {EVENT_COLS} FROM event_logs ORDER BY created_at DESC, id DESC"
        ))?;
        let rows = stmt.query_map([], map_event)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn get_events_by_user(&self, user_id: i64) -> Result<Vec<EventLog>> {
        // Events authored by the user, plus events on PRs the user submitted.
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {EVENT_COLS} FROM event_logs
             WHERE user_id = ?1
                OR patch_request_id IN (SELECT id FROM patch_requests WHERE user_id = ?1)
             ORDER BY created_at DESC, id DESC"
        ))?;
        let rows = stmt.query_map(params![user_id], map_event)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn get_events_by_pr(&self, pr_id: i64) -> Result<Vec<EventLog>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {EVENT_COLS} FROM event_logs
             WHERE patch_request_id = ?1 ORDER BY created_at DESC, id DESC"
        ))?;
        let rows = stmt.query_map(params![pr_id], map_event)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn get_events_by_repo(&self, repo_id: i64) -> Result<Vec<EventLog>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {EVENT_COLS} FROM event_logs
             WHERE repo_id = ?1 ORDER BY created_at DESC, id DESC"
        ))?;
        let rows = stmt.query_map(params![repo_id], map_event)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn is_banned(&self, pubkey: &str, ip_address: Option<&str>) -> Result<bool> {
        let count: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM acl
             WHERE permission = 'banned'
               AND (pubkey = ?1 OR (?2 IS NOT NULL AND ip_address = ?2))",
            params![pubkey, ip_address],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn ban(&self, pubkey: Option<&str>, ip_address: Option<&str>) -> Result<()> {
        if pubkey.is_none() && ip_address.is_none() {
            return Err(Error::BadRequest(
                "a ban needs a pubkey or an ip address".to_string(),
            ));
        }
        self.conn().execute(
            "INSERT INTO acl (pubkey, ip_address, permission, created_at)
             VALUES (?1, ?2, 'banned', ?3)",
            params![pubkey, ip_address, format_datetime(&Utc::now())],
        )?;
        Ok(())
    }
}
