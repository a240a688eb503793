//! Plain-text rendering for session responses. Everything here writes to the
//! session's stdout; timestamps honor the configured display format.

use std::io::Write;

use chrono::{DateTime, Utc};

use crate::config::Config;
use crate::error::Result;
use crate::rangediff::RangeEntry;
use crate::types::{EventLog, Patch, PatchRequest, Patchset};

/// A patch request joined with the display names its row references.
pub struct PrRow {
    pub pr: PatchRequest,
    /// `owner/name` of the target repo.
    pub repo: String,
    pub submitter: String,
}

/// An event joined with the acting user's name.
pub struct EventRow {
    pub event: EventLog,
    pub user: String,
}

fn ts(config: &Config, at: &DateTime<Utc>) -> String {
    at.format(&config.time_format).to_string()
}

fn short(sha: &str) -> &str {
    &sha[..sha.len().min(7)]
}

pub fn write_pr_list(out: &mut dyn Write, config: &Config, rows: &[PrRow]) -> Result<()> {
    for row in rows {
        writeln!(
            out,
            "#{:<4} [{:<8}] {}  {}  ({}, {})",
            row.pr.id,
            row.pr.status,
            row.repo,
            row.pr.name,
            row.submitter,
            ts(config, &row.pr.updated_at),
        )?;
    }
    Ok(())
}

pub fn write_summary(
    out: &mut dyn Write,
    config: &Config,
    row: &PrRow,
    patchsets: &[(Patchset, Vec<Patch>)],
) -> Result<()> {
    writeln!(out, "#{} {}", row.pr.id, row.pr.name)?;
    writeln!(out, "repo: {}", row.repo)?;
    writeln!(out, "status: {}", row.pr.status)?;
    writeln!(out, "submitter: {}", row.submitter)?;
    writeln!(out, "created: {}", ts(config, &row.pr.created_at))?;

    for (patchset, patches) in patchsets {
        let marker = if patchset.review { " (review)" } else { "" };
        writeln!(
            out,
            "\npatchset {}{} ({})",
            patchset.id,
            marker,
            ts(config, &patchset.created_at),
        )?;
        for (idx, patch) in patches.iter().enumerate() {
            writeln!(
                out,
                "  {}: {} {} <{}>",
                idx + 1,
                short(&patch.commit_sha),
                patch.title,
                patch.author_email,
            )?;
        }
    }
    Ok(())
}

/// Raw mbox passthrough, suitable for `git am`.
pub fn write_raw(out: &mut dyn Write, patches: &[Patch]) -> Result<()> {
    for patch in patches {
        out.write_all(patch.raw_text.as_bytes())?;
        if !patch.raw_text.ends_with('\n') {
            writeln!(out)?;
        }
    }
    Ok(())
}

pub fn write_range_diff(out: &mut dyn Write, entries: &[RangeEntry]) -> Result<()> {
    for entry in entries {
        out.write_all(entry.header().as_bytes())?;
        if let Some(inner) = &entry.inner {
            out.write_all(inner.as_bytes())?;
        }
    }
    Ok(())
}

pub fn write_events(out: &mut dyn Write, config: &Config, rows: &[EventRow]) -> Result<()> {
    for row in rows {
        let e = &row.event;
        let mut anchor = String::new();
        if let Some(pr_id) = e.patch_request_id {
            anchor = format!(" pr=#{pr_id}");
        }
        let data = if e.data.is_null() {
            String::new()
        } else {
            format!(" {}", e.data)
        };
        writeln!(
            out,
            "{}  {:<22} {}{}{}",
            ts(config, &e.created_at),
            e.event,
            row.user,
            anchor,
            data,
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Status;

    fn config() -> Config {
        Config::default()
    }

    fn row() -> PrRow {
        PrRow {
            pr: PatchRequest {
                id: 1,
                user_id: 1,
                repo_id: 1,
                name: "chore: add torch and create random tensor".to_string(),
                status: Status::Open,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
            repo: "admin/test".to_string(),
            submitter: "contributor".to_string(),
        }
    }

    #[test]
    fn pr_list_carries_id_status_and_repo() {
        let mut out = Vec::new();
        write_pr_list(&mut out, &config(), &[row()]).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("#1"));
        assert!(text.contains("[open"));
        assert!(text.contains("admin/test"));
        assert!(text.contains("contributor"));
    }

    #[test]
    fn summary_lists_patchsets_and_flags_reviews() {
        let patchset = Patchset {
            id: 7,
            user_id: 2,
            patch_request_id: 1,
            review: true,
            created_at: Utc::now(),
        };
        let mut out = Vec::new();
        write_summary(&mut out, &config(), &row(), &[(patchset, Vec::new())]).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("status: open"));
        assert!(text.contains("patchset 7 (review)"));
    }

    #[test]
    fn raw_output_is_byte_identical_to_stored_text() {
        let patch = Patch {
            id: 1,
            user_id: 1,
            patchset_id: 1,
            author_name: "Ada".to_string(),
            author_email: "ada@example.com".to_string(),
            author_date: Utc::now(),
            title: "t".to_string(),
            body: String::new(),
            body_appendix: String::new(),
            commit_sha: "33c682a1d8cadb791a194b8c2d73d9a2e7395b45".to_string(),
            content_sha: "x".to_string(),
            base_commit_sha: None,
            raw_text: "From 33c682a Mon Sep 17 00:00:00 2001\nSubject: t\n".to_string(),
            created_at: Utc::now(),
        };
        let mut out = Vec::new();
        write_raw(&mut out, &[patch.clone()]).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), patch.raw_text);
    }
}
