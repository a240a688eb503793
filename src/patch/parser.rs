use chrono::{DateTime, Utc};

use super::digest;
use crate::error::{Error, Result};

/// One file section of a patch's diff, reduced to its canonical form: the
/// target path plus the hunk content lines (hunk headers, index and mode
/// lines dropped, trailing whitespace per line stripped).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDiff {
    pub path: String,
    pub lines: Vec<String>,
}

/// A normalized patch record as produced by the mailbox parser. Field-for-field
/// this is what the store persists, minus row identity.
#[derive(Debug, Clone)]
pub struct ParsedPatch {
    pub author_name: String,
    pub author_email: String,
    pub author_date: DateTime<Utc>,
    pub title: String,
    pub body: String,
    pub body_appendix: String,
    pub commit_sha: String,
    pub content_sha: String,
    pub base_commit_sha: Option<String>,
    pub raw_text: String,
    pub files: Vec<FileDiff>,
}

/// Parses a `git format-patch` mbox stream into normalized patch records.
///
/// Cover letters (records without a single file section) are silently
/// dropped. Fails when the stream is empty, has no mbox boundary, a patch
/// lacks the `From`/`Date`/`Subject` header trio, or a hunk header is
/// malformed. The returned sequence preserves input order.
pub fn parse_stream(input: &str) -> Result<Vec<ParsedPatch>> {
    if input.trim().is_empty() {
        return Err(Error::Parse("empty patch stream".to_string()));
    }

    let normalized = if input.contains('\r') {
        input.replace("\r\n", "\n")
    } else {
        input.to_string()
    };

    let chunks = split_mbox(&normalized)?;
    let mut patches = Vec::new();
    for chunk in chunks {
        if let Some(patch) = parse_patch(chunk)? {
            patches.push(patch);
        }
    }
    Ok(patches)
}

/// Splits the stream on mbox `From ` separator lines, returning one raw chunk
/// per message.
fn split_mbox(input: &str) -> Result<Vec<&str>> {
    let mut starts = Vec::new();
    let mut offset = 0;
    for line in input.split_inclusive('\n') {
        if is_mbox_separator(line.trim_end_matches('\n')) {
            starts.push(offset);
        }
        offset += line.len();
    }

    if starts.is_empty() {
        return Err(Error::Parse("no mbox `From ` boundary found".to_string()));
    }

    let mut chunks = Vec::with_capacity(starts.len());
    for (idx, &start) in starts.iter().enumerate() {
        let end = starts.get(idx + 1).copied().unwrap_or(input.len());
        chunks.push(&input[start..end]);
    }
    Ok(chunks)
}

/// Boundary lines as `git format-patch` writes them: `From <id>` followed by
/// an asctime-style date. A commit message line that merely starts with
/// `From ` lacks the date tail and must not split the stream.
fn is_mbox_separator(line: &str) -> bool {
    let Some(rest) = line.strip_prefix("From ") else {
        return false;
    };
    let mut tokens = rest.split_whitespace();
    if tokens.next().is_none() {
        return false;
    }
    let tail: Vec<&str> = tokens.collect();
    tail.len() >= 3
        && tail.iter().any(|t| t.matches(':').count() == 2)
        && tail
            .last()
            .is_some_and(|t| t.len() == 4 && t.bytes().all(|b| b.is_ascii_digit()))
}

fn parse_patch(raw: &str) -> Result<Option<ParsedPatch>> {
    let mut lines = raw.lines();

    let separator = lines
        .next()
        .ok_or_else(|| Error::Parse("empty mbox chunk".to_string()))?;
    let sha_token = separator
        .strip_prefix("From ")
        .and_then(|rest| rest.split_whitespace().next())
        .unwrap_or("");

    let (headers, message_start) = parse_headers(raw)?;

    let from = header_value(&headers, "from")
        .ok_or_else(|| Error::Parse("patch is missing a From header".to_string()))?;
    let date = header_value(&headers, "date")
        .ok_or_else(|| Error::Parse("patch is missing a Date header".to_string()))?;
    let subject = header_value(&headers, "subject")
        .ok_or_else(|| Error::Parse("patch is missing a Subject header".to_string()))?;

    let (author_name, author_email) = parse_address(from);
    let author_date = DateTime::parse_from_rfc2822(date.trim())
        .map_err(|e| Error::Parse(format!("invalid Date header {date:?}: {e}")))?
        .with_timezone(&Utc);
    let title = strip_subject_prefix(subject);

    let message = &raw[message_start..];
    let (body, body_appendix, diff_zone) = split_message(message);
    let files = parse_diff(diff_zone)?;

    if files.is_empty() {
        // Cover letter: carries no commit.
        return Ok(None);
    }

    let base_commit_sha = raw
        .lines()
        .find_map(|l| l.strip_prefix("base-commit: "))
        .map(|s| s.trim().to_string());

    let commit_sha = if is_hex_sha(sha_token) {
        sha_token.to_string()
    } else {
        digest::raw_digest(raw)
    };
    let content_sha = digest::content_digest(&author_name, &author_email, &title, &body, &files);

    Ok(Some(ParsedPatch {
        author_name,
        author_email,
        author_date,
        title,
        body,
        body_appendix,
        commit_sha,
        content_sha,
        base_commit_sha,
        raw_text: raw.to_string(),
        files,
    }))
}

/// Collects the RFC-2822-style headers after the mbox separator, unfolding
/// continuation lines. Returns the headers and the byte offset of the message
/// body within `raw`.
fn parse_headers(raw: &str) -> Result<(Vec<(String, String)>, usize)> {
    let mut headers: Vec<(String, String)> = Vec::new();
    let mut offset = 0;
    let mut past_separator = false;

    for line in raw.split_inclusive('\n') {
        let trimmed = line.trim_end_matches('\n');
        if !past_separator {
            past_separator = true;
            offset += line.len();
            continue;
        }
        if trimmed.is_empty() {
            offset += line.len();
            break;
        }
        if (trimmed.starts_with(' ') || trimmed.starts_with('\t')) && !headers.is_empty() {
            let last = headers
                .last_mut()
                .ok_or_else(|| Error::Parse("header continuation without header".to_string()))?;
            last.1.push(' ');
            last.1.push_str(trimmed.trim_start());
        } else if let Some((name, value)) = trimmed.split_once(':') {
            headers.push((name.trim().to_ascii_lowercase(), value.trim().to_string()));
        } else {
            return Err(Error::Parse(format!("malformed header line {trimmed:?}")));
        }
        offset += line.len();
    }

    Ok((headers, offset))
}

fn header_value<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(n, _)| n == name)
        .map(|(_, v)| v.as_str())
}

/// Splits `"Name <addr>"` into its parts. A header without angle brackets is
/// treated as a bare address.
fn parse_address(from: &str) -> (String, String) {
    match (from.rfind('<'), from.rfind('>')) {
        (Some(open), Some(close)) if open < close => {
            let name = from[..open].trim().trim_matches('"').to_string();
            let email = from[open + 1..close].trim().to_string();
            (name, email)
        }
        _ => (String::new(), from.trim().to_string()),
    }
}

/// Drops `[PATCH ...]`-style prefixes from a subject line.
fn strip_subject_prefix(subject: &str) -> String {
    let mut rest = subject.trim();
    while let Some(tail) = rest.strip_prefix('[') {
        let Some(close) = tail.find(']') else { break };
        let tag = &tail[..close];
        if !tag.to_ascii_uppercase().contains("PATCH") {
            break;
        }
        rest = tail[close + 1..].trim_start();
    }
    rest.to_string()
}

/// Splits the message into (commit body, appendix, diff zone). The body ends
/// at the `---` separator; the appendix is the diffstat/notes area between
/// `---` and the first `diff --git`.
fn split_message(message: &str) -> (String, String, &str) {
    let mut body_end = message.len();
    let mut diff_start = message.len();
    let mut dashes_end: Option<usize> = None;

    let mut offset = 0;
    for line in message.split_inclusive('\n') {
        let trimmed = line.trim_end_matches('\n');
        if dashes_end.is_none() && trimmed == "---" {
            body_end = offset;
            dashes_end = Some(offset + line.len());
        }
        if trimmed.starts_with("diff --git ") {
            diff_start = offset;
            if dashes_end.is_none() {
                body_end = offset;
            }
            break;
        }
        offset += line.len();
    }

    let body = message[..body_end].trim().to_string();
    let appendix_start = dashes_end.unwrap_or(diff_start).min(diff_start);
    let body_appendix = message[appendix_start..diff_start].trim().to_string();
    (body, body_appendix, &message[diff_start..])
}

/// Lines within a file section that carry no content identity.
fn is_diff_meta(line: &str) -> bool {
    line.starts_with("index ")
        || line.starts_with("old mode")
        || line.starts_with("new mode")
        || line.starts_with("new file mode")
        || line.starts_with("deleted file mode")
        || line.starts_with("similarity index")
        || line.starts_with("dissimilarity index")
        || line.starts_with("rename from")
        || line.starts_with("rename to")
        || line.starts_with("copy from")
        || line.starts_with("copy to")
        || line.starts_with("--- ")
        || line.starts_with("+++ ")
        || line.starts_with("Binary files")
        || line.starts_with("GIT binary patch")
}

fn parse_diff(zone: &str) -> Result<Vec<FileDiff>> {
    let mut files: Vec<FileDiff> = Vec::new();
    let mut in_hunk = false;

    for line in zone.lines() {
        if line == "-- " || line == "--" {
            // format-patch signature, everything after is the version trailer
            break;
        }
        if let Some(rest) = line.strip_prefix("diff --git ") {
            files.push(FileDiff {
                path: diff_target_path(rest),
                lines: Vec::new(),
            });
            in_hunk = false;
            continue;
        }
        let Some(file) = files.last_mut() else {
            continue;
        };
        if line.starts_with("@@") {
            validate_hunk_header(line)?;
            in_hunk = true;
            continue;
        }
        if is_diff_meta(line) {
            continue;
        }
        if in_hunk
            && (line.is_empty()
                || line.starts_with(' ')
                || line.starts_with('+')
                || line.starts_with('-')
                || line.starts_with('\\'))
        {
            file.lines.push(line.trim_end().to_string());
        }
    }

    Ok(files)
}

/// Extracts the post-image path from the remainder of a `diff --git` line
/// (`a/<path> b/<path>`).
fn diff_target_path(rest: &str) -> String {
    let target = rest.split_whitespace().last().unwrap_or(rest);
    target.strip_prefix("b/").unwrap_or(target).to_string()
}

/// Hunk headers must look like `@@ -l[,n] +l[,n] @@ [context]`.
fn validate_hunk_header(line: &str) -> Result<()> {
    let malformed = || Error::Parse(format!("malformed hunk header {line:?}"));

    let rest = line.strip_prefix("@@ -").ok_or_else(malformed)?;
    let (ranges, _) = rest.split_once(" @@").ok_or_else(malformed)?;
    let (old, new) = ranges.split_once(" +").ok_or_else(malformed)?;
    for range in [old, new] {
        let (start, count) = match range.split_once(',') {
            Some((s, c)) => (s, Some(c)),
            None => (range, None),
        };
        if start.parse::<u64>().is_err() {
            return Err(malformed());
        }
        if let Some(count) = count {
            if count.parse::<u64>().is_err() {
                return Err(malformed());
            }
        }
    }
    Ok(())
}

fn is_hex_sha(token: &str) -> bool {
    token.len() == 40 && token.chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use crate::patch::testdata::{two_patch_stream, COVER_ONLY as COVER, SINGLE};
    use super::*;

    #[test]
    fn parses_a_single_patch() {
        let patches = parse_stream(SINGLE).unwrap();
        assert_eq!(patches.len(), 1);

        let p = &patches[0];
        assert_eq!(p.author_name, "Ada Lovelace");
        assert_eq!(p.author_email, "ada@example.com");
        assert_eq!(p.title, "chore: add torch and create random tensor");
        assert_eq!(p.body, "Pull in torch so we can smoke-test tensor creation.");
        assert_eq!(p.commit_sha, "33c682a1d8cadb791a194b8c2d73d9a2e7395b45");
        assert_eq!(p.files.len(), 1);
        assert_eq!(p.files[0].path, "main.py");
        assert_eq!(
            p.files[0].lines,
            vec!["+import torch".to_string(), "+x = torch.rand(3)".to_string()]
        );
        assert!(p.body_appendix.contains("1 file changed"));
    }

    #[test]
    fn cover_letter_is_dropped() {
        let stream = format!("{COVER}{SINGLE}");
        let patches = parse_stream(&stream).unwrap();
        assert_eq!(patches.len(), 1);
        assert_eq!(patches[0].title, "chore: add torch and create random tensor");
    }

    #[test]
    fn cover_only_stream_yields_no_patches() {
        let patches = parse_stream(COVER).unwrap();
        assert!(patches.is_empty());
    }

    #[test]
    fn empty_stream_is_a_parse_error() {
        assert!(matches!(parse_stream(""), Err(Error::Parse(_))));
        assert!(matches!(parse_stream("   \n \n"), Err(Error::Parse(_))));
    }

    #[test]
    fn stream_without_boundary_is_a_parse_error() {
        assert!(matches!(
            parse_stream("Subject: hello\n\nnot a patch\n"),
            Err(Error::Parse(_))
        ));
    }

    #[test]
    fn missing_header_is_a_parse_error() {
        let broken = SINGLE.replace("Date: Tue, 19 Mar 2024 10:12:00 +0100\n", "");
        assert!(matches!(parse_stream(&broken), Err(Error::Parse(_))));
    }

    #[test]
    fn malformed_hunk_header_is_a_parse_error() {
        let broken = SINGLE.replace("@@ -0,0 +1,2 @@", "@@ -x,0 +1,2 @@");
        assert!(matches!(parse_stream(&broken), Err(Error::Parse(_))));
    }

    #[test]
    fn content_sha_ignores_date_and_index_lines() {
        let reformatted = SINGLE
            .replace("Date: Tue, 19 Mar 2024 10:12:00 +0100", "Date: Wed, 20 Mar 2024 09:00:00 +0100")
            .replace("index e69de29..4b8a1a2 100644", "index 1111111..2222222 100644")
            .replace("33c682a1d8cadb791a194b8c2d73d9a2e7395b45", "44d793b2e9dbec8a2b2a5c9d3e84a0a6f4a6c156");

        let a = parse_stream(SINGLE).unwrap();
        let b = parse_stream(&reformatted).unwrap();
        assert_eq!(a[0].content_sha, b[0].content_sha);
        assert_ne!(a[0].commit_sha, b[0].commit_sha);
    }

    #[test]
    fn content_sha_tracks_hunk_content() {
        let changed = SINGLE.replace("+import torch", "+import torch as th");
        let a = parse_stream(SINGLE).unwrap();
        let b = parse_stream(&changed).unwrap();
        assert_ne!(a[0].content_sha, b[0].content_sha);
    }

    #[test]
    fn parsing_is_idempotent_over_reserialization() {
        let first = parse_stream(SINGLE).unwrap();
        let second = parse_stream(&first[0].raw_text).unwrap();
        assert_eq!(first[0].content_sha, second[0].content_sha);
        assert_eq!(first[0].commit_sha, second[0].commit_sha);
    }

    #[test]
    fn multi_patch_stream_preserves_order() {
        let stream = two_patch_stream();
        let patches = parse_stream(&stream).unwrap();
        assert_eq!(patches.len(), 2);
        assert_eq!(patches[0].title, "chore: add torch and create random tensor");
        assert_eq!(patches[1].title, "feat: normalize tensor");
        assert_ne!(patches[0].content_sha, patches[1].content_sha);
    }

    #[test]
    fn subject_prefixes_are_stripped() {
        assert_eq!(strip_subject_prefix("[PATCH v3 2/5] fix: thing"), "fix: thing");
        assert_eq!(strip_subject_prefix("[RFC PATCH] idea"), "idea");
        assert_eq!(strip_subject_prefix("[weird] keep me"), "[weird] keep me");
    }

    #[test]
    fn body_lines_starting_with_from_do_not_split_the_stream() {
        let with_from = SINGLE.replace(
            "Pull in torch so we can smoke-test tensor creation.",
            "Pull in torch so we can smoke-test tensor creation.\nFrom my testing, this helps.",
        );
        let patches = parse_stream(&with_from).unwrap();
        assert_eq!(patches.len(), 1);
        assert!(patches[0].body.contains("From my testing, this helps."));
    }

    #[test]
    fn base_commit_trailer_is_captured() {
        let with_base = SINGLE.replace(
            "\n--\n",
            "\nbase-commit: f5a3c9d0e1b2a3c4d5e6f708192a3b4c5d6e7f80\n--\n",
        );
        let patches = parse_stream(&with_base).unwrap();
        assert_eq!(
            patches[0].base_commit_sha.as_deref(),
            Some("f5a3c9d0e1b2a3c4d5e6f708192a3b4c5d6e7f80")
        );
    }

    #[test]
    fn invalid_separator_sha_falls_back_to_raw_digest() {
        let no_sha = SINGLE.replace(
            "From 33c682a1d8cadb791a194b8c2d73d9a2e7395b45 ",
            "From mbox ",
        );
        let patches = parse_stream(&no_sha).unwrap();
        assert_eq!(patches[0].commit_sha.len(), 40);
        assert!(patches[0].commit_sha.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
