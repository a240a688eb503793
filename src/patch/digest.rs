use sha2::{Digest, Sha256};

use super::FileDiff;

/// Canonical textual form of a patch's diff: per-file sections of
/// `"\n@@ " + path + "\n"` followed by the file's hunk lines. Hunk headers,
/// index lines and mode lines are already stripped by the parser, and every
/// line arrives LF-terminated with trailing whitespace removed.
pub fn canonical_diff(files: &[FileDiff]) -> String {
    let mut out = String::new();
    for file in files {
        out.push_str(&file_text(file));
    }
    out
}

/// Canonical text of a single file section.
pub fn file_text(file: &FileDiff) -> String {
    let mut out = String::with_capacity(file.lines.iter().map(|l| l.len() + 1).sum::<usize>() + file.path.len() + 5);
    out.push_str("\n@@ ");
    out.push_str(&file.path);
    out.push('\n');
    for line in &file.lines {
        out.push_str(line);
        out.push('\n');
    }
    out
}

/// Content identity of a patch: a digest over author identity, title, body
/// and hunk contents. Author date, the mbox `From ` line and index/hash lines
/// are excluded, so reformatting or rebasing without semantic change keeps
/// the digest stable.
pub fn content_digest(
    author_name: &str,
    author_email: &str,
    title: &str,
    body: &str,
    files: &[FileDiff],
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(author_name.as_bytes());
    hasher.update(b"\n");
    hasher.update(author_email.as_bytes());
    hasher.update(b"\n");
    hasher.update(title.as_bytes());
    hasher.update(b"\n");
    hasher.update(body.as_bytes());
    hasher.update(canonical_diff(files).as_bytes());
    hex::encode(hasher.finalize())
}

/// Fallback commit identity when the mbox separator carries no object name:
/// a digest of the full raw text, truncated to git's 40-hex width.
pub fn raw_digest(raw: &str) -> String {
    let mut digest = hex::encode(Sha256::digest(raw.as_bytes()));
    digest.truncate(40);
    digest
}
