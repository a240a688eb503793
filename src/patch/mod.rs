//! Mailbox parsing and patch content identity.
//!
//! A patch stream is one or more `git format-patch` patches in mbox form,
//! optionally led by a cover letter. Parsing is pure: it never touches the
//! store and never runs git.

mod digest;
mod parser;
#[cfg(test)]
pub(crate) mod testdata;

pub use digest::{canonical_diff, content_digest, file_text, raw_digest};
pub use parser::{parse_stream, FileDiff, ParsedPatch};
