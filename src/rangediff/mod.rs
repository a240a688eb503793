//! Range-diff: aligns two ordered patch sequences and classifies each
//! position as equal, modified, added or removed.
//!
//! Exact matches are paired by `content_sha`; the remainder is paired by a
//! cost-minimizing assignment over canonical-diff edit distances, so a
//! reworded or rebased commit still lines up with its counterpart.

use pathfinding::matrix::Matrix;
use pathfinding::prelude::kuhn_munkres_min;
use similar::{ChangeTag, TextDiff};

use crate::error::Result;
use crate::patch::{self, FileDiff, ParsedPatch};
use crate::types::Patch;

/// Sentinel cost larger than any realistic diff distance. Cells carrying it
/// are never profitable to pick over a creation/deletion pairing.
const COST_MAX: i64 = 65536;

/// Default creation factor in percent. Lower values prefer treating commits
/// as added/removed; higher values prefer matching dissimilar commits.
pub const DEFAULT_CREATION_FACTOR: u32 = 60;

/// One commit as seen by the engine: identity plus canonical per-file diffs.
#[derive(Debug, Clone)]
pub struct DiffCommit {
    pub commit_sha: String,
    pub content_sha: String,
    pub title: String,
    pub files: Vec<FileDiff>,
}

impl DiffCommit {
    pub fn from_parsed(p: &ParsedPatch) -> Self {
        Self {
            commit_sha: p.commit_sha.clone(),
            content_sha: p.content_sha.clone(),
            title: p.title.clone(),
            files: p.files.clone(),
        }
    }

    /// Rebuilds the canonical file sections of a stored patch from its raw
    /// mbox text.
    pub fn from_patch(p: &Patch) -> Result<Self> {
        let parsed = patch::parse_stream(&p.raw_text)?;
        let files = parsed.into_iter().next().map(|p| p.files).unwrap_or_default();
        Ok(Self {
            commit_sha: p.commit_sha.clone(),
            content_sha: p.content_sha.clone(),
            title: p.title.clone(),
            files,
        })
    }

    fn canonical_text(&self) -> String {
        patch::canonical_diff(&self.files)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Equal,
    Modified,
    Added,
    Removed,
}

impl EntryKind {
    const fn symbol(self) -> char {
        match self {
            EntryKind::Equal => '=',
            EntryKind::Modified => '!',
            EntryKind::Added => '>',
            EntryKind::Removed => '<',
        }
    }
}

/// One output row of a range-diff. Positions are 1-based.
#[derive(Debug, Clone)]
pub struct RangeEntry {
    pub kind: EntryKind,
    pub old: Option<(usize, String)>,
    pub new: Option<(usize, String)>,
    pub title: String,
    /// Body diff for modified pairs, one section per shared filename.
    pub inner: Option<String>,
}

impl RangeEntry {
    pub fn header(&self) -> String {
        fn side(slot: &Option<(usize, String)>) -> String {
            match slot {
                Some((num, sha)) => {
                    let short = &sha[..sha.len().min(7)];
                    format!("{num}:  {short}")
                }
                None => "-:  -------".to_string(),
            }
        }
        format!(
            "{} {} {} {}\n",
            side(&self.old),
            self.kind.symbol(),
            side(&self.new),
            self.title
        )
    }
}

/// Aligns `a` (the older patchset) with `b` (the newer one).
///
/// Deterministic: ties in the assignment break row-major, and emission walks
/// both sequences in their original order.
pub fn range_diff(a: &[DiffCommit], b: &[DiffCommit]) -> Vec<RangeEntry> {
    range_diff_with_factor(a, b, DEFAULT_CREATION_FACTOR)
}

pub fn range_diff_with_factor(
    a: &[DiffCommit],
    b: &[DiffCommit],
    creation_factor: u32,
) -> Vec<RangeEntry> {
    let m = a.len();
    let n = b.len();

    let mut a_match: Vec<Option<usize>> = vec![None; m];
    let mut b_match: Vec<Option<usize>> = vec![None; n];

    // Pass 1: exact content matches. content_sha is unique within a
    // patchset, so first-unmatched pairing is well-defined.
    for (j, bj) in b.iter().enumerate() {
        for (i, ai) in a.iter().enumerate() {
            if a_match[i].is_none() && ai.content_sha == bj.content_sha {
                a_match[i] = Some(j);
                b_match[j] = Some(i);
                break;
            }
        }
    }

    // Pass 2: cost-minimizing assignment over the rest.
    let unmatched_left = a_match.iter().any(Option::is_none);
    let unmatched_right = b_match.iter().any(Option::is_none);
    if m > 0 && n > 0 && (unmatched_left || unmatched_right) {
        fuzzy_match(a, b, creation_factor, &mut a_match, &mut b_match);
    }

    emit(a, b, &a_match, &b_match)
}

fn fuzzy_match(
    a: &[DiffCommit],
    b: &[DiffCommit],
    creation_factor: u32,
    a_match: &mut [Option<usize>],
    b_match: &mut [Option<usize>],
) {
    let m = a.len();
    let n = b.len();
    let size = m + n;

    let a_texts: Vec<String> = a.iter().map(DiffCommit::canonical_text).collect();
    let b_texts: Vec<String> = b.iter().map(DiffCommit::canonical_text).collect();

    let mut matrix = Matrix::new(size, size, 0i64);
    for i in 0..size {
        for j in 0..size {
            let cost = match (i < m, j < n) {
                (true, true) => {
                    if a_match[i] == Some(j) {
                        0
                    } else if a_match[i].is_none() && b_match[j].is_none() {
                        diff_cost(&a_texts[i], &b_texts[j]).min(COST_MAX - 1)
                    } else {
                        COST_MAX
                    }
                }
                // Creation rows: the price of calling b[j] a new commit.
                (false, true) => {
                    if b_match[j].is_none() {
                        creation_cost(&b_texts[j], creation_factor)
                    } else {
                        COST_MAX
                    }
                }
                // Deletion columns, symmetric.
                (true, false) => {
                    if a_match[i].is_none() {
                        creation_cost(&a_texts[i], creation_factor)
                    } else {
                        COST_MAX
                    }
                }
                (false, false) => 0,
            };
            matrix[(i, j)] = cost;
        }
    }

    let (_, assignment) = kuhn_munkres_min(&matrix);

    for (i, &j) in assignment.iter().enumerate().take(m) {
        if j < n && a_match[i].is_none() && b_match[j].is_none() {
            a_match[i] = Some(j);
            b_match[j] = Some(i);
        }
    }
}

/// Edit distance between two canonical diffs: the number of changed lines in
/// a line-oriented Myers diff.
fn diff_cost(left: &str, right: &str) -> i64 {
    TextDiff::from_lines(left, right)
        .iter_all_changes()
        .filter(|c| c.tag() != ChangeTag::Equal)
        .count() as i64
}

fn creation_cost(text: &str, creation_factor: u32) -> i64 {
    let lines = text.lines().count() as i64;
    (i64::from(creation_factor) * lines / 100).min(COST_MAX - 1)
}

fn emit(
    a: &[DiffCommit],
    b: &[DiffCommit],
    a_match: &[Option<usize>],
    b_match: &[Option<usize>],
) -> Vec<RangeEntry> {
    let m = a.len();
    let n = b.len();
    let mut out = Vec::with_capacity(m.max(n));
    let mut shown = vec![false; m];
    let mut i = 0;
    let mut j = 0;

    while i < m || j < n {
        while i < m && shown[i] {
            i += 1;
        }

        // A removal at the front of the left side goes out before the next
        // right-hand entry, preserving left order.
        if i < m && a_match[i].is_none() {
            out.push(RangeEntry {
                kind: EntryKind::Removed,
                old: Some((i + 1, a[i].commit_sha.clone())),
                new: None,
                title: a[i].title.clone(),
                inner: None,
            });
            shown[i] = true;
            continue;
        }

        if j >= n {
            if i >= m {
                break;
            }
            // Matched left-overs whose partner was already emitted.
            shown[i] = true;
            continue;
        }

        match b_match[j] {
            None => {
                out.push(RangeEntry {
                    kind: EntryKind::Added,
                    old: None,
                    new: Some((j + 1, b[j].commit_sha.clone())),
                    title: b[j].title.clone(),
                    inner: None,
                });
            }
            Some(ai) => {
                let equal = a[ai].content_sha == b[j].content_sha;
                out.push(RangeEntry {
                    kind: if equal { EntryKind::Equal } else { EntryKind::Modified },
                    old: Some((ai + 1, a[ai].commit_sha.clone())),
                    new: Some((j + 1, b[j].commit_sha.clone())),
                    title: b[j].title.clone(),
                    inner: if equal { None } else { Some(inner_diff(&a[ai], &b[j])) },
                });
                shown[ai] = true;
            }
        }
        j += 1;
    }

    out
}

/// Body diff for a modified pair: a line diff of canonical file texts, one
/// section per filename shared by both commits.
fn inner_diff(old: &DiffCommit, new: &DiffCommit) -> String {
    let mut out = String::new();
    for file in &new.files {
        let Some(old_file) = old.files.iter().find(|f| f.path == file.path) else {
            continue;
        };
        let left = patch::file_text(old_file);
        let right = patch::file_text(file);
        if left == right {
            continue;
        }
        out.push_str(&format!("    @@ {}\n", file.path));
        let diff = TextDiff::from_lines(left.as_str(), right.as_str());
        for change in diff.iter_all_changes() {
            let sign = match change.tag() {
                ChangeTag::Delete => '-',
                ChangeTag::Insert => '+',
                ChangeTag::Equal => ' ',
            };
            let value = change.value();
            let line = value.strip_suffix('\n').unwrap_or(value);
            if line.starts_with("@@ ") {
                continue;
            }
            out.push_str(&format!("    {sign}{line}\n"));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn commit(sha: &str, content: &str, title: &str, lines: &[&str]) -> DiffCommit {
        DiffCommit {
            commit_sha: sha.to_string(),
            content_sha: content.to_string(),
            title: title.to_string(),
            files: vec![FileDiff {
                path: "main.py".to_string(),
                lines: lines.iter().map(|s| s.to_string()).collect(),
            }],
        }
    }

    #[test]
    fn identical_sequences_are_all_equal() {
        let a = vec![
            commit("33c682a1d8ca", "c1", "one", &["+alpha"]),
            commit("9f2b1c3d4e5f", "c2", "two", &["+beta"]),
        ];
        let out = range_diff(&a, &a);
        assert_eq!(out.len(), 2);
        for (idx, entry) in out.iter().enumerate() {
            assert_eq!(entry.kind, EntryKind::Equal);
            assert_eq!(entry.old.as_ref().unwrap().0, idx + 1);
            assert_eq!(entry.new.as_ref().unwrap().0, idx + 1);
        }
    }

    #[test]
    fn empty_left_side_is_all_added() {
        let b = vec![commit("33c682a1d8ca", "c1", "one", &["+alpha"])];
        let out = range_diff(&[], &b);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].kind, EntryKind::Added);
        assert!(out[0].header().starts_with("-:  ------- > 1:  33c682a"));
    }

    #[test]
    fn empty_right_side_is_all_removed() {
        let a = vec![commit("33c682a1d8ca", "c1", "one", &["+alpha"])];
        let out = range_diff(&a, &[]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].kind, EntryKind::Removed);
        assert!(out[0].header().starts_with("1:  33c682a < -:  -------"));
    }

    #[test]
    fn equal_header_format() {
        let a = vec![commit(
            "33c682a1d8cadb791a194b8c2d73d9a2e7395b45",
            "c1",
            "chore: add torch and create random tensor",
            &["+import torch"],
        )];
        let b = vec![commit(
            "1668484d1f2b2d3ca8d2a5e54b0c9d8e7f6a5b4c",
            "c1",
            "chore: add torch and create random tensor",
            &["+import torch"],
        )];
        let out = range_diff(&a, &b);
        assert_eq!(out.len(), 1);
        assert_eq!(
            out[0].header(),
            "1:  33c682a = 1:  1668484 chore: add torch and create random tensor\n"
        );
    }

    #[test]
    fn removed_commit_precedes_surviving_pair() {
        // Left has an extra leading commit; right keeps only the second one.
        let a = vec![
            commit("33c682a1d8ca", "c1", "dropped", &["+alpha"]),
            commit("9f2b1c3d4e5f", "c2", "kept", &["+beta"]),
        ];
        let b = vec![commit("1668484d1f2b", "c2", "kept", &["+beta"])];
        let out = range_diff(&a, &b);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].kind, EntryKind::Removed);
        assert!(out[0].header().starts_with("1:  33c682a < -:  "));
        assert_eq!(out[1].kind, EntryKind::Equal);
    }

    #[test]
    fn added_commit_lands_at_its_position() {
        let a = vec![
            commit("33c682a1d8ca", "c1", "one", &["+alpha"]),
            commit("9f2b1c3d4e5f", "c2", "two", &["+beta"]),
        ];
        let mut b = a.clone();
        b.push(commit("aabbccddeeff", "c3", "three", &["+gamma"]));
        let out = range_diff(&a, &b);
        assert_eq!(out.len(), 3);
        assert_eq!(out[2].kind, EntryKind::Added);
        assert!(out[2].header().starts_with("-:  ------- > 3:  "));
    }

    #[test]
    fn reworded_commit_is_matched_as_modified() {
        let a = vec![commit(
            "33c682a1d8ca",
            "c1",
            "fix: handle nulls",
            &["+if x is None:", "+    return 0", "+return x"],
        )];
        let b = vec![commit(
            "1668484d1f2b",
            "c2",
            "fix: handle nulls properly",
            &["+if x is None:", "+    return 0", "+return int(x)"],
        )];
        let out = range_diff(&a, &b);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].kind, EntryKind::Modified);
        let inner = out[0].inner.as_deref().unwrap();
        assert!(inner.contains("@@ main.py"));
        assert!(inner.contains("-+return x"));
        assert!(inner.contains("++return int(x)"));
    }

    #[test]
    fn dissimilar_commits_become_add_and_remove() {
        let a = vec![commit("33c682a1d8ca", "c1", "docs", &["+totally unrelated"])];
        let b = vec![commit(
            "1668484d1f2b",
            "c2",
            "feat",
            &["+alpha", "+beta", "+gamma", "+delta", "+epsilon", "+zeta"],
        )];
        // 6 changed lines on one side, 1 on the other: cost of matching (7)
        // exceeds the creation costs (3 + 0), so no pairing happens.
        let out = range_diff(&a, &b);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].kind, EntryKind::Removed);
        assert_eq!(out[1].kind, EntryKind::Added);
    }

    #[test]
    fn reordered_equal_commits_keep_right_order() {
        let a = vec![
            commit("33c682a1d8ca", "c1", "one", &["+alpha"]),
            commit("9f2b1c3d4e5f", "c2", "two", &["+beta"]),
        ];
        let b = vec![a[1].clone(), a[0].clone()];
        let out = range_diff(&a, &b);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].kind, EntryKind::Equal);
        assert_eq!(out[0].old.as_ref().unwrap().0, 2);
        assert_eq!(out[0].new.as_ref().unwrap().0, 1);
        assert_eq!(out[1].old.as_ref().unwrap().0, 1);
        assert_eq!(out[1].new.as_ref().unwrap().0, 2);
    }
}
