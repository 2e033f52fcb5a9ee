//! Parses `git status --porcelain=v1 --branch` output into `FileChange` records.
//!
//! Each entry line is `XY PATH` or, for renames and copies, `XY ORIG -> PATH`,
//! where `X` is the index (staged) status and `Y` the worktree (unstaged) status.
//! Paths with unusual characters arrive C-quoted and are unquoted here.

use crate::models::{FileChange, FileChangeStatus};
#[cfg(feature = "serde")]
use serde::Serialize;
use std::fmt;
use tracing::warn;

/// Single-letter porcelain codes and the status each one maps to.
/// A space means "no change on this side".
const STATUS_CODES: [(char, Option<FileChangeStatus>); 8] = [
    (' ', None),
    ('M', Some(FileChangeStatus::Modified)),
    ('T', Some(FileChangeStatus::Modified)),
    ('A', Some(FileChangeStatus::Added)),
    ('D', Some(FileChangeStatus::Deleted)),
    ('R', Some(FileChangeStatus::Renamed)),
    ('C', Some(FileChangeStatus::Added)),
    ('U', Some(FileChangeStatus::Modified)),
];

const UNTRACKED_CODE: &str = "??";
const IGNORED_CODE: &str = "!!";
const BRANCH_HEADER: &str = "## ";
const RENAME_SEPARATOR: &str = " -> ";

/// A status line that could not be understood. The line is skipped; the rest of
/// the output is still parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct ParseAnomaly {
    /// 1-based line number within the status output.
    pub line_number: usize,
    pub line: String,
    pub reason: String,
}

impl fmt::Display for ParseAnomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {} ({:?})", self.line_number, self.reason, self.line)
    }
}

/// Everything read from one status invocation.
#[derive(Debug, Clone, Default)]
pub struct ParsedStatus {
    pub branch: Option<String>,
    pub changes: Vec<FileChange>,
    pub anomalies: Vec<ParseAnomaly>,
}

/// Parses porcelain v1 status output. Empty output yields no changes.
pub fn parse_porcelain(output: &str) -> ParsedStatus {
    let mut parsed = ParsedStatus::default();

    for (index, raw_line) in output.lines().enumerate() {
        let line = raw_line.trim_end_matches('\r');
        if line.is_empty() {
            continue;
        }

        if let Some(header) = line.strip_prefix(BRANCH_HEADER) {
            parsed.branch = parse_branch_header(header);
            continue;
        }

        match parse_entry(line) {
            Ok(Some(change)) => parsed.changes.push(change),
            Ok(None) => {}
            Err(reason) => {
                let anomaly = ParseAnomaly {
                    line_number: index + 1,
                    line: line.to_string(),
                    reason: reason.to_string(),
                };
                warn!(%anomaly, "skipping unrecognized status line");
                parsed.anomalies.push(anomaly);
            }
        }
    }

    parsed
}

/// Looks up a single status letter. `None` means the letter is not a known code.
fn lookup_code(code: char) -> Option<Option<FileChangeStatus>> {
    STATUS_CODES
        .iter()
        .find(|(letter, _)| *letter == code)
        .map(|(_, status)| *status)
}

/// Parses one entry line. `Ok(None)` is a recognized line that produces no record.
fn parse_entry(line: &str) -> Result<Option<FileChange>, &'static str> {
    let code = line.get(..2).ok_or("line too short for a status code")?;
    let rest = line
        .get(2..)
        .and_then(|rest| rest.strip_prefix(' '))
        .filter(|rest| !rest.is_empty())
        .ok_or("missing path after status code")?;

    if code == IGNORED_CODE {
        return Ok(None);
    }
    if code == UNTRACKED_CODE {
        let path = parse_path(rest)?;
        return Ok(Some(FileChange::new(
            &path,
            Some(FileChangeStatus::Untracked),
            None,
        )));
    }

    let mut letters = code.chars();
    let (index_code, worktree_code) = match (letters.next(), letters.next()) {
        (Some(x), Some(y)) => (x, y),
        _ => return Err("line too short for a status code"),
    };
    let staged = lookup_code(index_code).ok_or("unknown index status code")?;
    let unstaged = lookup_code(worktree_code).ok_or("unknown worktree status code")?;

    if staged.is_none() && unstaged.is_none() {
        return Ok(None);
    }

    let two_paths = [index_code, worktree_code]
        .iter()
        .any(|code| matches!(code, 'R' | 'C'));

    if two_paths {
        let (original, path) = parse_rename_paths(rest)?;
        Ok(Some(
            FileChange::new(&path, unstaged, staged).with_original_path(&original),
        ))
    } else {
        let path = parse_path(rest)?;
        Ok(Some(FileChange::new(&path, unstaged, staged)))
    }
}

/// Splits `ORIG -> PATH` where either side may be quoted.
fn parse_rename_paths(rest: &str) -> Result<(String, String), &'static str> {
    if rest.starts_with('"') {
        let (original, remainder) = unquote(rest)?;
        let new_raw = remainder
            .strip_prefix(RENAME_SEPARATOR)
            .ok_or("rename entry without a target path")?;
        Ok((original, parse_path(new_raw)?))
    } else {
        let (original, new_raw) = rest
            .split_once(RENAME_SEPARATOR)
            .ok_or("rename entry without a target path")?;
        Ok((original.to_string(), parse_path(new_raw)?))
    }
}

/// Returns a single path, unquoting it if needed.
fn parse_path(raw: &str) -> Result<String, &'static str> {
    if raw.starts_with('"') {
        let (path, remainder) = unquote(raw)?;
        if !remainder.is_empty() {
            return Err("unexpected text after quoted path");
        }
        Ok(path)
    } else {
        Ok(raw.to_string())
    }
}

/// Decodes a C-style quoted string starting at `raw[0] == '"'`.
/// Returns the decoded value and whatever follows the closing quote.
fn unquote(raw: &str) -> Result<(String, &str), &'static str> {
    let body = raw.strip_prefix('"').ok_or("expected opening quote")?;
    let bytes = body.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'"' => {
                let value = String::from_utf8_lossy(&decoded).into_owned();
                return Ok((value, &body[i + 1..]));
            }
            b'\\' => {
                let escaped = *bytes.get(i + 1).ok_or("dangling escape in quoted path")?;
                i += 2;
                match escaped {
                    b'a' => decoded.push(0x07),
                    b'b' => decoded.push(0x08),
                    b't' => decoded.push(b'\t'),
                    b'n' => decoded.push(b'\n'),
                    b'v' => decoded.push(0x0b),
                    b'f' => decoded.push(0x0c),
                    b'r' => decoded.push(b'\r'),
                    b'"' | b'\\' => decoded.push(escaped),
                    b'0'..=b'7' => {
                        let octal = bytes.get(i - 1..i + 2).ok_or("truncated octal escape")?;
                        let octal = std::str::from_utf8(octal).map_err(|_| "invalid octal escape")?;
                        let value = u8::from_str_radix(octal, 8).map_err(|_| "invalid octal escape")?;
                        decoded.push(value);
                        i += 2;
                    }
                    _ => return Err("unknown escape in quoted path"),
                }
            }
            byte => {
                decoded.push(byte);
                i += 1;
            }
        }
    }

    Err("unterminated quoted path")
}

/// Reads the branch out of a `## ` header line.
fn parse_branch_header(header: &str) -> Option<String> {
    if header.starts_with("HEAD (no branch)") {
        return None;
    }

    let header = header
        .strip_prefix("No commits yet on ")
        .or_else(|| header.strip_prefix("Initial commit on "))
        .unwrap_or(header);

    let branch = header
        .split("...")
        .next()
        .and_then(|name| name.split_whitespace().next())
        .filter(|name| !name.is_empty())?;

    Some(branch.to_string())
}
