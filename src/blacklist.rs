//! Parses the stack-hash blacklist file once at startup: one unsigned
//! 64-bit integer per line, decimal or `0x`-prefixed hex, required to be
//! ascending.

use std::fs;
use std::path::Path;

use crate::error::CorpusError;

/// Ascending-sorted sequence of stack hashes.
#[derive(Debug, Default, Clone)]
pub struct Blacklist {
    entries: Vec<u64>,
}

impl Blacklist {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, hash: u64) -> bool {
        self.entries.binary_search(&hash).is_ok()
    }

    pub fn entries(&self) -> &[u64] {
        &self.entries
    }
}

/// Loads a blacklist file, returning an error if any entry breaks ascending
/// order or if the file is empty after loading.
pub fn load_blacklist(path: impl AsRef<Path>) -> Result<Blacklist, CorpusError> {
    let contents = fs::read_to_string(path.as_ref()).map_err(|source| {
        CorpusError::InputDirUnavailable {
            path: path.as_ref().to_path_buf(),
            source,
        }
    })?;

    let mut entries = Vec::new();
    for (lineno, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let value = match parse_auto_base_u64(line) {
            Some(v) => v,
            None => {
                crate::warn!("blacklist: skipping unparseable line {}: {line:?}", lineno + 1);
                continue;
            }
        };
        if let Some(&prev) = entries.last() {
            if prev > value {
                return Err(CorpusError::BlacklistNotSorted { line: lineno + 1 });
            }
        }
        entries.push(value);
    }

    if entries.is_empty() {
        return Err(CorpusError::BlacklistEmpty);
    }

    Ok(Blacklist { entries })
}

/// Parses a decimal integer, or a `0x`/`0X`-prefixed hexadecimal one.
fn parse_auto_base_u64(text: &str) -> Option<u64> {
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16).ok()
    } else {
        text.parse::<u64>().ok()
    }
}

pub(crate) fn parse_auto_base_u64_for_tests(text: &str) -> Option<u64> {
    parse_auto_base_u64(text)
}
