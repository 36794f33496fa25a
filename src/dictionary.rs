//! Parses the dictionary file once at startup into a bounded, read-only
//! mapping from index to byte string.

use std::fs;
use std::io;
use std::path::Path;

/// Longest payload read from between the first and last `"` before
/// decoding.
const PAYLOAD_READ_CAP: usize = 1024;

/// Longest decoded entry stored.
const ENTRY_CAPACITY: usize = 256;

/// Dictionary entries are capped so a malformed or hostile file cannot grow
/// memory use unbounded; no fixed bound is load-bearing elsewhere, so a
/// generous but finite value is chosen here and recorded as an
/// open-question decision in DESIGN.md.
const MAX_DICT_ENTRIES: usize = 16_384;

/// One decoded dictionary entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictEntry {
    pub bytes: Vec<u8>,
}

impl DictEntry {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Read-only, load-once dictionary.
#[derive(Debug, Default, Clone)]
pub struct Dictionary {
    entries: Vec<DictEntry>,
}

impl Dictionary {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&DictEntry> {
        self.entries.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DictEntry> {
        self.entries.iter()
    }
}

/// Loads a dictionary file. Only an I/O failure opening/reading the file
/// itself is an error; malformed individual lines are logged and skipped.
pub fn load_dictionary(path: impl AsRef<Path>) -> io::Result<Dictionary> {
    let contents = fs::read_to_string(path.as_ref())?;
    let mut entries = Vec::new();

    for (lineno, line) in contents.lines().enumerate() {
        if entries.len() >= MAX_DICT_ENTRIES {
            crate::warn!(
                "dictionary file {}: maximum entry count ({MAX_DICT_ENTRIES}) reached, stopping load",
                path.as_ref().display()
            );
            break;
        }
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match parse_dictionary_line(line) {
            Some(bytes) => entries.push(DictEntry { bytes }),
            None => {
                crate::warn!(
                    "dictionary file {}: skipping malformed line {}",
                    path.as_ref().display(),
                    lineno + 1
                );
            }
        }
    }

    Ok(Dictionary { entries })
}

/// Parses one dictionary line, returning the decoded payload or `None` if
/// the line is malformed (no pair of `"` delimiters, or an empty payload).
fn parse_dictionary_line(line: &str) -> Option<Vec<u8>> {
    let bytes = line.as_bytes();
    let first = bytes.iter().position(|&b| b == b'"')?;
    let last = bytes.iter().rposition(|&b| b == b'"')?;
    if first >= last {
        return None;
    }
    let mut payload = &bytes[first + 1..last];
    if payload.len() > PAYLOAD_READ_CAP {
        payload = &payload[..PAYLOAD_READ_CAP];
    }
    let decoded = decode_cstring_escapes(payload);
    if decoded.is_empty() {
        return None;
    }
    let mut decoded = decoded;
    decoded.truncate(ENTRY_CAPACITY);
    Some(decoded)
}

/// Decodes `\\`, `\"`, `\xHH`, `\n`, `\r`, `\t`, `\0`; any other byte
/// (including an unrecognized escape) is passed through literally.
fn decode_cstring_escapes(input: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(input.len());
    let mut i = 0;
    while i < input.len() {
        if input[i] == b'\\' && i + 1 < input.len() {
            match input[i + 1] {
                b'\\' => {
                    out.push(b'\\');
                    i += 2;
                }
                b'"' => {
                    out.push(b'"');
                    i += 2;
                }
                b'n' => {
                    out.push(b'\n');
                    i += 2;
                }
                b'r' => {
                    out.push(b'\r');
                    i += 2;
                }
                b't' => {
                    out.push(b'\t');
                    i += 2;
                }
                b'0' => {
                    out.push(0u8);
                    i += 2;
                }
                b'x' if i + 3 < input.len() => {
                    let hex = std::str::from_utf8(&input[i + 2..i + 4]).ok();
                    match hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                        Some(byte) => {
                            out.push(byte);
                            i += 4;
                        }
                        None => {
                            out.push(input[i]);
                            i += 1;
                        }
                    }
                }
                other => {
                    out.push(input[i]);
                    out.push(other);
                    i += 2;
                }
            }
        } else {
            out.push(input[i]);
            i += 1;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_dict(contents: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        f
    }

    #[test]
    fn parses_the_documented_scenario() {
        let contents = "# comment\n\"\"\n\"abc\"\nkw=\"de\\x41f\"\n\"\\n\"\nbroken\n";
        let f = write_dict(contents);
        let dict = load_dictionary(f.path()).unwrap();
        let payloads: Vec<&[u8]> = dict.iter().map(|e| e.bytes.as_slice()).collect();
        assert_eq!(payloads, vec![b"abc" as &[u8], b"deAf", b"\n"]);
    }

    #[test]
    fn blank_and_comment_lines_are_silently_skipped() {
        let f = write_dict("# a comment\n\n\"ok\"\n");
        let dict = load_dictionary(f.path()).unwrap();
        assert_eq!(dict.len(), 1);
        assert_eq!(dict.get(0).unwrap().bytes, b"ok");
    }

    #[test]
    fn single_quote_line_is_malformed() {
        let f = write_dict("\"unterminated\n");
        let dict = load_dictionary(f.path()).unwrap();
        assert!(dict.is_empty());
    }

    #[test]
    fn entries_are_truncated_to_capacity() {
        let long = "x".repeat(ENTRY_CAPACITY + 50);
        let f = write_dict(&format!("\"{long}\"\n"));
        let dict = load_dictionary(f.path()).unwrap();
        assert_eq!(dict.get(0).unwrap().len(), ENTRY_CAPACITY);
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(load_dictionary("/no/such/dictionary/file").is_err());
    }

    #[test]
    fn hex_escape_decodes_correctly() {
        assert_eq!(decode_cstring_escapes(b"\\x41\\x42"), b"AB");
    }

    #[test]
    fn all_documented_escapes_decode() {
        assert_eq!(decode_cstring_escapes(b"\\n\\r\\t\\0\\\\\\\""), b"\n\r\t\0\\\"");
    }
}
