//! Line tokenizer for the people and relations files.
//!
//! Grammar: one record per line, fields separated by `,`, no quoting.
//! - people lines have quote characters and lossy-transcoding debris
//!   (U+FFFD) stripped before splitting;
//! - relation lines containing a quote character are malformed.
//!
//! Trailing empty fields are dropped (`"a,b,,"` has two fields), matching how
//! the files have always been split.

use std::io::{self, BufRead};

use thiserror::Error;

pub const PROFILE_FIELDS: usize = 6;
pub const RELATION_FIELDS: usize = 3;

const QUOTES: [char; 2] = ['"', '\''];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("must be comma separated")]
    NotCommaSeparated,
    #[error("has invalid number of parameters (expected {expected}, found {found})")]
    FieldCount { expected: usize, found: usize },
    #[error("contains a quote character")]
    Quoted,
}

/// Iterate over the lines of `reader`, decoding each one lossily.
///
/// Invalid UTF-8 becomes U+FFFD instead of failing the read; a trailing `\r`
/// is removed.
pub fn lines<B: BufRead>(reader: B) -> impl Iterator<Item = io::Result<String>> {
    reader.split(b'\n').map(|bytes| {
        bytes.map(|bytes| {
            let mut line = String::from_utf8_lossy(&bytes).into_owned();
            if line.ends_with('\r') {
                line.pop();
            }
            line
        })
    })
}

/// Split on `,`, trimming fields and dropping trailing empty ones.
pub fn split_fields(line: &str) -> Vec<&str> {
    if !line.contains(',') {
        return vec![line.trim()];
    }
    let mut fields: Vec<&str> = line.split(',').map(str::trim).collect();
    while fields.last().is_some_and(|f| f.is_empty()) {
        fields.pop();
    }
    fields
}

/// Remove characters the people file is known to carry from lossy transcoding,
/// plus quote characters (quoting is not supported).
pub fn clean_profile_line(raw: &str) -> String {
    raw.chars()
        .filter(|c| *c != char::REPLACEMENT_CHARACTER && !QUOTES.contains(c))
        .collect()
}

/// The six trimmed fields of a people record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileFields<'a> {
    pub name: &'a str,
    pub image: &'a str,
    pub status: &'a str,
    pub gender: &'a str,
    pub age: &'a str,
    pub state: &'a str,
}

impl<'a> ProfileFields<'a> {
    /// Tokenize an already-cleaned people line.
    pub fn parse(line: &'a str) -> Result<Self, RecordError> {
        let fields = split_fields(line);
        match fields[..] {
            [_] => Err(RecordError::NotCommaSeparated),
            [name, image, status, gender, age, state] => Ok(Self {
                name,
                image,
                status,
                gender,
                age,
                state,
            }),
            _ => Err(RecordError::FieldCount {
                expected: PROFILE_FIELDS,
                found: fields.len(),
            }),
        }
    }
}

/// The three trimmed fields of a relations record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationFields<'a> {
    pub first: &'a str,
    pub second: &'a str,
    pub kind: &'a str,
}

impl<'a> RelationFields<'a> {
    pub fn parse(line: &'a str) -> Result<Self, RecordError> {
        if line.contains(&QUOTES[..]) {
            return Err(RecordError::Quoted);
        }
        let fields = split_fields(line);
        match fields[..] {
            [first, second, kind] => Ok(Self {
                first,
                second,
                kind,
            }),
            _ => Err(RecordError::FieldCount {
                expected: RELATION_FIELDS,
                found: fields.len(),
            }),
        }
    }
}

/// Best-effort label for a line in diagnostics: its first field.
pub fn leading_field(line: &str) -> &str {
    line.split(',').next().unwrap_or(line).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_drops_trailing_empty_fields_only() {
        assert_eq!(split_fields("a, b ,c"), vec!["a", "b", "c"]);
        assert_eq!(split_fields("a,,c,,"), vec!["a", "", "c"]);
        assert_eq!(split_fields(",a"), vec!["", "a"]);
        assert_eq!(split_fields("solo"), vec!["solo"]);
        assert!(split_fields(",,,").is_empty());
    }

    #[test]
    fn clean_profile_line_strips_quotes_and_replacement_chars() {
        assert_eq!(
            clean_profile_line("\"Anna\",img\u{FFFD}A,'single',F,10,VIC"),
            "Anna,imgA,single,F,10,VIC"
        );
    }

    #[test]
    fn profile_fields_distinguish_missing_commas() {
        assert_eq!(
            ProfileFields::parse("Anna imgA single F 10 VIC"),
            Err(RecordError::NotCommaSeparated)
        );
        assert_eq!(
            ProfileFields::parse("Anna,imgA,single,F,10"),
            Err(RecordError::FieldCount {
                expected: 6,
                found: 5
            })
        );

        let fields = ProfileFields::parse(" Anna , imgA,single,F, 10 ,VIC ").unwrap();
        assert_eq!(fields.name, "Anna");
        assert_eq!(fields.age, "10");
        assert_eq!(fields.state, "VIC");
    }

    #[test]
    fn relation_fields_reject_quotes_before_counting() {
        assert_eq!(
            RelationFields::parse("Anna,Bob,'friends'"),
            Err(RecordError::Quoted)
        );
        assert_eq!(
            RelationFields::parse("Anna,\"Bob\""),
            Err(RecordError::Quoted)
        );
        assert_eq!(
            RelationFields::parse("Anna,Bob"),
            Err(RecordError::FieldCount {
                expected: 3,
                found: 2
            })
        );
        let fields = RelationFields::parse("Anna, Bob ,friends").unwrap();
        assert_eq!(
            fields,
            RelationFields {
                first: "Anna",
                second: "Bob",
                kind: "friends"
            }
        );
    }

    #[test]
    fn lines_decode_lossily_and_strip_cr() {
        let input: &[u8] = b"Anna,x\r\nB\xffob,y\n";
        let decoded: Vec<String> = lines(input).collect::<io::Result<_>>().unwrap();
        assert_eq!(decoded, vec!["Anna,x".to_string(), "B\u{FFFD}ob,y".to_string()]);
    }
}
