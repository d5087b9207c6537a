//! Delta paths in the `root['a']['b']` notation used by vestigial files.

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

const ROOT: &str = "root";

/// A path of object keys from the root of a tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TreePath(Vec<String>);

impl TreePath {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn child(&self, key: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(key.to_string());
        Self(segments)
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Split into the parent path and the final key. `None` for the root.
    pub fn split_last(&self) -> Option<(&[String], &str)> {
        self.0
            .split_last()
            .map(|(last, parent)| (parent, last.as_str()))
    }
}

impl From<Vec<String>> for TreePath {
    fn from(segments: Vec<String>) -> Self {
        Self(segments)
    }
}

impl fmt::Display for TreePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", ROOT)?;
        for segment in &self.0 {
            let segment = segment.replace('\\', "\\\\");
            if segment.contains('\'') && !segment.contains('"') {
                write!(f, "[\"{}\"]", segment)?;
            } else {
                write!(f, "['{}']", segment.replace('\'', "\\'"))?;
            }
        }
        Ok(())
    }
}

impl FromStr for TreePath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = |reason: &str| Error::DeltaPath {
            path: s.to_string(),
            reason: reason.to_string(),
        };

        let mut rest = s
            .trim()
            .strip_prefix(ROOT)
            .ok_or_else(|| invalid("must start with 'root'"))?;
        let mut segments = Vec::new();

        while !rest.is_empty() {
            rest = rest
                .strip_prefix('[')
                .ok_or_else(|| invalid("expected '['"))?;

            let mut chars = rest.char_indices();
            let quote = match chars.next() {
                Some((_, q @ ('\'' | '"'))) => q,
                Some(_) => return Err(invalid("only quoted object keys are supported")),
                None => return Err(invalid("unterminated segment")),
            };

            let mut segment = String::new();
            let mut escaped = false;
            let mut end = None;
            for (idx, c) in chars {
                if escaped {
                    segment.push(c);
                    escaped = false;
                } else if c == '\\' {
                    escaped = true;
                } else if c == quote {
                    end = Some(idx);
                    break;
                } else {
                    segment.push(c);
                }
            }

            let end = end.ok_or_else(|| invalid("unterminated quote"))?;
            rest = rest[end + quote.len_utf8()..]
                .strip_prefix(']')
                .ok_or_else(|| invalid("expected ']'"))?;
            segments.push(segment);
        }

        Ok(Self(segments))
    }
}
