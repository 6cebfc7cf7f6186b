//! RFC 6901 JSON Pointers.

use std::fmt;

use crate::patch::PatchFailure;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonPointer {
    tokens: Vec<String>,
}

impl JsonPointer {
    pub fn root() -> Self {
        Self { tokens: Vec::new() }
    }

    pub fn parse(raw: &str) -> Result<Self, PatchFailure> {
        if raw.is_empty() {
            return Ok(Self::root());
        }
        let rest = raw
            .strip_prefix('/')
            .ok_or_else(|| PatchFailure::InvalidPointer(raw.to_string()))?;

        // ~1 must be decoded before ~0, otherwise "~01" would become "/".
        let tokens = rest
            .split('/')
            .map(|t| t.replace("~1", "/").replace("~0", "~"))
            .collect();
        Ok(Self { tokens })
    }

    pub fn is_root(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Splits into (parent, last token). `None` for the root.
    pub fn split_last(&self) -> Option<(JsonPointer, &str)> {
        let (last, parent) = self.tokens.split_last()?;
        Some((
            JsonPointer {
                tokens: parent.to_vec(),
            },
            last.as_str(),
        ))
    }

    /// True when `other` lies strictly below `self`.
    pub fn is_proper_prefix_of(&self, other: &JsonPointer) -> bool {
        other.tokens.len() > self.tokens.len() && other.tokens.starts_with(&self.tokens)
    }
}

impl fmt::Display for JsonPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for token in &self.tokens {
            write!(f, "/{}", token.replace('~', "~0").replace('/', "~1"))?;
        }
        Ok(())
    }
}

/// Parses an array index token: decimal, no leading zeros.
pub fn parse_index(token: &str) -> Result<usize, PatchFailure> {
    let well_formed = !token.is_empty()
        && token.bytes().all(|b| b.is_ascii_digit())
        && (token == "0" || !token.starts_with('0'));
    if !well_formed {
        return Err(PatchFailure::InvalidIndex(token.to_string()));
    }
    token
        .parse()
        .map_err(|_| PatchFailure::InvalidIndex(token.to_string()))
}
