use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::patch::pointer::JsonPointer;
use crate::patch::{PatchError, PatchFailure};

/// One RFC 6902 operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum PatchOperation {
    Add { path: String, value: Value },
    Remove { path: String },
    Replace { path: String, value: Value },
    Move { from: String, path: String },
    Copy { from: String, path: String },
    Test { path: String, value: Value },
}

impl PatchOperation {
    pub fn name(&self) -> &'static str {
        match self {
            PatchOperation::Add { .. } => "add",
            PatchOperation::Remove { .. } => "remove",
            PatchOperation::Replace { .. } => "replace",
            PatchOperation::Move { .. } => "move",
            PatchOperation::Copy { .. } => "copy",
            PatchOperation::Test { .. } => "test",
        }
    }

    pub fn path(&self) -> &str {
        match self {
            PatchOperation::Add { path, .. }
            | PatchOperation::Remove { path }
            | PatchOperation::Replace { path, .. }
            | PatchOperation::Move { path, .. }
            | PatchOperation::Copy { path, .. }
            | PatchOperation::Test { path, .. } => path,
        }
    }

    /// Resolves `path` (and `from`) relative to `base`.
    pub fn rebased(self, base: &JsonPointer) -> Self {
        if base.is_root() {
            return self;
        }
        let prefix = |p: String| format!("{base}{p}");
        match self {
            PatchOperation::Add { path, value } => PatchOperation::Add {
                path: prefix(path),
                value,
            },
            PatchOperation::Remove { path } => PatchOperation::Remove { path: prefix(path) },
            PatchOperation::Replace { path, value } => PatchOperation::Replace {
                path: prefix(path),
                value,
            },
            PatchOperation::Move { from, path } => PatchOperation::Move {
                from: prefix(from),
                path: prefix(path),
            },
            PatchOperation::Copy { from, path } => PatchOperation::Copy {
                from: prefix(from),
                path: prefix(path),
            },
            PatchOperation::Test { path, value } => PatchOperation::Test {
                path: prefix(path),
                value,
            },
        }
    }
}

/// Parses untyped operations, collecting every malformed one.
pub fn parse_operations(raw: &[Value]) -> Result<Vec<PatchOperation>, Vec<PatchError>> {
    let mut ops = Vec::with_capacity(raw.len());
    let mut errors = Vec::new();

    for (index, value) in raw.iter().enumerate() {
        match serde_json::from_value::<PatchOperation>(value.clone()) {
            Ok(op) => ops.push(op),
            Err(e) => {
                let op = value.get("op").and_then(Value::as_str).unwrap_or("?");
                let path = value.get("path").and_then(Value::as_str).unwrap_or("");
                errors.push(PatchError::new(
                    index,
                    op,
                    path,
                    PatchFailure::Malformed(e.to_string()),
                ));
            }
        }
    }

    if errors.is_empty() {
        Ok(ops)
    } else {
        Err(errors)
    }
}
