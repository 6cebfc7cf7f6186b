//! Operation semantics over `serde_json::Value`.
//!
//! Nothing here mutates the caller's document: validation dry-runs on a
//! scratch copy and application returns a new value.

use serde_json::Value;

use crate::patch::operation::PatchOperation;
use crate::patch::pointer::{parse_index, JsonPointer};
use crate::patch::{PatchError, PatchFailure};

/// Checks that every operation applies, in order, to `doc`.
///
/// Operations are dry-run sequentially so later ones see the effect of
/// earlier ones. Stops at the first failure; anything after it would be
/// judged against a document that can never exist.
pub fn validate_operations(doc: &Value, ops: &[PatchOperation]) -> Result<(), Vec<PatchError>> {
    let mut scratch = doc.clone();
    run(&mut scratch, ops).map_err(|e| vec![e])
}

/// Applies all operations to a copy of `doc` and returns the new document.
pub fn apply_operations(doc: &Value, ops: &[PatchOperation]) -> Result<Value, PatchError> {
    let mut next = doc.clone();
    run(&mut next, ops)?;
    Ok(next)
}

fn run(doc: &mut Value, ops: &[PatchOperation]) -> Result<(), PatchError> {
    for (index, op) in ops.iter().enumerate() {
        apply_one(doc, op).map_err(|failure| PatchError::new(index, op.name(), op.path(), failure))?;
    }
    Ok(())
}

fn apply_one(doc: &mut Value, op: &PatchOperation) -> Result<(), PatchFailure> {
    match op {
        PatchOperation::Add { path, value } => add(doc, &JsonPointer::parse(path)?, value.clone()),
        PatchOperation::Remove { path } => remove(doc, &JsonPointer::parse(path)?).map(|_| ()),
        PatchOperation::Replace { path, value } => {
            *resolve_mut(doc, &JsonPointer::parse(path)?)? = value.clone();
            Ok(())
        }
        PatchOperation::Move { from, path } => {
            let from = JsonPointer::parse(from)?;
            let to = JsonPointer::parse(path)?;
            if from == to {
                return resolve(doc, &from).map(|_| ());
            }
            if from.is_proper_prefix_of(&to) {
                return Err(PatchFailure::MoveIntoChild);
            }
            let moved = remove(doc, &from)?;
            add(doc, &to, moved)
        }
        PatchOperation::Copy { from, path } => {
            let copied = resolve(doc, &JsonPointer::parse(from)?)?.clone();
            add(doc, &JsonPointer::parse(path)?, copied)
        }
        PatchOperation::Test { path, value } => {
            if resolve(doc, &JsonPointer::parse(path)?)? == value {
                Ok(())
            } else {
                Err(PatchFailure::TestFailed)
            }
        }
    }
}

fn resolve<'a>(doc: &'a Value, ptr: &JsonPointer) -> Result<&'a Value, PatchFailure> {
    ptr.tokens().iter().try_fold(doc, |node, token| match node {
        Value::Object(map) => map.get(token).ok_or(PatchFailure::PathNotFound),
        Value::Array(items) => {
            if token == "-" {
                return Err(PatchFailure::PathNotFound);
            }
            let index = parse_index(token)?;
            items.get(index).ok_or(PatchFailure::IndexOutOfBounds {
                index,
                len: items.len(),
            })
        }
        _ => Err(PatchFailure::NotAContainer),
    })
}

fn resolve_mut<'a>(doc: &'a mut Value, ptr: &JsonPointer) -> Result<&'a mut Value, PatchFailure> {
    ptr.tokens().iter().try_fold(doc, |node, token| match node {
        Value::Object(map) => map.get_mut(token).ok_or(PatchFailure::PathNotFound),
        Value::Array(items) => {
            if token == "-" {
                return Err(PatchFailure::PathNotFound);
            }
            let index = parse_index(token)?;
            let len = items.len();
            items
                .get_mut(index)
                .ok_or(PatchFailure::IndexOutOfBounds { index, len })
        }
        _ => Err(PatchFailure::NotAContainer),
    })
}

fn add(doc: &mut Value, ptr: &JsonPointer, value: Value) -> Result<(), PatchFailure> {
    let Some((parent, last)) = ptr.split_last() else {
        *doc = value;
        return Ok(());
    };

    match resolve_mut(doc, &parent)? {
        Value::Object(map) => {
            map.insert(last.to_string(), value);
            Ok(())
        }
        Value::Array(items) => {
            if last == "-" {
                items.push(value);
                return Ok(());
            }
            let index = parse_index(last)?;
            if index > items.len() {
                return Err(PatchFailure::IndexOutOfBounds {
                    index,
                    len: items.len(),
                });
            }
            items.insert(index, value);
            Ok(())
        }
        _ => Err(PatchFailure::NotAContainer),
    }
}

fn remove(doc: &mut Value, ptr: &JsonPointer) -> Result<Value, PatchFailure> {
    let (parent, last) = ptr.split_last().ok_or(PatchFailure::RootRemoval)?;

    match resolve_mut(doc, &parent)? {
        Value::Object(map) => map.remove(last).ok_or(PatchFailure::PathNotFound),
        Value::Array(items) => {
            if last == "-" {
                return Err(PatchFailure::PathNotFound);
            }
            let index = parse_index(last)?;
            if index >= items.len() {
                return Err(PatchFailure::IndexOutOfBounds {
                    index,
                    len: items.len(),
                });
            }
            Ok(items.remove(index))
        }
        _ => Err(PatchFailure::NotAContainer),
    }
}
