//! Domain schema check for a (possibly patched) resume document.
//!
//! Runs on the untyped value so every violation can be reported at once,
//! rather than stopping at the first serde error.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::models::resume::{ResumeDocument, VariantKey};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaViolation {
    pub field: String,
    pub message: String,
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validates `value` as the current document of `expected` and returns the
/// typed document, or every violation found.
pub fn validate_resume_value(
    value: &Value,
    expected: VariantKey,
) -> Result<ResumeDocument, Vec<SchemaViolation>> {
    let mut checker = Checker::default();

    let Some(root) = value.as_object() else {
        checker.violation("document", "must be an object");
        return Err(checker.violations);
    };

    checker.non_empty_string(root, "", "resumeId");
    match root.get("variantKey").and_then(Value::as_str) {
        None => checker.violation("variantKey", "is required"),
        Some(raw) => match raw.parse::<VariantKey>() {
            Err(_) => checker.violation(
                "variantKey",
                format!("'{raw}' is not one of ai_ml, full_stack, backend_cloud"),
            ),
            Ok(found) if found != expected => {
                checker.violation("variantKey", format!("cannot change from '{expected}'"))
            }
            Ok(_) => {}
        },
    }

    if let Some(heading) = checker.object(root, "", "heading") {
        checker.non_empty_string(heading, "heading", "name");
        checker.non_empty_string(heading, "heading", "email");
        if let Some(links) = checker.array(heading, "heading", "links") {
            for (i, link) in links.iter().enumerate() {
                let field = format!("heading.links[{i}]");
                match link.as_object() {
                    Some(link) => {
                        checker.string(link, &field, "label");
                        checker.string(link, &field, "url");
                    }
                    None => checker.violation(field, "must be an object"),
                }
            }
        }
    }

    if let Some(education) = checker.array(root, "", "education") {
        for (field, entry) in checker.identified_entries(education, "education") {
            for key in ["school", "location"] {
                checker.string(entry, &field, key);
            }
            if let Some(degrees) = checker.array(entry, &field, "degrees") {
                for (degree_field, degree) in
                    checker.identified_entries(degrees, &format!("{field}.degrees"))
                {
                    checker.string(degree, &degree_field, "degree");
                    checker.string(degree, &degree_field, "dates");
                    checker.optional_string(degree, &degree_field, "gpa");
                }
            }
        }
    }

    if let Some(experience) = checker.array(root, "", "experience") {
        for (field, entry) in checker.identified_entries(experience, "experience") {
            for key in ["company", "role", "location", "dates"] {
                checker.string(entry, &field, key);
            }
            checker.bullets(entry, &field);
        }
    }

    if let Some(projects) = checker.array(root, "", "projects") {
        for (field, entry) in checker.identified_entries(projects, "projects") {
            checker.string(entry, &field, "name");
            checker.string(entry, &field, "stack");
            checker.optional_string(entry, &field, "dates");
            checker.bullets(entry, &field);
        }
    }

    if let Some(skills) = checker.object(root, "", "skills") {
        for key in ["languages", "frameworks", "tools", "core"] {
            checker.string_array(skills, "skills", key);
        }
    }

    if let Some(metadata) = checker.object(root, "", "metadata") {
        checker.non_empty_string(metadata, "metadata", "updatedAt");
        checker.optional_string(metadata, "metadata", "lastCompiledHash");
        checker.string_array(metadata, "metadata", "pageFitWarnings");
    }

    if !checker.violations.is_empty() {
        return Err(checker.violations);
    }

    // Anything the walk above missed still has to survive typed decoding.
    serde_json::from_value(value.clone()).map_err(|e| {
        vec![SchemaViolation {
            field: "document".to_string(),
            message: e.to_string(),
        }]
    })
}

#[derive(Default)]
struct Checker {
    violations: Vec<SchemaViolation>,
}

fn field_name(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{parent}.{key}")
    }
}

impl Checker {
    fn violation(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.violations.push(SchemaViolation {
            field: field.into(),
            message: message.into(),
        });
    }

    fn string(&mut self, obj: &Map<String, Value>, parent: &str, key: &str) {
        match obj.get(key) {
            Some(Value::String(_)) => {}
            Some(_) => self.violation(field_name(parent, key), "must be a string"),
            None => self.violation(field_name(parent, key), "is required"),
        }
    }

    fn non_empty_string(&mut self, obj: &Map<String, Value>, parent: &str, key: &str) {
        match obj.get(key) {
            Some(Value::String(s)) if !s.trim().is_empty() => {}
            Some(Value::String(_)) => self.violation(field_name(parent, key), "must not be empty"),
            Some(_) => self.violation(field_name(parent, key), "must be a string"),
            None => self.violation(field_name(parent, key), "is required"),
        }
    }

    fn optional_string(&mut self, obj: &Map<String, Value>, parent: &str, key: &str) {
        match obj.get(key) {
            None | Some(Value::Null) | Some(Value::String(_)) => {}
            Some(_) => self.violation(field_name(parent, key), "must be a string when present"),
        }
    }

    fn object<'a>(
        &mut self,
        obj: &'a Map<String, Value>,
        parent: &str,
        key: &str,
    ) -> Option<&'a Map<String, Value>> {
        match obj.get(key) {
            Some(Value::Object(map)) => Some(map),
            Some(_) => {
                self.violation(field_name(parent, key), "must be an object");
                None
            }
            None => {
                self.violation(field_name(parent, key), "is required");
                None
            }
        }
    }

    fn array<'a>(
        &mut self,
        obj: &'a Map<String, Value>,
        parent: &str,
        key: &str,
    ) -> Option<&'a Vec<Value>> {
        match obj.get(key) {
            Some(Value::Array(items)) => Some(items),
            Some(_) => {
                self.violation(field_name(parent, key), "must be an array");
                None
            }
            None => {
                self.violation(field_name(parent, key), "is required");
                None
            }
        }
    }

    fn string_array(&mut self, obj: &Map<String, Value>, parent: &str, key: &str) {
        if let Some(items) = self.array(obj, parent, key) {
            for (i, item) in items.iter().enumerate() {
                if !item.is_string() {
                    self.violation(
                        format!("{}[{i}]", field_name(parent, key)),
                        "must be a string",
                    );
                }
            }
        }
    }

    /// Each item must be an object with a non-empty `id` unique in `items`.
    fn identified_entries<'a>(
        &mut self,
        items: &'a [Value],
        collection: &str,
    ) -> Vec<(String, &'a Map<String, Value>)> {
        let mut seen = HashSet::new();
        let mut entries = Vec::with_capacity(items.len());

        for (i, item) in items.iter().enumerate() {
            let field = format!("{collection}[{i}]");
            let Some(entry) = item.as_object() else {
                self.violation(field, "must be an object");
                continue;
            };
            match entry.get("id").and_then(Value::as_str) {
                Some(id) if !id.is_empty() => {
                    if !seen.insert(id) {
                        self.violation(
                            format!("{field}.id"),
                            format!("duplicate id '{id}' in {collection}"),
                        );
                    }
                }
                _ => self.violation(format!("{field}.id"), "must be a non-empty string"),
            }
            entries.push((field, entry));
        }
        entries
    }

    fn bullets(&mut self, entry: &Map<String, Value>, field: &str) {
        if let Some(bullets) = self.array(entry, field, "bullets") {
            for (bullet_field, bullet) in
                self.identified_entries(bullets, &format!("{field}.bullets"))
            {
                self.string(bullet, &bullet_field, "text");
                if bullet.contains_key("tags") {
                    self.string_array(bullet, &bullet_field, "tags");
                }
            }
        }
    }
}
