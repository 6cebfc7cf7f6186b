//! The page template the rendered body is spliced into.

use std::path::Path;

use thiserror::Error;

pub const BODY_PLACEHOLDER: &str = "%% GENERATED_RESUME_BODY";

/// Default template, embedded at build time.
const DEFAULT_TEMPLATE: &str = include_str!("../../templates/resume.tex");

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("template is missing the '%% GENERATED_RESUME_BODY' placeholder")]
    MissingPlaceholder,

    #[error("template contains the body placeholder {0} times, expected once")]
    DuplicatePlaceholder(usize),

    #[error("failed to read template {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// A template known to contain the body placeholder exactly once.
#[derive(Debug, Clone)]
pub struct LatexTemplate {
    before: String,
    after: String,
}

impl LatexTemplate {
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        match source.matches(BODY_PLACEHOLDER).count() {
            0 => return Err(TemplateError::MissingPlaceholder),
            1 => {}
            n => return Err(TemplateError::DuplicatePlaceholder(n)),
        }

        let (before, after) = source
            .split_once(BODY_PLACEHOLDER)
            .ok_or(TemplateError::MissingPlaceholder)?;

        Ok(Self {
            before: before.to_string(),
            after: after.to_string(),
        })
    }

    pub fn embedded() -> Result<Self, TemplateError> {
        Self::parse(DEFAULT_TEMPLATE)
    }

    /// Reads `path` if given, otherwise uses the embedded template.
    pub fn load(path: Option<&Path>) -> Result<Self, TemplateError> {
        let Some(path) = path else {
            return Self::embedded();
        };
        let source = std::fs::read_to_string(path).map_err(|source| TemplateError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&source)
    }

    pub fn inject(&self, body: &str) -> String {
        let mut out = String::with_capacity(self.before.len() + body.len() + self.after.len());
        out.push_str(&self.before);
        out.push_str(body);
        out.push_str(&self.after);
        out
    }
}
