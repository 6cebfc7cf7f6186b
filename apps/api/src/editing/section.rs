//! Section and entry edits.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::editing::prompts::{fill, EDIT_SECTION_TEMPLATE};
use crate::editing::proposal::{request_proposal, EditProposal};
use crate::errors::AppError;
use crate::llm_client::TextGenerator;
use crate::models::resume::{ResumeDocument, VariantKey};
use crate::resume::load_resume;
use crate::store::ResumeStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionKey {
    Heading,
    Education,
    Experience,
    Projects,
    Skills,
}

impl SectionKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SectionKey::Heading => "heading",
            SectionKey::Education => "education",
            SectionKey::Experience => "experience",
            SectionKey::Projects => "projects",
            SectionKey::Skills => "skills",
        }
    }

    /// Whether the section is a list of identified entries.
    pub fn is_collection(&self) -> bool {
        matches!(
            self,
            SectionKey::Education | SectionKey::Experience | SectionKey::Projects
        )
    }
}

impl fmt::Display for SectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SectionKey {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "heading" => Ok(SectionKey::Heading),
            "education" => Ok(SectionKey::Education),
            "experience" => Ok(SectionKey::Experience),
            "projects" => Ok(SectionKey::Projects),
            "skills" => Ok(SectionKey::Skills),
            other => Err(AppError::Validation(format!("Invalid section key: {other}"))),
        }
    }
}

/// The part of a document sent for editing and where its patches apply.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionExcerpt {
    pub base_path: String,
    pub content: Value,
}

/// Cuts out a whole section, or one entry of a collection section.
/// The entry id is ignored for `heading` and `skills`.
pub fn extract_section(
    resume: &ResumeDocument,
    section: SectionKey,
    entry_id: Option<&str>,
) -> Result<SectionExcerpt, AppError> {
    let entry_id = entry_id.filter(|id| !id.is_empty() && section.is_collection());

    let ids: Vec<&str> = match section {
        SectionKey::Education => resume.education.iter().map(|e| e.id.as_str()).collect(),
        SectionKey::Experience => resume.experience.iter().map(|e| e.id.as_str()).collect(),
        SectionKey::Projects => resume.projects.iter().map(|p| p.id.as_str()).collect(),
        SectionKey::Heading | SectionKey::Skills => Vec::new(),
    };

    let whole = match section {
        SectionKey::Heading => serde_json::to_value(&resume.heading),
        SectionKey::Education => serde_json::to_value(&resume.education),
        SectionKey::Experience => serde_json::to_value(&resume.experience),
        SectionKey::Projects => serde_json::to_value(&resume.projects),
        SectionKey::Skills => serde_json::to_value(&resume.skills),
    }
    .map_err(anyhow::Error::from)?;

    let Some(id) = entry_id else {
        return Ok(SectionExcerpt {
            base_path: format!("/{section}"),
            content: whole,
        });
    };

    let index = ids
        .iter()
        .position(|candidate| *candidate == id)
        .ok_or_else(|| AppError::NotFound(format!("Entry not found in {section}: {id}")))?;

    let content = match whole {
        Value::Array(mut entries) => entries.swap_remove(index),
        other => other,
    };

    Ok(SectionExcerpt {
        base_path: format!("/{section}/{index}"),
        content,
    })
}

/// Proposes edits to a section or one of its entries. The proposal carries
/// the base path its operations are relative to.
pub async fn edit_section(
    store: &dyn ResumeStore,
    llm: &dyn TextGenerator,
    variant: VariantKey,
    section: SectionKey,
    entry_id: Option<&str>,
    instruction: &str,
) -> Result<EditProposal, AppError> {
    let resume = load_resume(store, variant).await?;
    let excerpt = extract_section(&resume, section, entry_id)?;
    info!("Editing {} ({variant})", excerpt.base_path);

    let content = serde_json::to_string_pretty(&excerpt.content).map_err(anyhow::Error::from)?;
    let prompt = fill(
        EDIT_SECTION_TEMPLATE,
        &[
            ("section_key", section.as_str()),
            ("section_content", &content),
            ("base_path", &excerpt.base_path),
            ("instruction", instruction),
        ],
    );

    let mut proposal = request_proposal(llm, &prompt).await?;
    proposal.base_path = Some(excerpt.base_path);
    Ok(proposal)
}
