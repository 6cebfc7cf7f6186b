//! Job-description tailoring across experience, projects and skills.

use serde::Serialize;
use tracing::info;

use crate::editing::prompts::{fill, TAILOR_TEMPLATE};
use crate::editing::proposal::{request_proposal, EditProposal};
use crate::errors::AppError;
use crate::llm_client::TextGenerator;
use crate::models::resume::{Experience, Project, ResumeDocument, Skills, VariantKey};
use crate::resume::load_resume;
use crate::store::ResumeStore;

pub const MAX_BULLETS_PER_ENTRY: usize = 4;
pub const MAX_WORDS_PER_BULLET: usize = 50;

/// The slice of a document a tailoring request may touch.
#[derive(Debug, Serialize)]
struct TailorContext<'a> {
    experience: &'a [Experience],
    projects: &'a [Project],
    skills: &'a Skills,
}

impl<'a> From<&'a ResumeDocument> for TailorContext<'a> {
    fn from(resume: &'a ResumeDocument) -> Self {
        Self {
            experience: &resume.experience,
            projects: &resume.projects,
            skills: &resume.skills,
        }
    }
}

/// Builds the tailoring prompt. Heading and education are never included.
pub fn build_tailor_prompt(
    resume: &ResumeDocument,
    job_description: &str,
    extra_instruction: Option<&str>,
) -> Result<String, AppError> {
    let resume_json = serde_json::to_string_pretty(&TailorContext::from(resume))
        .map_err(anyhow::Error::from)?;

    let extra = extra_instruction
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| format!("\nAdditional instruction:\n{s}\n"))
        .unwrap_or_default();

    let max_bullets = MAX_BULLETS_PER_ENTRY.to_string();
    let max_words = MAX_WORDS_PER_BULLET.to_string();

    Ok(fill(
        TAILOR_TEMPLATE,
        &[
            ("job_description", job_description),
            ("resume_json", &resume_json),
            ("extra_instruction", &extra),
            ("max_bullets", &max_bullets),
            ("max_words", &max_words),
        ],
    ))
}

pub async fn tailor_resume(
    store: &dyn ResumeStore,
    llm: &dyn TextGenerator,
    variant: VariantKey,
    job_description: &str,
    extra_instruction: Option<&str>,
) -> Result<EditProposal, AppError> {
    let resume = load_resume(store, variant).await?;
    info!(
        "Tailoring {variant} to a {}-character job description",
        job_description.len()
    );

    let prompt = build_tailor_prompt(&resume, job_description, extra_instruction)?;
    request_proposal(llm, &prompt).await
}
