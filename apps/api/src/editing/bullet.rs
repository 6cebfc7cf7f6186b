//! Single-bullet edits.

use tracing::info;

use crate::editing::prompts::{fill, EDIT_BULLET_TEMPLATE};
use crate::editing::proposal::{request_proposal, EditProposal};
use crate::errors::AppError;
use crate::llm_client::TextGenerator;
use crate::models::resume::{Bullet, ResumeDocument, VariantKey};
use crate::resume::load_resume;
use crate::store::ResumeStore;

/// Where a bullet currently sits. Indices are positional and only valid for
/// the document they were computed from.
#[derive(Debug, Clone, PartialEq)]
pub struct BulletLocation<'a> {
    pub section: &'static str,
    pub entry_index: usize,
    pub bullet_index: usize,
    pub bullet: &'a Bullet,
}

impl BulletLocation<'_> {
    /// Patch path of the bullet's text.
    pub fn text_path(&self) -> String {
        format!(
            "/{}/{}/bullets/{}/text",
            self.section, self.entry_index, self.bullet_index
        )
    }
}

/// Finds a bullet by id, scanning experience entries before projects.
/// The first match wins.
pub fn locate_bullet<'a>(resume: &'a ResumeDocument, bullet_id: &str) -> Option<BulletLocation<'a>> {
    let experience = resume
        .experience
        .iter()
        .enumerate()
        .map(|(i, e)| ("experience", i, e.bullets.as_slice()));
    let projects = resume
        .projects
        .iter()
        .enumerate()
        .map(|(i, p)| ("projects", i, p.bullets.as_slice()));

    experience
        .chain(projects)
        .find_map(|(section, entry_index, bullets)| {
            let bullet_index = bullets.iter().position(|b| b.id == bullet_id)?;
            Some(BulletLocation {
                section,
                entry_index,
                bullet_index,
                bullet: &bullets[bullet_index],
            })
        })
}

/// Proposes an edit of one bullet. Fails with not-found, before any service
/// call, if no experience or project entry holds `bullet_id`.
pub async fn edit_bullet(
    store: &dyn ResumeStore,
    llm: &dyn TextGenerator,
    variant: VariantKey,
    bullet_id: &str,
    instruction: &str,
) -> Result<EditProposal, AppError> {
    let resume = load_resume(store, variant).await?;

    let location = locate_bullet(&resume, bullet_id)
        .ok_or_else(|| AppError::NotFound(format!("Bullet not found: {bullet_id}")))?;
    let path = location.text_path();
    info!("Editing bullet {bullet_id} at {path} ({variant})");

    let prompt = fill(
        EDIT_BULLET_TEMPLATE,
        &[
            ("bullet_path", &path),
            ("bullet_text", &location.bullet.text),
            ("instruction", instruction),
        ],
    );

    request_proposal(llm, &prompt).await
}
