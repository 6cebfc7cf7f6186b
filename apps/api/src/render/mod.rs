// LaTeX Renderer.
// Maps a resume document to a LaTeX body and splices it into the page template.
// Rendering is pure: identical documents produce byte-identical source.

pub mod handlers;
pub mod latex;
pub mod template;

pub use latex::render_resume_body;
pub use template::LatexTemplate;

use crate::models::resume::ResumeDocument;

/// Full LaTeX source for `resume`.
pub fn render_resume(template: &LatexTemplate, resume: &ResumeDocument) -> String {
    template.inject(&render_resume_body(resume))
}
