//! Document → LaTeX body.

use std::fmt::Write;

use crate::models::resume::{Education, Experience, Heading, Project, ResumeDocument, Skills};

/// Escapes LaTeX special characters in one pass, so no replacement is re-escaped.
pub fn escape_latex(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str(r"\textbackslash{}"),
            '~' => out.push_str(r"\textasciitilde{}"),
            '^' => out.push_str(r"\textasciicircum{}"),
            '{' | '}' | '%' | '&' | '#' | '_' | '$' => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

/// Link targets go through `\href` verbatim apart from characters that would
/// end the argument or start a comment.
fn escape_url(url: &str) -> String {
    let mut out = String::with_capacity(url.len());
    for c in url.chars() {
        if matches!(c, '{' | '}' | '%' | '#') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

pub fn render_resume_body(resume: &ResumeDocument) -> String {
    let mut body = String::new();
    render_heading(&mut body, &resume.heading);
    render_education(&mut body, &resume.education);
    render_experience(&mut body, &resume.experience);
    render_projects(&mut body, &resume.projects);
    render_skills(&mut body, &resume.skills);
    body
}

// ────────────────────────────────────────────────────────────────────────────
// Sections
// ────────────────────────────────────────────────────────────────────────────

// `write!` into a String cannot fail, so its results are discarded below.

fn render_heading(out: &mut String, heading: &Heading) {
    let contact = std::iter::once(escape_latex(&heading.email))
        .chain(heading.links.iter().map(|link| {
            format!(
                r"\href{{{}}}{{\underline{{{}}}}}",
                escape_url(&link.url),
                escape_latex(&link.label)
            )
        }))
        .collect::<Vec<_>>()
        .join(" $|$ ");

    let _ = write!(
        out,
        "\\begin{{center}}\n    \\textbf{{\\Huge \\scshape {}}} \\\\ \\vspace{{1pt}}\n    \\small {}\n\\end{{center}}\n\n",
        escape_latex(&heading.name),
        contact
    );
}

fn degree_line(degree: &str, gpa: Option<&str>) -> String {
    match gpa.filter(|g| !g.is_empty()) {
        Some(gpa) => format!("{} -- GPA: {}", escape_latex(degree), escape_latex(gpa)),
        None => escape_latex(degree),
    }
}

fn render_education(out: &mut String, education: &[Education]) {
    if education.is_empty() {
        return;
    }

    out.push_str("\\section{Education}\n\\resumeSubHeadingListStart\n");
    for entry in education {
        for (i, degree) in entry.degrees.iter().enumerate() {
            let line = degree_line(&degree.degree, degree.gpa.as_deref());
            if i == 0 {
                let _ = write!(
                    out,
                    "  \\resumeSubheading\n    {{{}}}{{{}}}\n    {{{}}}{{{}}}\n",
                    escape_latex(&entry.school),
                    escape_latex(&entry.location),
                    line,
                    escape_latex(&degree.dates)
                );
            } else {
                let _ = write!(
                    out,
                    "  \\resumeSubSubheading\n    {{{}}}{{{}}}\n",
                    line,
                    escape_latex(&degree.dates)
                );
            }
        }
    }
    out.push_str("\\resumeSubHeadingListEnd\n\n");
}

fn render_bullets<'a>(out: &mut String, bullets: impl ExactSizeIterator<Item = &'a str>) {
    if bullets.len() == 0 {
        return;
    }
    out.push_str("    \\resumeItemListStart\n");
    for text in bullets {
        let _ = writeln!(out, "      \\resumeItem{{{}}}", escape_latex(text));
    }
    out.push_str("    \\resumeItemListEnd\n");
}

fn render_experience(out: &mut String, experience: &[Experience]) {
    if experience.is_empty() {
        return;
    }

    out.push_str("\\section{Experience}\n\\resumeSubHeadingListStart\n");
    for entry in experience {
        let _ = write!(
            out,
            "  \\resumeSubheading\n    {{{}}}{{{}}}\n    {{{}}}{{{}}}\n",
            escape_latex(&entry.company),
            escape_latex(&entry.location),
            escape_latex(&entry.role),
            escape_latex(&entry.dates)
        );
        render_bullets(out, entry.bullets.iter().map(|b| b.text.as_str()));
    }
    out.push_str("\\resumeSubHeadingListEnd\n\n");
}

fn render_projects(out: &mut String, projects: &[Project]) {
    if projects.is_empty() {
        return;
    }

    out.push_str("\\section{Projects}\n\\resumeSubHeadingListStart\n");
    for project in projects {
        let dates = project.dates.as_deref().map(escape_latex).unwrap_or_default();
        let _ = write!(
            out,
            "  \\resumeProjectHeading\n    {{\\textbf{{{}}} $|$ \\emph{{{}}}}}{{{}}}\n",
            escape_latex(&project.name),
            escape_latex(&project.stack),
            dates
        );
        render_bullets(out, project.bullets.iter().map(|b| b.text.as_str()));
    }
    out.push_str("\\resumeSubHeadingListEnd\n\n");
}

fn render_skills(out: &mut String, skills: &Skills) {
    if skills.is_empty() {
        return;
    }

    let categories = [
        ("Languages", &skills.languages),
        ("Frameworks", &skills.frameworks),
        ("Developer Tools", &skills.tools),
        ("Core Competencies", &skills.core),
    ];

    let lines: Vec<String> = categories
        .iter()
        .filter(|(_, items)| !items.is_empty())
        .map(|(label, items)| {
            let joined = items
                .iter()
                .map(|s| escape_latex(s))
                .collect::<Vec<_>>()
                .join(", ");
            format!("    \\textbf{{{label}}}{{: {joined}}} \\\\\n")
        })
        .collect();

    out.push_str("\\section{Technical Skills}\n");
    out.push_str("\\begin{itemize}[leftmargin=0.15in, label={}]\n");
    out.push_str("  \\small{\\item{\n");
    for line in &lines {
        out.push_str(line);
    }
    out.push_str("  }}\n");
    out.push_str("\\end{itemize}\n\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::resume::fixtures::sample_resume;
    use crate::models::resume::VariantKey;
    use proptest::prelude::*;

    #[test]
    fn test_escape_each_special_once() {
        assert_eq!(escape_latex("50% & $5 {bonus}"), r"50\% \& \$5 \{bonus\}");
    }

    #[test]
    fn test_escape_backslash_not_re_escaped() {
        assert_eq!(escape_latex(r"a\b"), r"a\textbackslash{}b");
        assert_eq!(escape_latex("x^2 ~ y_1 #3"), r"x\textasciicircum{}2 \textasciitilde{} y\_1 \#3");
    }

    #[test]
    fn test_heading_links_and_email() {
        let body = render_resume_body(&sample_resume(VariantKey::AiMl));
        assert!(body.contains(r"\textbf{\Huge \scshape Ada Lovelace}"));
        assert!(body.contains(
            r"ada@example.com $|$ \href{https://github.com/ada}{\underline{GitHub}} $|$ \href{https://linkedin.com/in/ada}{\underline{LinkedIn}}"
        ));
    }

    #[test]
    fn test_education_first_degree_subheading_then_subsubheading() {
        let body = render_resume_body(&sample_resume(VariantKey::AiMl));
        assert!(body.contains(
            "  \\resumeSubheading\n    {University of London}{London, UK}\n    {MSc Computer Science -- GPA: 3.9}{2019 -- 2020}\n"
        ));
        assert!(body.contains("  \\resumeSubSubheading\n    {BSc Mathematics}{2015 -- 2019}\n"));
    }

    #[test]
    fn test_experience_bullets_escaped() {
        let body = render_resume_body(&sample_resume(VariantKey::AiMl));
        assert!(body.contains(r"\resumeItem{Cut p99 latency by 40\% with caching}"));
    }

    #[test]
    fn test_project_without_dates_renders_empty_field() {
        let body = render_resume_body(&sample_resume(VariantKey::AiMl));
        assert!(body.contains(r"{\textbf{Notes Engine} $|$ \emph{Rust, SQLite}}{}"));
    }

    #[test]
    fn test_empty_sections_omitted() {
        let mut resume = sample_resume(VariantKey::AiMl);
        resume.education.clear();
        resume.projects.clear();
        resume.experience[1].bullets.clear();
        resume.skills.languages.clear();
        resume.skills.frameworks.clear();
        resume.skills.core.clear();

        let body = render_resume_body(&resume);
        assert!(!body.contains(r"\section{Education}"));
        assert!(!body.contains(r"\section{Projects}"));
        assert!(!body.contains(r"\section{Technical Skills}"));
        assert_eq!(body.matches(r"\resumeItemListStart").count(), 1);
    }

    #[test]
    fn test_skills_only_non_empty_categories() {
        let body = render_resume_body(&sample_resume(VariantKey::AiMl));
        assert!(body.contains(r"\textbf{Languages}{: Rust, Python} \\"));
        assert!(body.contains(r"\textbf{Core Competencies}{: Distributed Systems} \\"));
        assert!(!body.contains("Developer Tools"));
    }

    #[test]
    fn test_render_is_deterministic() {
        let resume = sample_resume(VariantKey::BackendCloud);
        assert_eq!(render_resume_body(&resume), render_resume_body(&resume.clone()));
    }

    proptest! {
        #[test]
        fn prop_plain_text_passes_through(s in "[a-zA-Z0-9 .,:;()-]*") {
            prop_assert_eq!(escape_latex(&s), s);
        }

        #[test]
        fn prop_no_unescaped_specials(s in any::<String>()) {
            let escaped = escape_latex(&s);
            // Dropping escape sequences must leave no special character behind.
            let stripped = escaped
                .replace(r"\textbackslash{}", "")
                .replace(r"\textasciitilde{}", "")
                .replace(r"\textasciicircum{}", "")
                .replace(r"\{", "")
                .replace(r"\}", "")
                .replace(r"\%", "")
                .replace(r"\&", "")
                .replace(r"\#", "")
                .replace(r"\_", "")
                .replace(r"\$", "");
            prop_assert!(!stripped.contains(['\\', '{', '}', '%', '&', '#', '_', '$', '~', '^']), "stripped output still contains LaTeX special characters");
        }
    }
}
