// Prompt text for edit proposals. Placeholders in `{braces}` are replaced
// before sending; `system_prompt()` adds the shared JSON-only fragment.

use crate::llm_client::prompts::{JSON_ONLY_SYSTEM, NO_FABRICATION_INSTRUCTION};

const EDIT_RULES: &str = r#"You are a resume editing assistant. Your job is to modify resume content based on user instructions.

CRITICAL RULES:
1. Return ONLY JSON Patch (RFC 6902) operations - never full object replacements
2. Keep bullets concise and action-oriented, using strong action verbs
3. Avoid special characters that break LaTeX
4. Make content ATS-friendly (no tables, images, or complex formatting)
5. Focus on impact and results, not just responsibilities

Output format:
{
  "patches": [{ "op": "replace", "path": "/experience/0/bullets/1/text", "value": "new text" }],
  "rationale": "Brief explanation of changes",
  "warnings": ["Any concerns or limitations"]
}"#;

pub fn system_prompt() -> String {
    format!("{EDIT_RULES}\n\n{NO_FABRICATION_INSTRUCTION}\n\n{JSON_ONLY_SYSTEM}")
}

/// Replace `{bullet_text}`, `{bullet_path}`, `{instruction}`.
pub const EDIT_BULLET_TEMPLATE: &str = r#"Current resume bullet:
"{bullet_text}"

User instruction:
{instruction}

Generate a JSON Patch operation to modify this bullet. The path is: {bullet_path}

Remember:
- Do not invent metrics or achievements
- Keep it concise and impactful
- Use action verbs
- Make it ATS-friendly"#;

/// Replace `{section_key}`, `{section_content}`, `{base_path}`, `{instruction}`.
pub const EDIT_SECTION_TEMPLATE: &str = r#"Current resume section ({section_key}):
{section_content}

Base path for JSON Patch operations: {base_path}

User instruction:
{instruction}

Generate JSON Patch operations to modify this section according to the instruction.

Remember:
- Every "path" (and "from") must be relative to the base path; use "" for the base itself
- Do not invent metrics or achievements
- Keep content concise and impactful
- Use action verbs for bullets
- Make it ATS-friendly"#;

/// Replace `{job_description}`, `{resume_json}`, `{extra_instruction}`,
/// `{max_bullets}`, `{max_words}`.
pub const TAILOR_TEMPLATE: &str = r#"Job Description:
{job_description}

Current Resume:
{resume_json}
{extra_instruction}
Task: Tailor this resume to match the job description.

Steps:
1. Extract key requirements, skills, and themes from the job description
2. Identify the most relevant bullets in experience and projects (use tags for relevance)
3. Select the most impactful bullets per experience entry
4. Rewrite selected bullets to align with job requirements WITHOUT inventing claims
5. Update the skills section to prioritize relevant technologies

Constraints:
- Max {max_bullets} bullets per experience entry
- Max {max_words} words per bullet
- Must maintain truthfulness - no fabricated achievements
- Keep quantified metrics only if they exist
- ATS-safe formatting (no special characters)

Generate JSON Patch operations (paths relative to the resume root) to transform the resume.
Include "/experience", "/projects" and "/skills" modifications.
Provide rationale for selection and rewriting decisions."#;

/// Substitutes `{key}` placeholders in a single pass over the template, so
/// user text that happens to contain a placeholder is never expanded.
pub fn fill(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let substitution = after.find('}').and_then(|end| {
            let key = &after[..end];
            vars.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, value)| (*value, end))
        });
        match substitution {
            Some((value, end)) => {
                out.push_str(value);
                rest = &after[end + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
