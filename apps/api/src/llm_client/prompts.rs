// Cross-cutting prompt fragments shared by every edit-proposal prompt.
// Task-specific prompts live next to the code that sends them.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Instruction appended to every editing prompt.
pub const NO_FABRICATION_INSTRUCTION: &str = "\
    CRITICAL: Never invent or fabricate metrics, achievements, employers, dates or claims. \
    Only quantify impact if the number already exists in the provided content.";
