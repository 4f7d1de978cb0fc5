// Cross-cutting prompt fragments shared by every LLM-backed stage.
// Each service that needs LLM calls defines its own prompts.rs alongside it.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Instruction against inventing facts about a candidate.
pub const GROUNDING_INSTRUCTION: &str = "\
    CRITICAL: Every field you return must be supported by the resume text \
    provided. Do NOT infer, interpolate, or invent details. If the resume \
    does not state a value, leave the field empty or omit it.";
