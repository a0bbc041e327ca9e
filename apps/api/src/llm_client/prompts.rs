// Cross-cutting prompt fragments shared by every provider binding.
// Feature-specific prompts live next to the feature (see analysis/prompts.rs).

/// System prompt fragment asking for one JSON object. A fenced ```json block is
/// tolerated because the extractor looks for one first.
pub const JSON_OBJECT_SYSTEM: &str = "You are a precise, structured assistant. \
    Respond with exactly one JSON object. \
    You may wrap it in a ```json code block, but do not add any other JSON. \
    Do NOT include explanations or apologies outside the object.";

/// Reminder appended to every prompt that feeds the structured-output extractor.
pub const SCHEMA_INSTRUCTION: &str = "\
    Every list in the schema must contain at least one item. \
    Scores are integers from 0 to 100. \
    Use only the enum values listed for each field.";
