// Shared prompt constants.
// Each service that needs LLM calls defines its own prompts.rs alongside it.
// This file contains cross-cutting prompt fragments.

/// System role used for every analysis call.
pub const STRATEGIST_SYSTEM: &str =
    "You are an expert TikTok content strategist, data analyst, and viral growth consultant.";

/// Placeholder substituted for any field missing from a record.
pub const MISSING_FIELD: &str = "N/A";
