// ── Assist call sites ──
//
// The two AI conveniences: product description drafting and free-text
// business analysis. Both swallow provider failures into fixed
// user-facing strings -- callers never observe an Err from these.

use stockpile_api::{AssistClient, GenerationConfig};
use tracing::warn;

use crate::analytics::BusinessSnapshot;

/// Fast, low-budget model for short description drafting.
pub const DESCRIPTION_MODEL: &str = "gemini-2.5-flash-lite";

/// High-budget model for long-form data analysis.
pub const ANALYSIS_MODEL: &str = "gemini-2.5-pro";

/// Reasoning-depth budget for the analysis model.
const ANALYSIS_THINKING_BUDGET: u32 = 32_768;

const KEY_NOT_CONFIGURED: &str = "API key not configured.";
const DESCRIPTION_FALLBACK: &str = "Failed to generate description.";
const ANALYSIS_FALLBACK: &str = "I was unable to analyze the data. Please try again.";

/// Draft a compelling, short e-commerce product description.
pub async fn draft_product_description(
    client: &AssistClient,
    name: &str,
    category: &str,
) -> String {
    if !client.has_api_key() {
        return KEY_NOT_CONFIGURED.into();
    }

    let prompt = format!(
        "Generate a compelling, short e-commerce product description for a product \
         named \"{name}\" in the category \"{category}\". Focus on key features and \
         benefits. Keep it under 50 words."
    );

    match client.generate(DESCRIPTION_MODEL, &prompt, None).await {
        Ok(text) => text.trim().to_owned(),
        Err(e) => {
            warn!(error = %e, "description drafting failed");
            DESCRIPTION_FALLBACK.into()
        }
    }
}

/// Answer a free-text business question over the given snapshot.
///
/// The snapshot is embedded in the prompt as pretty-printed JSON; the
/// high-budget model gets a large reasoning-depth budget for it.
pub async fn analyze_business_data(
    client: &AssistClient,
    query: &str,
    data: &BusinessSnapshot,
) -> String {
    if !client.has_api_key() {
        return KEY_NOT_CONFIGURED.into();
    }

    let json = match serde_json::to_string_pretty(data) {
        Ok(json) => json,
        Err(e) => {
            warn!(error = %e, "snapshot serialization failed");
            return ANALYSIS_FALLBACK.into();
        }
    };

    let prompt = format!(
        "You are a world-class business analyst. Based on the following JSON data, \
         please answer the user's query.\n\
         Provide a clear, concise, and insightful answer. Use markdown for formatting \
         if it helps clarity (e.g., lists, bold text).\n\n\
         **User Query:** \"{query}\"\n\n\
         **JSON Data:**\n```json\n{json}\n```"
    );

    let config = GenerationConfig::with_thinking_budget(ANALYSIS_THINKING_BUDGET);
    match client.generate(ANALYSIS_MODEL, &prompt, Some(&config)).await {
        Ok(text) => text,
        Err(e) => {
            warn!(error = %e, "business analysis failed");
            ANALYSIS_FALLBACK.into()
        }
    }
}
