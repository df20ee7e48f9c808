//! Prompt construction for specification generation and amendment.

use crate::idea::Idea;
use crate::themes::Theme;

use super::Specification;

/// Prompt for the first specification-generation call.
pub fn specification(idea: &Idea, theme: &Theme) -> String {
    let idea_json = serde_json::to_string_pretty(idea)
        .unwrap_or_else(|_| format!("{} - {}", idea.name, idea.description));

    format!(
        "Create a detailed specification document for a Flutter mobile application.\n\n\
         App Idea:\n{idea_json}\n\n\
         Design Theme:\n{theme_name}\n\n\
         The specification should include:\n\
         1. App Overview\n\
         2. Technical Requirements\n\
         3. Feature Specifications (detailed)\n\
         4. Screen Layouts and Navigation\n\
         5. Data Models\n\
         6. API Requirements (if any)\n\
         7. Design Guidelines\n\
         8. Testing Requirements\n\n\
         Provide your response as a single JSON object with the keys\n\
         \"overview\", \"technical_requirements\", \"features\", \"screens\",\n\
         \"data_models\", \"api_requirements\", \"design_guidelines\" and\n\
         \"testing_requirements\". List features, screens and data models as\n\
         arrays of short names or {{\"name\", \"description\"}} objects.",
        idea_json = idea_json,
        theme_name = theme.name,
    )
}

/// Prompt for an amendment call. Embeds the full current document so the
/// back end returns a complete replacement, never a partial patch.
pub fn amendment(current: &Specification, change_request: &str) -> String {
    let current_json =
        serde_json::to_string_pretty(current).unwrap_or_else(|_| current.raw_text.clone());

    format!(
        "Update the following specification based on this feedback:\n\n\
         Feedback: {change_request}\n\n\
         Current Specification:\n{current_json}\n\n\
         Provide the complete updated specification in the same JSON format.\n\
         Return the whole document, not only the changed sections.",
        change_request = change_request,
        current_json = current_json,
    )
}
