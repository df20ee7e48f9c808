//! App idea generation, the first pipeline step.
//!
//! One generation call turns free-text user context into a structured
//! [`Idea`]. Parsing is tolerant: if the response carries no usable JSON
//! object, a default idea is built around the raw text so the user can
//! still review and decline it.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::gateway::{Gateway, GatewayResult, DEFAULT_TEMPERATURE};
use crate::spec::parse::extract_json_object;

/// Structured app concept. Immutable once accepted by the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Idea {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub target_users: String,
    #[serde(default, alias = "features")]
    pub key_features: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub problem_solved: Option<String>,
}

/// Build the idea-generation prompt, optionally seeded with user context.
pub fn build_prompt(context: &str) -> String {
    let mut prompt = String::from(
        "Generate a creative and practical mobile app idea for a Flutter application.\n\n\
         The app should be:\n\
         - Feasible to build in one day with proper planning\n\
         - Useful and solve a real problem\n\
         - Have clear target users\n\
         - Include 3-5 key features\n\n\
         Provide your response in JSON format with the following structure:\n\
         {\n\
             \"name\": \"App Name\",\n\
             \"description\": \"Brief description of the app\",\n\
             \"target_users\": \"Who will use this app\",\n\
             \"features\": [\"Feature 1\", \"Feature 2\", \"Feature 3\"],\n\
             \"problem_solved\": \"What problem does this app solve\"\n\
         }\n",
    );
    if !context.trim().is_empty() {
        prompt.push_str("\nUser context: ");
        prompt.push_str(context.trim());
    }
    prompt
}

/// Issue the idea-generation call and parse the result.
pub async fn generate(gateway: &Gateway, context: &str, max_tokens: u32) -> GatewayResult<Idea> {
    let prompt = build_prompt(context);
    let response = gateway
        .generate(&prompt, max_tokens, DEFAULT_TEMPERATURE)
        .await?;
    Ok(parse_response(&response))
}

/// Tolerant parse of the generation response into an [`Idea`].
pub fn parse_response(response: &str) -> Idea {
    if let Some(json) = extract_json_object(response) {
        match serde_json::from_str::<Idea>(json) {
            Ok(idea) if !idea.name.trim().is_empty() => return idea,
            Ok(_) => warn!("Idea response parsed but carried no name; using fallback"),
            Err(e) => warn!("Failed to parse idea response as JSON: {}", e),
        }
    }

    let description: String = response.trim().chars().take(200).collect();
    Idea {
        name: "My Flutter App".to_string(),
        description,
        target_users: "Mobile users".to_string(),
        key_features: vec![
            "Feature 1".to_string(),
            "Feature 2".to_string(),
            "Feature 3".to_string(),
        ],
        problem_solved: Some("Solves user needs".to_string()),
    }
}
