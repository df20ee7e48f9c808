//! Specification document model.
//!
//! A [`Specification`] is created once from the accepted idea and theme,
//! then amended through zero or more natural-language change requests.
//! Every amendment replaces the whole document; the model never merges
//! old and new sections. Freezing marks the document final; the
//! workflow controller refuses further amendments on a frozen value.

use serde::{Deserialize, Serialize};

use crate::gateway::{Gateway, GatewayResult, DEFAULT_TEMPERATURE};
use crate::idea::Idea;
use crate::themes::Theme;

pub mod parse;
mod prompts;

/// One feature entry. Deserializes from either a bare string or an object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "EntryRepr")]
pub struct FeatureSpec {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// One screen entry. Deserializes from either a bare string or an object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "EntryRepr")]
pub struct ScreenSpec {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// One data-model entry. Deserializes from either a bare string or an object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "EntryRepr")]
pub struct ModelSpec {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Wire shape shared by the three entry types: hand-edited artifacts may
/// list entries as plain strings or as `{name, description}` objects.
#[derive(Deserialize)]
#[serde(untagged)]
enum EntryRepr {
    Summary(String),
    Detailed {
        #[serde(alias = "title", alias = "screen", alias = "model", alias = "feature")]
        name: String,
        #[serde(default, alias = "details")]
        description: String,
    },
}

impl From<EntryRepr> for (String, String) {
    fn from(repr: EntryRepr) -> Self {
        match repr {
            EntryRepr::Summary(name) => (name, String::new()),
            EntryRepr::Detailed { name, description } => (name, description),
        }
    }
}

macro_rules! entry_from_repr {
    ($ty:ident) => {
        impl From<EntryRepr> for $ty {
            fn from(repr: EntryRepr) -> Self {
                let (name, description): (String, String) = repr.into();
                Self { name, description }
            }
        }

        impl From<(String, String)> for $ty {
            fn from((name, description): (String, String)) -> Self {
                Self { name, description }
            }
        }

        impl $ty {
            #[allow(dead_code)]
            pub fn named(name: &str) -> Self {
                Self {
                    name: name.to_string(),
                    description: String::new(),
                }
            }
        }
    };
}

entry_from_repr!(FeatureSpec);
entry_from_repr!(ScreenSpec);
entry_from_repr!(ModelSpec);

/// The structured design document driving scaffold and code generation.
///
/// `raw_text` always holds the generation response verbatim; the
/// structured fields may all be empty when the response could not be
/// decomposed (a degraded, non-fatal result; downstream steps fall back
/// to `raw_text`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Specification {
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub technical_requirements: String,
    #[serde(default)]
    pub features: Vec<FeatureSpec>,
    #[serde(default)]
    pub screens: Vec<ScreenSpec>,
    #[serde(default)]
    pub data_models: Vec<ModelSpec>,
    #[serde(default)]
    pub api_requirements: String,
    #[serde(default)]
    pub design_guidelines: String,
    #[serde(default)]
    pub testing_requirements: String,
    #[serde(default)]
    pub raw_text: String,
    #[serde(default)]
    pub frozen: bool,
}

impl Specification {
    /// True when no structured field was populated and only `raw_text`
    /// carries the document.
    pub fn is_degraded(&self) -> bool {
        self.overview.is_empty()
            && self.technical_requirements.is_empty()
            && self.features.is_empty()
            && self.screens.is_empty()
            && self.data_models.is_empty()
            && self.api_requirements.is_empty()
            && self.design_guidelines.is_empty()
            && self.testing_requirements.is_empty()
    }

    /// Mark the document final.
    pub fn freeze(mut self) -> Self {
        self.frozen = true;
        self
    }

    /// Best available prose summary, for unit-scoped synthesis prompts.
    pub fn excerpt(&self, limit: usize) -> String {
        let source = if self.overview.is_empty() {
            &self.raw_text
        } else {
            &self.overview
        };
        source.chars().take(limit).collect()
    }

    /// Render the document as Markdown for the human-readable checkpoint
    /// files written next to each JSON artifact.
    pub fn to_markdown(&self) -> String {
        if self.is_degraded() {
            return self.raw_text.clone();
        }

        let mut out = String::new();
        let mut section = |title: &str, body: &str| {
            if !body.is_empty() {
                out.push_str("## ");
                out.push_str(title);
                out.push_str("\n\n");
                out.push_str(body);
                out.push_str("\n\n");
            }
        };

        section("Overview", &self.overview);
        section("Technical Requirements", &self.technical_requirements);
        section("Features", &render_entries(&self.features, |f| (&f.name, &f.description)));
        section("Screens", &render_entries(&self.screens, |s| (&s.name, &s.description)));
        section(
            "Data Models",
            &render_entries(&self.data_models, |m| (&m.name, &m.description)),
        );
        section("API Requirements", &self.api_requirements);
        section("Design Guidelines", &self.design_guidelines);
        section("Testing Requirements", &self.testing_requirements);
        out
    }
}

fn render_entries<T>(entries: &[T], fields: impl Fn(&T) -> (&String, &String)) -> String {
    entries
        .iter()
        .map(|entry| {
            let (name, description) = fields(entry);
            if description.is_empty() {
                format!("- {}", name)
            } else {
                format!("- **{}**: {}", name, description)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Create a specification from the accepted idea and selected theme.
///
/// One gateway call; the result is parsed tolerantly and is never both
/// structurally empty and missing `raw_text`.
pub async fn create(
    gateway: &Gateway,
    idea: &Idea,
    theme: &Theme,
    max_tokens: u32,
) -> GatewayResult<Specification> {
    let prompt = prompts::specification(idea, theme);
    let response = gateway
        .generate(&prompt, max_tokens, DEFAULT_TEMPERATURE)
        .await?;
    Ok(parse::parse_specification(&response))
}

/// Produce a full replacement document from the current specification and
/// a natural-language change request.
///
/// The caller decides whether to adopt the returned value; this function
/// never merges old and new documents.
pub async fn amend(
    gateway: &Gateway,
    current: &Specification,
    change_request: &str,
    max_tokens: u32,
) -> GatewayResult<Specification> {
    let prompt = prompts::amendment(current, change_request);
    let response = gateway
        .generate(&prompt, max_tokens, DEFAULT_TEMPERATURE)
        .await?;
    Ok(parse::parse_specification(&response))
}
