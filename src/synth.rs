//! Code synthesis: one generation call per planned unit.
//!
//! Units are independent; they are issued in plan order for reproducible
//! logs. An empty or truncated completion gets one retry with a reduced
//! prompt, and a second failure falls back to the unit's template stub.
//! Synthesis degrades per unit, it never aborts the run.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use tracing::{debug, warn};

use crate::gateway::{Gateway, DEFAULT_TEMPERATURE};
use crate::scaffold::{templates, FileKind, PlannedFile, ScaffoldPlan};
use crate::spec::Specification;
use crate::themes::Theme;

/// Token budget for entry-point and screen units.
const MAX_TOKENS_SCREEN: u32 = 2000;
/// Token budget for model and constants units.
const MAX_TOKENS_MODEL: u32 = 1500;
/// Character cap on the specification excerpt embedded in unit prompts.
const EXCERPT_CHARS: usize = 600;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedFile {
    pub path: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct UnitFailure {
    pub path: String,
    pub reason: String,
}

/// Outcome of one synthesis pass. `files` holds an entry for every unit,
/// stub content included; `failures` records the units that fell back.
#[derive(Debug, Default, Serialize)]
pub struct SynthReport {
    pub files: Vec<GeneratedFile>,
    pub failures: Vec<UnitFailure>,
}

impl SynthReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Generate content for every unit in the plan.
///
/// Gateway failures and rejected completions degrade the affected unit to
/// its template stub; the pass itself always completes.
pub async fn synthesize(
    gateway: &Gateway,
    plan: &ScaffoldPlan,
    spec: &Specification,
    theme: &Theme,
) -> SynthReport {
    let mut report = SynthReport::default();

    for unit in plan.generation_units() {
        let budget = token_budget(unit.kind);
        let full = unit_prompt(unit, &plan.app_name, spec, theme);

        let content = match attempt(gateway, &full, budget).await {
            Ok(code) => code,
            Err(first_reason) => {
                debug!("Unit {} failed ({}); retrying reduced", unit.path, first_reason);
                let reduced = reduced_prompt(unit, &plan.app_name);
                match attempt(gateway, &reduced, budget).await {
                    Ok(code) => code,
                    Err(reason) => {
                        warn!("Unit {} failed twice, writing stub: {}", unit.path, reason);
                        report.failures.push(UnitFailure {
                            path: unit.path.clone(),
                            reason,
                        });
                        templates::render(unit, &plan.app_name, theme)
                    }
                }
            }
        };

        report.files.push(GeneratedFile {
            path: unit.path.clone(),
            content,
        });
    }

    report
}

async fn attempt(gateway: &Gateway, prompt: &str, max_tokens: u32) -> Result<String, String> {
    match gateway.generate(prompt, max_tokens, DEFAULT_TEMPERATURE).await {
        Ok(text) => {
            let code = extract_code(&text);
            if looks_complete(&code) {
                Ok(code)
            } else {
                Err("empty or truncated completion".to_string())
            }
        }
        Err(err) => Err(err.to_string()),
    }
}

fn token_budget(kind: FileKind) -> u32 {
    match kind {
        FileKind::EntryPoint | FileKind::Screen => MAX_TOKENS_SCREEN,
        _ => MAX_TOKENS_MODEL,
    }
}

fn palette_line(theme: &Theme) -> String {
    format!(
        "primary {}, secondary {}, accent {}, background {}, text {}",
        theme.colors.primary,
        theme.colors.secondary,
        theme.colors.accent,
        theme.colors.background,
        theme.colors.text
    )
}

fn unit_prompt(unit: &PlannedFile, app_name: &str, spec: &Specification, theme: &Theme) -> String {
    let excerpt = spec.excerpt(EXCERPT_CHARS);
    let palette = palette_line(theme);

    match unit.kind {
        FileKind::EntryPoint => {
            let screens: Vec<&str> = spec.screens.iter().map(|s| s.name.as_str()).collect();
            format!(
                "Generate a Flutter main.dart file for an app with the following specifications:\n\n\
                 App Name: {app_name}\n\
                 App Overview: {excerpt}\n\
                 Screens: {screens}\n\
                 Theme palette: {palette}\n\n\
                 The main.dart should:\n\
                 1. Initialize the app with proper MaterialApp setup\n\
                 2. Include basic routing if multiple screens are needed\n\
                 3. Apply the theme configuration\n\
                 4. Follow Flutter best practices\n\
                 5. Include proper imports\n\n\
                 Provide only the Dart code without any explanations.",
                app_name = app_name,
                excerpt = excerpt,
                screens = screens.join(", "),
                palette = palette,
            )
        }
        FileKind::Screen => format!(
            "Generate a Flutter screen widget for the following feature:\n\n\
             Feature: {subject}\n\
             App Context: {excerpt}\n\
             Theme palette: {palette}\n\n\
             The screen should:\n\
             1. Be a StatefulWidget or StatelessWidget as appropriate\n\
             2. Include basic UI elements for the feature\n\
             3. Follow Material Design guidelines\n\
             4. Include proper error handling\n\
             5. Be ready to use with minimal modifications\n\n\
             Provide only the Dart code without explanations.",
            subject = unit.subject,
            excerpt = excerpt,
            palette = palette,
        ),
        FileKind::Model => format!(
            "Generate a Flutter/Dart model class for:\n\n\
             Model: {subject}\n\
             Context: {excerpt}\n\n\
             The model should:\n\
             1. Include appropriate fields\n\
             2. Have a constructor\n\
             3. Include toJson() and fromJson() methods\n\
             4. Follow Dart naming conventions\n\
             5. Include proper documentation\n\n\
             Provide only the Dart code without explanations.",
            subject = unit.subject,
            excerpt = excerpt,
        ),
        _ => format!(
            "Generate lib/constants/colors.dart for a Flutter app named {app_name}.\n\
             Define an AppColors class with static const Color values for this palette:\n\
             {palette}\n\
             Include success, error, warning and info colors as well.\n\n\
             Provide only the Dart code without explanations.",
            app_name = app_name,
            palette = palette,
        ),
    }
}

/// Shorter prompt for the single retry: the unit description alone,
/// without the specification excerpt.
fn reduced_prompt(unit: &PlannedFile, app_name: &str) -> String {
    let what = match unit.kind {
        FileKind::EntryPoint => "main.dart entry point".to_string(),
        FileKind::Screen => format!("screen widget for '{}'", unit.subject),
        FileKind::Model => format!("data model class for '{}'", unit.subject),
        _ => "constants file with an AppColors class".to_string(),
    };
    format!(
        "Generate a complete, compilable Flutter {what} for an app named {app_name}. \
         Provide only the Dart code without explanations.",
        what = what,
        app_name = app_name,
    )
}

fn fence_pattern() -> &'static Regex {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    FENCE.get_or_init(|| {
        Regex::new(r"```(?:dart)?\s*\n([\s\S]*?)```").expect("fence pattern is valid")
    })
}

/// Strip a Markdown code fence if the completion is wrapped in one.
pub fn extract_code(response: &str) -> String {
    if let Some(captures) = fence_pattern().captures(response) {
        return captures[1].trim().to_string();
    }
    response.trim().to_string()
}

/// Truncation heuristic: a Dart unit must be non-empty and end on its
/// closing structure marker.
fn looks_complete(code: &str) -> bool {
    let trimmed = code.trim_end();
    !trimmed.is_empty() && (trimmed.ends_with('}') || trimmed.ends_with(';'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::testing::StubModel;
    use crate::scaffold;
    use crate::spec::{ModelSpec, ScreenSpec};
    use crate::themes::{self, ThemeId};

    const VALID_DART: &str = "class Generated {\n  final int value = 1;\n}";

    fn sample_spec() -> Specification {
        Specification {
            overview: "A note-taking app".to_string(),
            screens: vec![ScreenSpec::named("Home"), ScreenSpec::named("Editor")],
            data_models: vec![ModelSpec::named("Note")],
            raw_text: "raw".to_string(),
            ..Default::default()
        }
    }

    fn sample_plan() -> ScaffoldPlan {
        scaffold::build("Notes", &sample_spec()).unwrap()
    }

    #[test]
    fn test_extract_code_from_dart_fence() {
        let response = "Sure!\n```dart\nclass A {}\n```\nDone.";
        assert_eq!(extract_code(response), "class A {}");
    }

    #[test]
    fn test_extract_code_from_anonymous_fence() {
        let response = "```\nclass B {}\n```";
        assert_eq!(extract_code(response), "class B {}");
    }

    #[test]
    fn test_extract_code_without_fence() {
        assert_eq!(extract_code("  class C {}\n"), "class C {}");
    }

    #[test]
    fn test_looks_complete() {
        assert!(looks_complete("class A {}\n"));
        assert!(looks_complete("import 'x.dart';"));
        assert!(!looks_complete(""));
        assert!(!looks_complete("class A {\n  // cut off"));
    }

    #[tokio::test]
    async fn test_synthesize_all_units_succeed() {
        let (model, calls) = StubModel::constant(VALID_DART);
        let gateway = Gateway::new(Box::new(model));
        let theme = themes::get(ThemeId::Minimalist);

        let report = synthesize(&gateway, &sample_plan(), &sample_spec(), &theme).await;

        // entry point + colors + 1 model + 2 screens
        assert_eq!(report.files.len(), 5);
        assert!(report.is_clean());
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 5);
        assert!(report.files.iter().all(|f| f.content == VALID_DART));
    }

    #[tokio::test]
    async fn test_synthesize_stubs_failed_unit() {
        // Scenario C: one screen call returns empty, everything else is
        // valid; the pass completes with a stub for the failed unit.
        let (model, _) = StubModel::new(|_, prompt| {
            if prompt.contains("Feature: Home") || prompt.contains("screen widget for 'Home'") {
                Ok(String::new())
            } else {
                Ok(VALID_DART.to_string())
            }
        });
        let gateway = Gateway::new(Box::new(model));
        let theme = themes::get(ThemeId::Minimalist);

        let report = synthesize(&gateway, &sample_plan(), &sample_spec(), &theme).await;

        assert_eq!(report.files.len(), 5);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].path, "lib/screens/home_screen.dart");

        let stubbed = report
            .files
            .iter()
            .find(|f| f.path == "lib/screens/home_screen.dart")
            .unwrap();
        assert!(stubbed.content.contains("class HomeScreen"));
    }

    #[tokio::test]
    async fn test_synthesize_retry_recovers() {
        // Truncated on the full prompt, valid on the reduced retry.
        let (model, calls) = StubModel::new(|_, prompt| {
            if prompt.contains("complete, compilable") {
                Ok(VALID_DART.to_string())
            } else {
                Ok("class Cut {".to_string())
            }
        });
        let gateway = Gateway::new(Box::new(model));
        let theme = themes::get(ThemeId::Minimalist);

        let report = synthesize(&gateway, &sample_plan(), &sample_spec(), &theme).await;

        assert!(report.is_clean());
        // every unit: one failed full attempt plus one reduced retry
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 10);
    }

    #[tokio::test]
    async fn test_synthesize_survives_gateway_errors() {
        let (model, _) = StubModel::new(|_, _| Err(crate::gateway::testing::network_down()));
        let gateway = Gateway::new(Box::new(model));
        let theme = themes::get(ThemeId::Minimalist);

        let report = synthesize(&gateway, &sample_plan(), &sample_spec(), &theme).await;

        assert_eq!(report.files.len(), 5);
        assert_eq!(report.failures.len(), 5);
        assert!(report.failures[0].reason.contains("Network failure"));
    }
}
