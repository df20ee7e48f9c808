//! Static design-theme catalog.
//!
//! Three selectable presets (palette, typography, descriptive tags).
//! Pure lookup with no I/O and no mutable state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThemeId {
    Minimalist,
    Material,
    FoodFocused,
}

impl ThemeId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThemeId::Minimalist => "minimalist",
            ThemeId::Material => "material",
            ThemeId::FoodFocused => "food_focused",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeColors {
    pub primary: String,
    pub secondary: String,
    pub accent: String,
    pub background: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Typography {
    pub heading_font: String,
    pub body_font: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theme {
    pub id: ThemeId,
    pub name: String,
    pub description: String,
    pub colors: ThemeColors,
    pub typography: Typography,
    pub characteristics: Vec<String>,
}

/// Theme plus the generated inspiration blurb, persisted as `theme.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThemeSelection {
    pub theme: Theme,
    pub inspiration: String,
    pub selected_at: DateTime<Utc>,
}

#[derive(Error, Debug)]
#[error("unknown theme: {0}")]
pub struct UnknownTheme(pub String);

fn theme(
    id: ThemeId,
    name: &str,
    description: &str,
    colors: [&str; 5],
    typography: [&str; 2],
    characteristics: &[&str],
) -> Theme {
    Theme {
        id,
        name: name.to_string(),
        description: description.to_string(),
        colors: ThemeColors {
            primary: colors[0].to_string(),
            secondary: colors[1].to_string(),
            accent: colors[2].to_string(),
            background: colors[3].to_string(),
            text: colors[4].to_string(),
        },
        typography: Typography {
            heading_font: typography[0].to_string(),
            body_font: typography[1].to_string(),
        },
        characteristics: characteristics.iter().map(|c| c.to_string()).collect(),
    }
}

/// All selectable themes, in presentation order.
pub fn all() -> Vec<Theme> {
    vec![
        theme(
            ThemeId::Minimalist,
            "Modern Minimalist",
            "Clean, simple design with lots of whitespace",
            ["#2C3E50", "#3498DB", "#E74C3C", "#FFFFFF", "#2C3E50"],
            ["Montserrat", "Roboto"],
            &[
                "Flat design",
                "Generous whitespace",
                "Simple color palette",
                "Clear typography",
                "Minimal decorative elements",
            ],
        ),
        theme(
            ThemeId::Material,
            "Material Design",
            "Google's Material Design principles",
            ["#6200EE", "#03DAC6", "#FF0266", "#FFFFFF", "#000000"],
            ["Roboto", "Roboto"],
            &[
                "Elevation and shadows",
                "Bold colors",
                "Responsive animations",
                "Card-based layouts",
                "FAB (Floating Action Button)",
            ],
        ),
        theme(
            ThemeId::FoodFocused,
            "Appetizing / Food-focused (Warm, colorful)",
            "Warm, inviting colors perfect for food apps",
            ["#FF6B35", "#F7931E", "#C1121F", "#FFF8F3", "#333333"],
            ["Poppins", "Open Sans"],
            &[
                "Warm color palette",
                "High-quality imagery",
                "Appetizing visuals",
                "Rounded corners",
                "Friendly, inviting UI",
            ],
        ),
    ]
}

/// Look up a theme by id.
#[allow(dead_code)]
pub fn get(id: ThemeId) -> Theme {
    all()
        .into_iter()
        .find(|t| t.id == id)
        .expect("catalog contains every ThemeId")
}

/// Look up a theme by zero-based presentation index.
pub fn by_index(index: usize) -> Result<Theme, UnknownTheme> {
    all()
        .into_iter()
        .nth(index)
        .ok_or_else(|| UnknownTheme(format!("index {}", index)))
}

/// Prompt for the design-inspiration generation call issued during the
/// theme step.
pub fn inspiration_prompt() -> &'static str {
    "Provide design inspiration for a mobile application. Suggest:\n\n\
     1. Modern design trends that work well for mobile apps\n\
     2. Color palette suggestions\n\
     3. UI/UX best practices\n\
     4. Reference to popular apps with good design\n\
     5. Specific design elements that could enhance user experience\n\n\
     Keep the response concise but informative."
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_order_is_stable() {
        let ids: Vec<ThemeId> = all().into_iter().map(|t| t.id).collect();
        assert_eq!(
            ids,
            vec![ThemeId::Minimalist, ThemeId::Material, ThemeId::FoodFocused]
        );
    }

    #[test]
    fn test_get_by_id() {
        let theme = get(ThemeId::FoodFocused);
        assert_eq!(theme.colors.primary, "#FF6B35");
        assert_eq!(theme.typography.heading_font, "Poppins");
    }

    #[test]
    fn test_by_index_out_of_range() {
        assert!(by_index(2).is_ok());
        assert!(by_index(3).is_err());
    }

    #[test]
    fn test_colors_are_hex() {
        for theme in all() {
            for color in [
                &theme.colors.primary,
                &theme.colors.secondary,
                &theme.colors.accent,
                &theme.colors.background,
                &theme.colors.text,
            ] {
                assert!(color.starts_with('#') && color.len() == 7, "{}", color);
            }
        }
    }

    #[test]
    fn test_id_serializes_snake_case() {
        let json = serde_json::to_string(&ThemeId::FoodFocused).unwrap();
        assert_eq!(json, "\"food_focused\"");
    }
}
