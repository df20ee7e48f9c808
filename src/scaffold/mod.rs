//! Deterministic scaffold planning and materialization.
//!
//! `build` maps an app name and a specification to an ordered
//! [`ScaffoldPlan`]; identical inputs always yield the identical plan.
//! `materialize` writes the planned tree to disk with template stub
//! content, which the synthesizer later overwrites (last-writer-wins).

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::spec::Specification;
use crate::themes::Theme;

pub mod templates;

/// Directory set emitted for every plan, independent of specification
/// content.
pub const FIXED_DIRECTORIES: [&str; 12] = [
    "lib/models",
    "lib/screens",
    "lib/widgets",
    "lib/services",
    "lib/utils",
    "lib/constants",
    "assets/images",
    "assets/fonts",
    "assets/icons",
    "test/widget_test",
    "test/unit_test",
    "test/integration_test",
];

/// Names the content template for a planned file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    Manifest,
    EntryPoint,
    IgnoreRules,
    LintConfig,
    Readme,
    ThemeColors,
    Strings,
    Themes,
    Screen,
    Model,
}

impl FileKind {
    /// Units the code synthesizer generates content for; the rest keep
    /// their static template content.
    pub fn is_generated(&self) -> bool {
        matches!(
            self,
            FileKind::EntryPoint | FileKind::Screen | FileKind::Model | FileKind::ThemeColors
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedFile {
    /// Path relative to the app directory.
    pub path: String,
    pub kind: FileKind,
    /// Display name of the screen/model the file was derived from; empty
    /// for fixed files.
    #[serde(default)]
    pub subject: String,
}

/// Derived, read-only layout: ordered directories plus ordered file
/// entries. Serialized as `folder_structure.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScaffoldPlan {
    pub app_name: String,
    pub directories: Vec<String>,
    pub files: Vec<PlannedFile>,
}

impl ScaffoldPlan {
    /// Files the synthesizer will issue generation calls for, in plan
    /// order.
    pub fn generation_units(&self) -> impl Iterator<Item = &PlannedFile> {
        self.files.iter().filter(|f| f.kind.is_generated())
    }

    /// Plain-text tree rendering for the scaffold checkpoint display.
    pub fn render_tree(&self) -> String {
        let mut lines = vec![format!("{}/", self.app_name)];
        for dir in &self.directories {
            lines.push(format!("  {}/", dir));
        }
        for file in &self.files {
            lines.push(format!("  {}", file.path));
        }
        lines.join("\n")
    }
}

#[derive(Error, Debug)]
pub enum ScaffoldError {
    /// Slugification produced an empty string.
    #[error("invalid name {0:?}: slugifies to an empty string")]
    InvalidName(String),
    /// Two distinct specification entries mapped to the same file path.
    /// The first occurrence wins; the rest are reported here.
    #[error("duplicate scaffold targets: {}", duplicates.join(", "))]
    DuplicateTarget { duplicates: Vec<String> },
    /// The output directory for the app already exists.
    #[error("output directory already exists: {0}")]
    TargetExists(PathBuf),
    #[error("failed to write scaffold: {0}")]
    Io(#[from] std::io::Error),
}

/// Lower-case, whitespace to underscores, all other non-alphanumerics
/// stripped. Idempotent: slugifying a slug returns it unchanged.
pub fn slugify(input: &str) -> String {
    let filtered: String = input
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace() || *c == '_')
        .collect();
    filtered.split_whitespace().collect::<Vec<_>>().join("_")
}

/// Compute the deterministic plan for `(app_name, spec)`.
///
/// Fails with [`ScaffoldError::InvalidName`] when any name slugifies to
/// nothing and [`ScaffoldError::DuplicateTarget`] when two entries claim
/// the same path.
pub fn build(app_name: &str, spec: &Specification) -> Result<ScaffoldPlan, ScaffoldError> {
    let (plan, duplicates) = plan_with_duplicates(app_name, spec)?;
    if !duplicates.is_empty() {
        return Err(ScaffoldError::DuplicateTarget { duplicates });
    }
    Ok(plan)
}

/// Plan construction with duplicate reporting: the returned plan keeps
/// the first occurrence of every contested path, and the second value
/// lists each dropped duplicate.
pub fn plan_with_duplicates(
    app_name: &str,
    spec: &Specification,
) -> Result<(ScaffoldPlan, Vec<String>), ScaffoldError> {
    let app_slug = slugify(app_name);
    if app_slug.is_empty() {
        return Err(ScaffoldError::InvalidName(app_name.to_string()));
    }

    let mut files = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut duplicates = Vec::new();
    let mut push = |file: PlannedFile| {
        if seen.insert(file.path.clone()) {
            files.push(file);
        } else {
            duplicates.push(file.path);
        }
    };

    let fixed = [
        ("pubspec.yaml", FileKind::Manifest),
        ("lib/main.dart", FileKind::EntryPoint),
        (".gitignore", FileKind::IgnoreRules),
        ("analysis_options.yaml", FileKind::LintConfig),
        ("README.md", FileKind::Readme),
        ("lib/constants/colors.dart", FileKind::ThemeColors),
        ("lib/constants/strings.dart", FileKind::Strings),
        ("lib/constants/themes.dart", FileKind::Themes),
    ];
    for (path, kind) in fixed {
        push(PlannedFile {
            path: path.to_string(),
            kind,
            subject: String::new(),
        });
    }

    for model in &spec.data_models {
        let slug = slugify(&model.name);
        if slug.is_empty() {
            return Err(ScaffoldError::InvalidName(model.name.clone()));
        }
        push(PlannedFile {
            path: format!("lib/models/{}.dart", slug),
            kind: FileKind::Model,
            subject: model.name.clone(),
        });
    }

    for screen in &spec.screens {
        let slug = slugify(&screen.name);
        if slug.is_empty() {
            return Err(ScaffoldError::InvalidName(screen.name.clone()));
        }
        push(PlannedFile {
            path: format!("lib/screens/{}_screen.dart", slug),
            kind: FileKind::Screen,
            subject: screen.name.clone(),
        });
    }

    let plan = ScaffoldPlan {
        app_name: app_slug,
        directories: FIXED_DIRECTORIES.iter().map(|d| d.to_string()).collect(),
        files,
    };
    debug!(
        "Planned {} directories and {} files for {}",
        plan.directories.len(),
        plan.files.len(),
        plan.app_name
    );
    Ok((plan, duplicates))
}

/// Create the planned tree under `output_dir` with template stub content.
///
/// Refuses to touch an existing app directory; collisions are an error,
/// never silently resolved.
pub fn materialize(
    plan: &ScaffoldPlan,
    output_dir: &Path,
    theme: &Theme,
) -> Result<PathBuf, ScaffoldError> {
    let app_dir = output_dir.join(&plan.app_name);
    if app_dir.exists() {
        return Err(ScaffoldError::TargetExists(app_dir));
    }

    fs::create_dir_all(&app_dir)?;
    for dir in &plan.directories {
        fs::create_dir_all(app_dir.join(dir))?;
    }
    for file in &plan.files {
        let path = app_dir.join(&file.path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, templates::render(file, &plan.app_name, theme))?;
    }

    info!("Scaffold created at {}", app_dir.display());
    Ok(app_dir)
}
