//! Durable checkpoint storage for run artifacts.
//!
//! Every workflow checkpoint persists its artifact under the output
//! directory before the next user prompt, so a crash never loses the last
//! accepted step. The JSON files are the authoritative, human-editable
//! checkpoints; a hand-edited specification is accepted as long as it is
//! well-formed.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::debug;

use crate::spec::Specification;

pub const IDEA_FILE: &str = "idea.json";
pub const THEME_FILE: &str = "theme.json";
pub const SPEC_FILE: &str = "specification.json";
pub const SPEC_MD_FILE: &str = "specification.md";
pub const SPEC_FINAL_FILE: &str = "specification_final.json";
pub const SPEC_FINAL_MD_FILE: &str = "specification_final.md";
pub const FOLDER_STRUCTURE_FILE: &str = "folder_structure.json";

pub struct ArtifactStore {
    output_dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(output_dir: impl Into<PathBuf>) -> Result<Self> {
        let output_dir = output_dir.into();
        fs::create_dir_all(&output_dir)
            .with_context(|| format!("Failed to create output directory: {:?}", output_dir))?;
        Ok(Self { output_dir })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn path_of(&self, name: &str) -> PathBuf {
        self.output_dir.join(name)
    }

    pub fn save_json<T: Serialize>(&self, name: &str, value: &T) -> Result<()> {
        let path = self.path_of(name);
        let content = serde_json::to_string_pretty(value)
            .with_context(|| format!("Failed to serialize artifact: {}", name))?;
        fs::write(&path, content)
            .with_context(|| format!("Failed to write artifact: {:?}", path))?;
        debug!("Checkpoint saved: {:?}", path);
        Ok(())
    }

    pub fn save_text(&self, name: &str, text: &str) -> Result<()> {
        let path = self.path_of(name);
        fs::write(&path, text)
            .with_context(|| format!("Failed to write artifact: {:?}", path))?;
        debug!("Checkpoint saved: {:?}", path);
        Ok(())
    }

    /// Reload a specification checkpoint, accepting any well-formed
    /// instance of the document shape regardless of whether it came from
    /// the document model or manual editing.
    pub fn load_specification(&self, name: &str) -> Result<Specification> {
        let path = self.path_of(name);
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read artifact: {:?}", path))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Artifact is not a valid specification: {:?}", path))
    }
}
