//! glbslice.toml manifest parsing

use anyhow::{Context, Result};
use glbslice_core::{Alignment, DEFAULT_STRIPPED, Granularity};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::texture::ImageSettings;

/// Deepest recursive split the manifest may ask for
pub const MAX_SPLIT_DEPTH: usize = 8;

/// glbslice.toml manifest structure
#[derive(Debug, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub pipeline: PipelineSection,
    /// Image processing is skipped when the section is absent
    #[serde(default)]
    pub images: Option<ImageSettings>,
    #[serde(default)]
    pub output: OutputSection,
    #[serde(default)]
    pub assets: Vec<AssetEntry>,
}

/// Stage configuration shared by every asset
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PipelineSection {
    /// Levels of recursive splitting; 0 keeps each asset whole
    #[serde(default = "default_split_depth")]
    pub split_depth: usize,
    #[serde(default)]
    pub granularity: Granularity,
    /// Per-axis selectors; alignment is skipped when absent
    #[serde(default)]
    pub align: Option<Alignment>,
    /// Vertex attributes removed before compaction
    #[serde(default = "default_stripped")]
    pub strip_attributes: Vec<String>,
}

fn default_split_depth() -> usize {
    1
}

fn default_stripped() -> Vec<String> {
    DEFAULT_STRIPPED.iter().map(|s| s.to_string()).collect()
}

impl Default for PipelineSection {
    fn default() -> Self {
        Self {
            split_depth: default_split_depth(),
            granularity: Granularity::default(),
            align: None,
            strip_attributes: default_stripped(),
        }
    }
}

/// Output configuration
#[derive(Debug, Deserialize)]
pub struct OutputSection {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("out")
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
        }
    }
}

/// Single input entry
#[derive(Debug, Deserialize)]
pub struct AssetEntry {
    /// A `.glb`/`.gltf` file, or a directory scanned for them
    pub path: PathBuf,
    /// Output base name for a file entry; defaults to the file stem
    #[serde(default)]
    pub name: Option<String>,
}

impl Manifest {
    /// Load manifest from file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest: {}", path.display()))?;
        Self::parse(&content)
    }

    /// Parse manifest from string
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse glbslice.toml")
    }

    /// Validate manifest fields
    pub fn validate(&self) -> Result<()> {
        if self.assets.is_empty() {
            anyhow::bail!("No [[assets]] declared in glbslice.toml");
        }

        if self.pipeline.split_depth > MAX_SPLIT_DEPTH {
            anyhow::bail!(
                "Invalid split_depth {} in glbslice.toml (must be 0-{})",
                self.pipeline.split_depth,
                MAX_SPLIT_DEPTH
            );
        }

        if let Some(images) = &self.images {
            if images.max_width == 0 || images.max_height == 0 {
                anyhow::bail!(
                    "Invalid image box {}x{} in glbslice.toml (dimensions must be positive)",
                    images.max_width,
                    images.max_height
                );
            }
            if !(1..=100).contains(&images.quality) {
                anyhow::bail!(
                    "Invalid image quality {} in glbslice.toml (must be 1-100)",
                    images.quality
                );
            }
        }

        for entry in &self.assets {
            if let Some(name) = &entry.name
                && name.trim().is_empty()
            {
                anyhow::bail!("Asset {} has an empty name", entry.path.display());
            }
        }

        Ok(())
    }
}

/// A validated manifest and the directory its paths are relative to
pub struct ManifestContext {
    pub manifest: Manifest,
    pub project_dir: PathBuf,
}

impl ManifestContext {
    /// Output directory, honoring a command-line override
    pub fn output_dir(&self, override_dir: Option<&Path>) -> PathBuf {
        match override_dir {
            Some(dir) => dir.to_path_buf(),
            None => self.project_dir.join(&self.manifest.output.dir),
        }
    }
}

pub fn load_manifest(manifest_path: &Path) -> Result<ManifestContext> {
    let manifest = Manifest::load(manifest_path)?;
    manifest.validate()?;

    let project_dir = manifest_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf();

    Ok(ManifestContext {
        manifest,
        project_dir,
    })
}
