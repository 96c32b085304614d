//! Per-asset stage sequencing and batch processing
//!
//! An asset is split recursively to the configured depth; every leaf part
//! then runs prune, align, strip, compact, image processing and a second
//! compaction before it is saved as GLB. A failing asset never stops the
//! batch.

use anyhow::{Context, Result};
use glbslice_core::{
    AlignOutcome, BoundsProvider, Document, VertexBounds, align_with, compact,
    prune_nodes, split_document, strip_attributes,
};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::io;
use crate::manifest::{ManifestContext, PipelineSection};
use crate::sidecar::write_sidecar;
use crate::texture::{ImageCodec, ImageCrateCodec, ImageSettings, process_images};

/// File extensions picked up from input directories
pub const INPUT_EXTENSIONS: &[&str] = &["glb", "gltf"];

/// Stages and their collaborators
pub struct Pipeline<'a> {
    pub settings: &'a PipelineSection,
    /// Image processing runs only when set
    pub images: Option<&'a ImageSettings>,
    pub codec: &'a dyn ImageCodec,
    pub bounds: &'a dyn BoundsProvider,
}

/// Outcome of one asset
#[derive(Debug, Default)]
pub struct AssetReport {
    pub outputs: Vec<PathBuf>,
    /// Leaf parts with nothing left after pruning
    pub empty_parts: usize,
}

/// Outcome of a batch run
#[derive(Debug, Default)]
pub struct BatchReport {
    pub processed: usize,
    pub failed: usize,
    pub outputs: Vec<PathBuf>,
}

/// Output file stems handed out during one run
///
/// Stems are compared case-insensitively after sanitizing, so two parts
/// never write to the same file even on case-folding file systems.
#[derive(Debug, Default)]
pub struct OutputNames {
    taken: BTreeSet<String>,
}

impl OutputNames {
    /// Reserve the sanitized stem of `name`, appending `_<n>` when an
    /// earlier output already holds it
    pub fn claim(&mut self, name: &str) -> String {
        let stem = sanitize_name(name);
        if self.taken.insert(stem.to_lowercase()) {
            return stem;
        }
        let mut n = 1;
        loop {
            let candidate = format!("{stem}_{n}");
            if self.taken.insert(candidate.to_lowercase()) {
                tracing::warn!("Output {} is taken, writing {} instead", stem, candidate);
                return candidate;
            }
            n += 1;
        }
    }
}

impl<'a> Pipeline<'a> {
    /// Pipeline using the `image` crate codec and vertex bounds
    pub fn new(settings: &'a PipelineSection, images: Option<&'a ImageSettings>) -> Self {
        Self {
            settings,
            images,
            codec: &ImageCrateCodec,
            bounds: &VertexBounds,
        }
    }

    /// Split `doc` to the configured depth
    ///
    /// Level `k` parts are named `<parent>_level<k>-<discriminator>`. A part
    /// that yields nothing at the next level is kept whole.
    pub fn split_levels(&self, doc: Document, base: &str) -> Result<Vec<(String, Document)>> {
        let mut parts = vec![(base.to_string(), doc)];

        for level in 1..=self.settings.split_depth {
            let mut next = Vec::with_capacity(parts.len());
            for (name, doc) in parts {
                let split = split_document(
                    &doc,
                    &format!("{name}_level{level}"),
                    self.settings.granularity,
                )
                .with_context(|| format!("Failed to split {name} at level {level}"))?;

                if split.is_empty() {
                    tracing::debug!(
                        "{} does not split at level {}, keeping it whole",
                        name,
                        level
                    );
                    next.push((name, doc));
                } else {
                    next.extend(split.into_iter().map(|part| (part.name, part.document)));
                }
            }
            parts = next;
        }

        Ok(parts)
    }

    /// Run the leaf stages on one part and save it into `out_dir`
    ///
    /// Returns `None` when pruning leaves nothing to save.
    pub fn finish(
        &self,
        doc: &Document,
        name: &str,
        out_dir: &Path,
        names: &mut OutputNames,
    ) -> Result<Option<PathBuf>> {
        let (doc, pruned) = prune_nodes(doc).with_context(|| format!("Failed to prune {name}"))?;
        if pruned.removed > 0 {
            tracing::debug!(
                "{}: pruned {} nodes in {} rounds",
                name,
                pruned.removed,
                pruned.rounds
            );
        }
        if !doc.has_mesh_nodes() {
            tracing::info!("Skipping {}: no geometry", name);
            return Ok(None);
        }

        let file = out_dir.join(format!("{}.glb", names.claim(name)));

        let doc = match self.settings.align {
            Some(alignment) => match align_with(&doc, alignment, self.bounds)
                .with_context(|| format!("Failed to align {name}"))?
            {
                AlignOutcome::Aligned {
                    document,
                    translation,
                    record,
                } => {
                    tracing::debug!("{}: translated by {}", name, translation);
                    write_sidecar(&file, &record)?;
                    document
                }
                AlignOutcome::NoGeometry => {
                    tracing::info!("{}: nothing to align", name);
                    doc
                }
            },
            None => doc,
        };

        let (doc, _) = strip_attributes(&doc, &self.settings.strip_attributes);
        let (mut doc, stats) =
            compact(&doc).with_context(|| format!("Failed to compact {name}"))?;
        tracing::debug!(
            "{}: dropped {} meshes, {} materials, {} textures, {} accessors; {} -> {} bytes",
            name,
            stats.meshes,
            stats.materials,
            stats.textures,
            stats.accessors,
            stats.bytes_before,
            stats.bytes_after
        );

        if let Some(images) = self.images {
            let (processed, report) = process_images(&doc, images, self.codec)
                .with_context(|| format!("Failed to process images of {name}"))?;
            if report.converted > 0 {
                tracing::debug!("{}: re-encoded {} images", name, report.converted);
                doc = compact(&processed)
                    .with_context(|| format!("Failed to compact {name}"))?
                    .0;
            }
        }

        io::save(&doc, &file)?;
        tracing::info!("Wrote {}", file.display());
        Ok(Some(file))
    }

    /// Load `input`, split it and write every leaf part to `out_dir`
    pub fn process_asset(&self, input: &Path, base: &str, out_dir: &Path) -> Result<AssetReport> {
        self.process_asset_with(input, base, out_dir, &mut OutputNames::default())
    }

    /// [`Pipeline::process_asset`] sharing output names with other assets
    pub fn process_asset_with(
        &self,
        input: &Path,
        base: &str,
        out_dir: &Path,
        names: &mut OutputNames,
    ) -> Result<AssetReport> {
        let doc = io::load(input)?;
        let mut report = AssetReport::default();

        for (name, part) in self.split_levels(doc, base)? {
            match self.finish(&part, &name, out_dir, names)? {
                Some(file) => report.outputs.push(file),
                None => report.empty_parts += 1,
            }
        }

        if report.outputs.is_empty() {
            tracing::warn!("{}: no parts written", input.display());
        }
        Ok(report)
    }
}

/// Replace every character outside `[A-Za-z0-9_-]` with `_`
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Expand manifest entries into `(input file, base name)` pairs
///
/// Directories are scanned recursively for [`INPUT_EXTENSIONS`] in sorted
/// order; their files are named after their stems. A base name that repeats
/// gets `_<n>` appended.
pub fn collect_inputs(ctx: &ManifestContext) -> Result<Vec<(PathBuf, String)>> {
    let mut inputs = Vec::new();

    for entry in &ctx.manifest.assets {
        let path = ctx.project_dir.join(&entry.path);
        if path.is_dir() {
            for file in WalkDir::new(&path).sort_by_file_name() {
                let file = file
                    .with_context(|| format!("Failed to scan directory: {}", path.display()))?;
                if file.file_type().is_file() && has_input_extension(file.path()) {
                    inputs.push((file.path().to_path_buf(), file_stem(file.path())));
                }
            }
        } else if path.is_file() {
            let name = entry.name.clone().unwrap_or_else(|| file_stem(&path));
            inputs.push((path, name));
        } else {
            anyhow::bail!("Asset not found: {}", path.display());
        }
    }

    Ok(unique_bases(inputs))
}

fn unique_bases(inputs: Vec<(PathBuf, String)>) -> Vec<(PathBuf, String)> {
    let mut seen: BTreeMap<String, usize> = BTreeMap::new();
    inputs
        .into_iter()
        .map(|(path, base)| {
            let count = seen.entry(sanitize_name(&base).to_lowercase()).or_default();
            *count += 1;
            if *count == 1 {
                return (path, base);
            }
            let renamed = format!("{base}_{}", *count - 1);
            tracing::warn!(
                "{} shares the name '{}' with an earlier input, using '{}'",
                path.display(),
                base,
                renamed
            );
            (path, renamed)
        })
        .collect()
}

/// Process every asset of the manifest into the output directory
///
/// Assets run sequentially. A failing asset is logged and skipped; the run
/// fails only if every asset failed.
pub fn build_all(ctx: &ManifestContext, output_override: Option<&Path>) -> Result<BatchReport> {
    let out_dir = ctx.output_dir(output_override);
    let inputs = collect_inputs(ctx)?;
    if inputs.is_empty() {
        tracing::warn!("No .glb/.gltf inputs found");
        return Ok(BatchReport::default());
    }

    let pipeline = Pipeline::new(&ctx.manifest.pipeline, ctx.manifest.images.as_ref());
    let mut report = BatchReport::default();
    let mut names = OutputNames::default();

    for (input, name) in &inputs {
        tracing::info!("Processing {}", input.display());
        match pipeline.process_asset_with(input, name, &out_dir, &mut names) {
            Ok(asset) => {
                report.processed += 1;
                report.outputs.extend(asset.outputs);
            }
            Err(e) => {
                tracing::error!("Skipping {}: {:#}", input.display(), e);
                report.failed += 1;
            }
        }
    }

    tracing::info!(
        "{} assets processed, {} failed, {} files written",
        report.processed,
        report.failed,
        report.outputs.len()
    );
    if report.processed == 0 {
        anyhow::bail!("All {} assets failed", report.failed);
    }
    Ok(report)
}

fn has_input_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| INPUT_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "asset".to_string())
}
