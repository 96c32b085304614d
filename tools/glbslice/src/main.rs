//! glbslice - GLB asset slicing tool
//!
//! Splits scenes into independent parts, prunes and compacts them, aligns
//! them to a reference point and re-encodes their embedded images.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use glbslice_core::{Alignment, BoundsProvider, Granularity, VertexBounds, dead_nodes};
use std::path::{Path, PathBuf};

use glbslice::{OutputNames, Pipeline, PipelineSection, io, manifest, pipeline};

#[derive(Parser)]
#[command(name = "glbslice")]
#[command(about = "GLB asset slicing tool")]
#[command(version)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process every asset listed in a manifest
    Build {
        /// Path to glbslice.toml manifest
        #[arg(default_value = "glbslice.toml")]
        manifest: PathBuf,

        /// Output directory (overrides manifest)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate manifest without building
    Check {
        /// Path to glbslice.toml manifest
        #[arg(default_value = "glbslice.toml")]
        manifest: PathBuf,
    },

    /// Split a single asset into self-contained parts
    Split {
        /// Input glTF/GLB file
        input: PathBuf,

        /// Output directory (default: next to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Levels of recursive splitting
        #[arg(short, long, default_value_t = 1)]
        depth: usize,

        /// Split on top-level roots or on their children
        #[arg(short, long, default_value_t = Granularity::Children)]
        granularity: Granularity,
    },

    /// Prune, strip attributes and compact a single asset
    Clean {
        /// Input glTF/GLB file
        input: PathBuf,

        /// Output .glb file (default: <stem>_clean.glb)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Vertex attributes to remove, comma separated
        #[arg(short, long, value_delimiter = ',')]
        strip: Vec<String>,
    },

    /// Move a single asset so a point of its bounding box sits at the origin
    Align {
        /// Input glTF/GLB file
        input: PathBuf,

        /// Per-axis selectors: -1 min face, 0 center, 1 max face
        #[arg(short, long, default_value = "0,-1,0", allow_hyphen_values = true)]
        align: Alignment,

        /// Output .glb file (default: <stem>_aligned.glb)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print a summary of an asset
    Inspect {
        /// Input glTF/GLB file
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    match cli.command {
        Commands::Build { manifest, output } => {
            tracing::info!("Building assets from {:?}", manifest);
            let ctx = manifest::load_manifest(&manifest)?;
            pipeline::build_all(&ctx, output.as_deref())?;
            tracing::info!("Build complete!");
        }

        Commands::Check { manifest } => {
            tracing::info!("Checking manifest {:?}", manifest);
            let ctx = manifest::load_manifest(&manifest)?;
            let inputs = pipeline::collect_inputs(&ctx)?;
            tracing::info!("Manifest is valid! {} input files", inputs.len());
        }

        Commands::Split {
            input,
            output,
            depth,
            granularity,
        } => {
            let out_dir = output.unwrap_or_else(|| parent_dir(&input));
            let settings = PipelineSection {
                split_depth: depth,
                granularity,
                align: None,
                strip_attributes: Vec::new(),
            };
            let report =
                Pipeline::new(&settings, None).process_asset(&input, &stem(&input), &out_dir)?;
            tracing::info!("Done! {} parts written", report.outputs.len());
        }

        Commands::Clean {
            input,
            output,
            strip,
        } => {
            let output = output.unwrap_or_else(|| sibling(&input, "clean"));
            let settings = PipelineSection {
                split_depth: 0,
                strip_attributes: strip,
                ..PipelineSection::default()
            };
            run_single(&settings, &input, &output)?;
        }

        Commands::Align {
            input,
            align,
            output,
        } => {
            let output = output.unwrap_or_else(|| sibling(&input, "aligned"));
            let settings = PipelineSection {
                split_depth: 0,
                align: Some(align),
                strip_attributes: Vec::new(),
                ..PipelineSection::default()
            };
            run_single(&settings, &input, &output)?;
        }

        Commands::Inspect { input } => inspect(&input)?,
    }

    Ok(())
}

/// Run the leaf stages on one file and write it to `output`
fn run_single(settings: &PipelineSection, input: &Path, output: &Path) -> Result<()> {
    tracing::info!("Converting {:?} -> {:?}", input, output);
    let doc = io::load(input)?;
    let name = stem(output);
    let written = Pipeline::new(settings, None).finish(
        &doc,
        &name,
        &parent_dir(output),
        &mut OutputNames::default(),
    )?;
    match written {
        Some(file) => tracing::info!("Done! Wrote {}", file.display()),
        None => tracing::warn!("Nothing written: {:?} has no geometry", input),
    }
    Ok(())
}

fn inspect(input: &Path) -> Result<()> {
    let doc = io::load(input)?;
    let roots = doc
        .top_level_roots()
        .with_context(|| format!("Invalid scene in {}", input.display()))?;
    let dead = dead_nodes(&doc.nodes)?.into_iter().filter(|d| *d).count();
    let payload: usize = doc.payloads.iter().map(Vec::len).sum();

    println!("{}", input.display());
    println!("  scenes:       {}", doc.scenes.len());
    println!("  roots:        {}", roots.len());
    println!("  nodes:        {} ({} without geometry)", doc.nodes.len(), dead);
    println!("  meshes:       {}", doc.meshes.len());
    println!("  materials:    {}", doc.materials.len());
    println!("  textures:     {}", doc.textures.len());
    println!("  images:       {}", doc.images.len());
    println!("  accessors:    {}", doc.accessors.len());
    println!("  buffer views: {}", doc.buffer_views.len());
    println!("  payload:      {} bytes in {} buffers", payload, doc.buffers.len());
    for (i, root) in roots.iter().enumerate() {
        let node = &doc.nodes[*root];
        println!(
            "  root {}: {} ({} children)",
            i,
            node.name.as_deref().unwrap_or("<unnamed>"),
            node.children.len()
        );
    }
    match VertexBounds.world_bounds(&doc)? {
        Some(bounds) => println!(
            "  bounds:       min {} max {} size {}",
            bounds.min,
            bounds.max,
            bounds.size()
        ),
        None => println!("  bounds:       no geometry"),
    }
    Ok(())
}

fn stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "asset".to_string())
}

fn parent_dir(path: &Path) -> PathBuf {
    path.parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// `<dir>/<stem>_<suffix>.glb`
fn sibling(input: &Path, suffix: &str) -> PathBuf {
    input.with_file_name(format!("{}_{suffix}.glb", stem(input)))
}
