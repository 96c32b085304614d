//! glbslice library
//!
//! Container I/O, image processing, manifest handling and the per-asset
//! pipeline built on `glbslice-core`. The `glbslice` binary is a thin CLI
//! over these modules.

pub mod io;
pub mod manifest;
pub mod pipeline;
pub mod sidecar;
pub mod texture;

pub use manifest::{Manifest, ManifestContext, PipelineSection, load_manifest};
pub use pipeline::{AssetReport, BatchReport, OutputNames, Pipeline, build_all, sanitize_name};
pub use texture::{ImageCodec, ImageCrateCodec, ImageFormat, ImageReport, ImageSettings};
