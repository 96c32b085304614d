//! Embedded image processing
//!
//! Downscales and re-encodes images stored in buffer views. Codec work goes
//! through [`ImageCodec`] so the document bookkeeping stays independent of
//! the image library.

use anyhow::{Context, Result};
use glbslice_core::Document;
use glbslice_core::document::BufferView;
use image::DynamicImage;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::webp::WebPEncoder;
use image::imageops::FilterType;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fmt;
use std::io::Cursor;
use std::str::FromStr;

/// Texture extension naming a WebP image source
pub const EXT_TEXTURE_WEBP: &str = "EXT_texture_webp";

/// Target encoding for processed images
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Png,
    Jpeg,
    #[default]
    Webp,
}

impl ImageFormat {
    pub fn mime_type(self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Webp => "image/webp",
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Webp => "webp",
        })
    }
}

impl FromStr for ImageFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(ImageFormat::Png),
            "jpeg" | "jpg" => Ok(ImageFormat::Jpeg),
            "webp" => Ok(ImageFormat::Webp),
            other => Err(format!("unknown image format '{other}' (png, jpeg or webp)")),
        }
    }
}

/// `[images]` manifest section
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ImageSettings {
    /// Images wider than this are downscaled
    #[serde(default = "default_max_dimension")]
    pub max_width: u32,
    /// Images taller than this are downscaled
    #[serde(default = "default_max_dimension")]
    pub max_height: u32,
    /// Images smaller than this many KiB are left alone
    #[serde(default = "default_min_size_kb")]
    pub min_size_kb: u64,
    #[serde(default)]
    pub format: ImageFormat,
    /// JPEG quality (1-100); WebP output is lossless
    #[serde(default = "default_quality")]
    pub quality: u8,
}

fn default_max_dimension() -> u32 {
    1024
}

fn default_min_size_kb() -> u64 {
    50
}

fn default_quality() -> u8 {
    85
}

impl Default for ImageSettings {
    fn default() -> Self {
        Self {
            max_width: default_max_dimension(),
            max_height: default_max_dimension(),
            min_size_kb: default_min_size_kb(),
            format: ImageFormat::default(),
            quality: default_quality(),
        }
    }
}

/// Image decode/resize/encode capability
pub trait ImageCodec {
    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage>;

    /// Fit `image` inside `max_width` x `max_height`, keeping its aspect
    /// ratio; images already inside the box are returned unchanged
    fn resize(&self, image: DynamicImage, max_width: u32, max_height: u32) -> DynamicImage;

    fn encode(&self, image: &DynamicImage, format: ImageFormat, quality: u8) -> Result<Vec<u8>>;
}

/// [`ImageCodec`] backed by the `image` crate
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageCrateCodec;

impl ImageCodec for ImageCrateCodec {
    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage> {
        image::load_from_memory(bytes).context("Failed to decode image")
    }

    fn resize(&self, image: DynamicImage, max_width: u32, max_height: u32) -> DynamicImage {
        if image.width() <= max_width && image.height() <= max_height {
            return image;
        }
        image.resize(max_width, max_height, FilterType::Lanczos3)
    }

    fn encode(&self, image: &DynamicImage, format: ImageFormat, quality: u8) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        match format {
            ImageFormat::Png => image
                .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
                .context("Failed to encode PNG")?,
            ImageFormat::Jpeg => {
                let encoder = JpegEncoder::new_with_quality(&mut bytes, quality);
                DynamicImage::ImageRgb8(image.to_rgb8())
                    .write_with_encoder(encoder)
                    .context("Failed to encode JPEG")?
            }
            ImageFormat::Webp => {
                let encoder = WebPEncoder::new_lossless(&mut bytes);
                DynamicImage::ImageRgba8(image.to_rgba8())
                    .write_with_encoder(encoder)
                    .context("Failed to encode WebP")?
            }
        }
        Ok(bytes)
    }
}

/// What [`process_images`] did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImageReport {
    /// Re-encoded and repointed
    pub converted: usize,
    /// Under `min_size_kb`
    pub too_small: usize,
    /// Already inside the box and in the target format
    pub unchanged: usize,
    /// External URI images, which are never touched
    pub external: usize,
    /// Could not be decoded or encoded; left as they were
    pub failed: usize,
}

/// Downscale and re-encode every embedded image of `doc`
///
/// Re-encoded bytes are appended to the image's buffer as a new view and
/// the image is repointed; the old view is left for compaction to drop.
/// Codec failures keep the original image and are counted in the report.
///
/// # Errors
///
/// An image view that does not fit in its payload.
pub fn process_images(
    doc: &Document,
    settings: &ImageSettings,
    codec: &dyn ImageCodec,
) -> Result<(Document, ImageReport)> {
    let mut out = doc.clone();
    let mut report = ImageReport::default();
    let mut converted = BTreeSet::new();
    let min_bytes = settings.min_size_kb.saturating_mul(1024);
    let target_mime = settings.format.mime_type();

    for index in 0..out.images.len() {
        let Some(view) = out.images[index].buffer_view else {
            report.external += 1;
            continue;
        };
        let bytes = out
            .view_bytes(view)
            .with_context(|| format!("image {index}"))?
            .to_vec();
        if (bytes.len() as u64) < min_bytes {
            report.too_small += 1;
            continue;
        }

        let decoded = match codec.decode(&bytes) {
            Ok(image) => image,
            Err(e) => {
                tracing::warn!("Image {} left unchanged: {:#}", index, e);
                report.failed += 1;
                continue;
            }
        };
        let (width, height) = (decoded.width(), decoded.height());
        let needs_resize = width > settings.max_width || height > settings.max_height;
        let in_target_format = out.images[index].mime_type.as_deref() == Some(target_mime);
        if !needs_resize && in_target_format {
            report.unchanged += 1;
            continue;
        }

        let resized = codec.resize(decoded, settings.max_width, settings.max_height);
        let encoded = match codec.encode(&resized, settings.format, settings.quality) {
            Ok(encoded) => encoded,
            Err(e) => {
                tracing::warn!("Image {} left unchanged: {:#}", index, e);
                report.failed += 1;
                continue;
            }
        };

        tracing::debug!(
            "Image {}: {}x{} {} bytes -> {}x{} {} {} bytes",
            index,
            width,
            height,
            bytes.len(),
            resized.width(),
            resized.height(),
            settings.format,
            encoded.len()
        );
        let buffer = out.buffer_views[view].buffer;
        let new_view = append_view(&mut out, buffer, &encoded);
        let image = &mut out.images[index];
        image.buffer_view = Some(new_view);
        image.mime_type = Some(target_mime.to_string());
        converted.insert(index);
        report.converted += 1;
    }

    if !converted.is_empty() {
        sync_webp_extension(&mut out, &converted);
    }
    Ok((out, report))
}

/// Append `bytes` to buffer `buffer` at a 4-byte boundary as a new view
pub(crate) fn append_view(doc: &mut Document, buffer: usize, bytes: &[u8]) -> usize {
    let payload = &mut doc.payloads[buffer];
    let offset = payload.len().next_multiple_of(4);
    payload.resize(offset, 0);
    payload.extend_from_slice(bytes);
    doc.buffers[buffer].byte_length = payload.len();
    doc.buffer_views.push(BufferView::new(buffer, offset, bytes.len()));
    doc.buffer_views.len() - 1
}

/// Bring `EXT_texture_webp` in line with the re-encoded images
///
/// Only textures whose core or extension source is in `converted` change:
/// an extension source that is no longer WebP is dropped, and a core source
/// that became WebP is mirrored into the extension unless it already names
/// a WebP image. The core `source` stays in place so readers without WebP
/// support still resolve an image.
fn sync_webp_extension(doc: &mut Document, converted: &BTreeSet<usize>) {
    let webp: Vec<bool> = doc
        .images
        .iter()
        .map(|image| image.mime_type.as_deref() == Some(ImageFormat::Webp.mime_type()))
        .collect();
    let is_webp = |image: usize| webp.get(image).copied().unwrap_or(false);

    for texture in &mut doc.textures {
        let ext_source = texture
            .extensions
            .get(EXT_TEXTURE_WEBP)
            .and_then(|ext| ext.get("source"))
            .and_then(serde_json::Value::as_u64)
            .map(|source| source as usize);

        let has_webp_ext = ext_source.is_some_and(is_webp);
        if ext_source.is_some_and(|s| converted.contains(&s)) && !has_webp_ext {
            texture.extensions.remove(EXT_TEXTURE_WEBP);
            tracing::debug!("Dropped {} pointing at a re-encoded image", EXT_TEXTURE_WEBP);
        }

        let mirrored = texture
            .source
            .filter(|&source| converted.contains(&source) && is_webp(source));
        if let (Some(source), false) = (mirrored, has_webp_ext) {
            texture
                .extensions
                .insert(EXT_TEXTURE_WEBP.to_string(), serde_json::json!({ "source": source }));
        }
    }

    let any = doc
        .textures
        .iter()
        .any(|texture| texture.extensions.contains_key(EXT_TEXTURE_WEBP));
    let declared = doc.extensions_used.iter().any(|e| e == EXT_TEXTURE_WEBP);
    if any && !declared {
        doc.extensions_used.push(EXT_TEXTURE_WEBP.to_string());
    } else if !any && declared {
        doc.extensions_used.retain(|e| e != EXT_TEXTURE_WEBP);
        doc.extensions_required.retain(|e| e != EXT_TEXTURE_WEBP);
    }
}
