//! Container loading and saving
//!
//! Loads `.glb` and `.gltf` files into the document model and writes GLB.
//! External buffers and images are read relative to the source file and
//! folded into the document, so every loaded document can be saved as a
//! single GLB anywhere once compacted.

use anyhow::{Context, Result};
use glbslice_core::Document;
use glbslice_core::document::Buffer;
use std::path::Path;

use crate::texture::append_view;

const GLB_MAGIC: &[u8; 4] = b"glTF";

/// Load a `.glb` or `.gltf` file
pub fn load(path: &Path) -> Result<Document> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read asset: {}", path.display()))?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));

    let (json, bin) = if bytes.starts_with(GLB_MAGIC) {
        let glb = gltf::binary::Glb::from_slice(&bytes)
            .with_context(|| format!("Failed to parse GLB container: {}", path.display()))?;
        (glb.json.into_owned(), glb.bin.map(|bin| bin.into_owned()))
    } else {
        (bytes, None)
    };

    let mut doc = Document::from_json_slice(&json)
        .with_context(|| format!("Failed to parse glTF JSON: {}", path.display()))?;
    attach_payloads(&mut doc, bin, base_dir)
        .with_context(|| format!("Failed to load buffers of {}", path.display()))?;
    embed_images(&mut doc, base_dir)
        .with_context(|| format!("Failed to load images of {}", path.display()))?;

    tracing::debug!(
        "Loaded {}: {} nodes, {} meshes, {} buffers",
        path.display(),
        doc.nodes.len(),
        doc.meshes.len(),
        doc.buffers.len()
    );
    Ok(doc)
}

/// Resolve every buffer to an in-memory payload
///
/// The GLB BIN chunk backs the first buffer without a URI; other buffers
/// are read from files next to the asset. Data URIs are not supported.
fn attach_payloads(doc: &mut Document, mut bin: Option<Vec<u8>>, base_dir: &Path) -> Result<()> {
    let mut payloads = Vec::with_capacity(doc.buffers.len());

    for (index, buffer) in doc.buffers.iter_mut().enumerate() {
        let mut payload = match buffer.uri.take() {
            Some(uri) if uri.starts_with("data:") => {
                anyhow::bail!("buffer {index} uses a data URI, which is not supported")
            }
            Some(uri) => {
                let file = base_dir.join(&uri);
                std::fs::read(&file)
                    .with_context(|| format!("Failed to read buffer {index}: {}", file.display()))?
            }
            None => bin
                .take()
                .with_context(|| format!("buffer {index} has no URI and no BIN chunk"))?,
        };

        if payload.len() < buffer.byte_length {
            anyhow::bail!(
                "buffer {index} declares {} bytes but only {} are present",
                buffer.byte_length,
                payload.len()
            );
        }
        // BIN chunks carry up to 3 bytes of padding
        payload.truncate(buffer.byte_length);
        payloads.push(payload);
    }

    doc.payloads = payloads;
    Ok(())
}

/// Move images stored in files next to the asset into buffer 0
///
/// Data URIs are self-contained and stay as they are, as do URIs with a
/// scheme. The MIME type is sniffed from the bytes when the image does not
/// declare one.
fn embed_images(doc: &mut Document, base_dir: &Path) -> Result<()> {
    for index in 0..doc.images.len() {
        let Some(uri) = doc.images[index].uri.clone() else {
            continue;
        };
        if uri.starts_with("data:") {
            continue;
        }
        if uri.contains("://") {
            tracing::warn!("Image {} references {}, leaving it external", index, uri);
            continue;
        }

        let file = base_dir.join(&uri);
        let bytes = std::fs::read(&file)
            .with_context(|| format!("Failed to read image {index}: {}", file.display()))?;
        let mime_type = match doc.images[index].mime_type.clone() {
            Some(mime_type) => mime_type,
            None => image::guess_format(&bytes)
                .map(|format| format.to_mime_type().to_string())
                .with_context(|| format!("image {index} ({uri}) has an unknown format"))?,
        };

        if doc.buffers.is_empty() {
            doc.buffers.push(Buffer::default());
            doc.payloads.push(Vec::new());
        }
        let view = append_view(doc, 0, &bytes);
        let image = &mut doc.images[index];
        image.uri = None;
        image.buffer_view = Some(view);
        image.mime_type = Some(mime_type);
        tracing::debug!("Embedded image {} from {} ({} bytes)", index, uri, bytes.len());
    }
    Ok(())
}

/// Write `doc` as a GLB file, creating parent directories
pub fn save(doc: &Document, path: &Path) -> Result<()> {
    let bytes = glb_builder::assemble_glb(doc)
        .with_context(|| format!("Failed to encode GLB: {}", path.display()))?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    std::fs::write(path, &bytes)
        .with_context(|| format!("Failed to write asset: {}", path.display()))?;
    tracing::debug!("Wrote {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}
