//! Utility functions for GLB construction

use glbslice_core::{Document, Error, Result};

const GLB_MAGIC: &[u8; 4] = b"glTF";
const GLB_VERSION: u32 = 2;
const CHUNK_JSON: u32 = 0x4E4F534A; // "JSON"
const CHUNK_BIN: u32 = 0x004E4942; // "BIN\0"

/// Compute bounding box for positions
pub fn compute_bounds(positions: &[[f32; 3]]) -> (Vec<f64>, Vec<f64>) {
    let mut min = [f32::MAX; 3];
    let mut max = [f32::MIN; 3];

    for pos in positions {
        for i in 0..3 {
            min[i] = min[i].min(pos[i]);
            max[i] = max[i].max(pos[i]);
        }
    }

    (
        min.iter().map(|&v| v as f64).collect(),
        max.iter().map(|&v| v as f64).collect(),
    )
}

/// Align buffer to 4-byte boundary
pub fn align_buffer(buffer: &mut Vec<u8>) {
    while buffer.len() % 4 != 0 {
        buffer.push(0);
    }
}

/// Serialize `doc` as a GLB container
///
/// The document must hold at most one buffer, and that buffer must not
/// point at an external URI; its payload becomes the BIN chunk.
pub fn assemble_glb(doc: &Document) -> Result<Vec<u8>> {
    if doc.buffers.len() > 1 {
        return Err(Error::Unsupported(format!(
            "GLB holds one buffer, document has {}",
            doc.buffers.len()
        )));
    }
    if let Some(uri) = doc.buffers.first().and_then(|b| b.uri.as_deref()) {
        return Err(Error::Unsupported(format!(
            "buffer 0 points at '{uri}', GLB buffers must be embedded"
        )));
    }

    let json = doc.to_json_vec()?;
    let bin = if doc.buffers.is_empty() {
        None
    } else {
        Some(doc.payload(0)?)
    };
    Ok(glb_bytes(&json, bin))
}

/// Assemble GLB binary from JSON and buffer data
///
/// The BIN chunk is omitted when there is no buffer data.
pub fn glb_bytes(json_bytes: &[u8], buffer_data: Option<&[u8]>) -> Vec<u8> {
    let buffer_data = buffer_data.filter(|data| !data.is_empty());

    // Pad JSON to 4-byte alignment
    let json_padding = (4 - (json_bytes.len() % 4)) % 4;
    let json_chunk_length = json_bytes.len() + json_padding;

    // Pad buffer to 4-byte alignment
    let buffer_chunk_length = buffer_data.map_or(0, |data| data.len().next_multiple_of(4));

    // Total file length
    let mut total_length = 12 + 8 + json_chunk_length;
    if buffer_data.is_some() {
        total_length += 8 + buffer_chunk_length;
    }

    let mut glb = Vec::with_capacity(total_length);

    // GLB header
    glb.extend_from_slice(GLB_MAGIC);
    glb.extend_from_slice(&GLB_VERSION.to_le_bytes());
    glb.extend_from_slice(&(total_length as u32).to_le_bytes());

    // JSON chunk
    glb.extend_from_slice(&(json_chunk_length as u32).to_le_bytes());
    glb.extend_from_slice(&CHUNK_JSON.to_le_bytes());
    glb.extend_from_slice(json_bytes);
    glb.resize(glb.len() + json_padding, 0x20); // Space for JSON padding

    // Binary chunk
    if let Some(data) = buffer_data {
        glb.extend_from_slice(&(buffer_chunk_length as u32).to_le_bytes());
        glb.extend_from_slice(&CHUNK_BIN.to_le_bytes());
        glb.extend_from_slice(data);
        align_buffer(&mut glb);
    }

    glb
}
