//! Low-level buffer packing with automatic alignment and accessor creation

use glbslice_core::document::{Accessor, BufferView, component_type};

use crate::utils::{align_buffer, compute_bounds};

/// Builder for binary buffer with automatic alignment
///
/// Every packed array gets its own buffer view in buffer 0, starting on a
/// 4-byte boundary.
#[derive(Debug, Default)]
pub struct BufferBuilder {
    buffer: Vec<u8>,
    views: Vec<BufferView>,
    accessors: Vec<Accessor>,
}

impl BufferBuilder {
    /// Create a new empty buffer builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the current accessor count
    pub fn accessor_count(&self) -> usize {
        self.accessors.len()
    }

    /// Get the binary buffer data
    pub fn data(&self) -> &[u8] {
        &self.buffer
    }

    /// Get the buffer views
    pub fn views(&self) -> &[BufferView] {
        &self.views
    }

    /// Get the accessors
    pub fn accessors(&self) -> &[Accessor] {
        &self.accessors
    }

    /// Consume the builder, returning payload, views and accessors
    pub fn into_parts(self) -> (Vec<u8>, Vec<BufferView>, Vec<Accessor>) {
        (self.buffer, self.views, self.accessors)
    }

    /// Pack raw bytes (encoded images, custom data) into a new view
    ///
    /// Returns the buffer view index.
    pub fn pack_bytes(&mut self, bytes: &[u8]) -> usize {
        let offset = self.buffer.len();
        self.buffer.extend_from_slice(bytes);
        self.views.push(BufferView::new(0, offset, bytes.len()));
        align_buffer(&mut self.buffer);
        self.views.len() - 1
    }

    fn push_accessor(
        &mut self,
        view: usize,
        component_type: u32,
        count: usize,
        type_: &str,
        bounds: Option<(Vec<f64>, Vec<f64>)>,
    ) -> usize {
        let (min, max) = bounds.unzip();
        self.accessors.push(Accessor {
            buffer_view: Some(view),
            byte_offset: Some(0),
            component_type,
            count,
            type_: type_.to_string(),
            min,
            max,
            ..Accessor::default()
        });
        self.accessors.len() - 1
    }

    /// Pack Vec3 positions with bounds calculation
    pub fn pack_positions(&mut self, positions: &[[f32; 3]]) -> usize {
        let view = self.pack_bytes(bytemuck::cast_slice(positions));
        let bounds = compute_bounds(positions);
        self.push_accessor(
            view,
            component_type::FLOAT,
            positions.len(),
            "VEC3",
            Some(bounds),
        )
    }

    /// Pack Vec3 data (normals, tangents, etc.)
    pub fn pack_vec3(&mut self, data: &[[f32; 3]]) -> usize {
        let view = self.pack_bytes(bytemuck::cast_slice(data));
        self.push_accessor(view, component_type::FLOAT, data.len(), "VEC3", None)
    }

    /// Pack Vec2 data (UVs, etc.)
    pub fn pack_vec2(&mut self, data: &[[f32; 2]]) -> usize {
        let view = self.pack_bytes(bytemuck::cast_slice(data));
        self.push_accessor(view, component_type::FLOAT, data.len(), "VEC2", None)
    }

    /// Pack Vec4 data (colors, tangents with handedness, etc.)
    pub fn pack_vec4(&mut self, data: &[[f32; 4]]) -> usize {
        let view = self.pack_bytes(bytemuck::cast_slice(data));
        self.push_accessor(view, component_type::FLOAT, data.len(), "VEC4", None)
    }

    /// Pack u16 indices
    pub fn pack_indices_u16(&mut self, indices: &[u16]) -> usize {
        let view = self.pack_bytes(bytemuck::cast_slice(indices));
        self.push_accessor(
            view,
            component_type::UNSIGNED_SHORT,
            indices.len(),
            "SCALAR",
            None,
        )
    }
}
