//! Accessors, buffer views and buffers

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// glTF accessor component types
pub mod component_type {
    pub const BYTE: u32 = 5120;
    pub const UNSIGNED_BYTE: u32 = 5121;
    pub const SHORT: u32 = 5122;
    pub const UNSIGNED_SHORT: u32 = 5123;
    pub const UNSIGNED_INT: u32 = 5125;
    pub const FLOAT: u32 = 5126;
}

/// Typed view over the bytes of a buffer view
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Accessor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buffer_view: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub byte_offset: Option<usize>,
    pub component_type: u32,
    pub count: usize,
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sparse: Option<Sparse>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl Accessor {
    /// Every buffer view this accessor reads, sparse storage included
    pub fn buffer_view_refs(&self) -> impl Iterator<Item = usize> + '_ {
        self.buffer_view.into_iter().chain(
            self.sparse
                .iter()
                .flat_map(|s| [s.indices.buffer_view, s.values.buffer_view]),
        )
    }

    /// Rewrite every buffer view reference through `f`
    pub fn remap_buffer_views<E>(
        &mut self,
        mut f: impl FnMut(usize) -> Result<usize, E>,
    ) -> Result<(), E> {
        if let Some(view) = self.buffer_view.as_mut() {
            *view = f(*view)?;
        }
        if let Some(sparse) = self.sparse.as_mut() {
            sparse.indices.buffer_view = f(sparse.indices.buffer_view)?;
            sparse.values.buffer_view = f(sparse.values.buffer_view)?;
        }
        Ok(())
    }

    /// Size in bytes of one element, or `None` for an unknown type
    pub fn element_size(&self) -> Option<usize> {
        let components = match self.type_.as_str() {
            "SCALAR" => 1,
            "VEC2" => 2,
            "VEC3" => 3,
            "VEC4" | "MAT2" => 4,
            "MAT3" => 9,
            "MAT4" => 16,
            _ => return None,
        };
        let bytes = match self.component_type {
            component_type::BYTE | component_type::UNSIGNED_BYTE => 1,
            component_type::SHORT | component_type::UNSIGNED_SHORT => 2,
            component_type::UNSIGNED_INT | component_type::FLOAT => 4,
            _ => return None,
        };
        Some(components * bytes)
    }
}

/// Sparse substitution storage of an accessor
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sparse {
    pub count: usize,
    pub indices: SparseStorage,
    pub values: SparseStorage,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SparseStorage {
    pub buffer_view: usize,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

/// Byte range of a buffer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BufferView {
    pub buffer: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub byte_offset: Option<usize>,
    pub byte_length: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub byte_stride: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl BufferView {
    pub fn new(buffer: usize, byte_offset: usize, byte_length: usize) -> Self {
        Self {
            buffer,
            byte_offset: Some(byte_offset),
            byte_length,
            ..Self::default()
        }
    }

    /// Start offset, defaulting to zero
    pub fn offset(&self) -> usize {
        self.byte_offset.unwrap_or(0)
    }

    /// Exclusive end offset, `None` if it does not fit in `usize`
    pub fn end(&self) -> Option<usize> {
        self.offset().checked_add(self.byte_length)
    }
}

/// Buffer descriptor; the bytes live in [`crate::Document::payloads`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Buffer {
    pub byte_length: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sparse_views_are_referenced() {
        let mut accessor: Accessor = serde_json::from_value(json!({
            "bufferView": 1,
            "componentType": 5126,
            "count": 8,
            "type": "VEC3",
            "sparse": {
                "count": 2,
                "indices": { "bufferView": 4, "componentType": 5123 },
                "values": { "bufferView": 6 }
            }
        }))
        .unwrap();

        assert_eq!(accessor.buffer_view_refs().collect::<Vec<_>>(), vec![1, 4, 6]);

        accessor.remap_buffer_views::<()>(|v| Ok(v / 2)).unwrap();
        assert_eq!(accessor.buffer_view_refs().collect::<Vec<_>>(), vec![0, 2, 3]);

        let sparse = accessor.sparse.as_ref().unwrap();
        assert_eq!(sparse.indices.other.get("componentType"), Some(&json!(5123)));
    }

    #[test]
    fn test_element_size() {
        let accessor = Accessor {
            component_type: component_type::FLOAT,
            type_: "VEC3".into(),
            ..Accessor::default()
        };
        assert_eq!(accessor.element_size(), Some(12));

        let indices = Accessor {
            component_type: component_type::UNSIGNED_SHORT,
            type_: "SCALAR".into(),
            ..Accessor::default()
        };
        assert_eq!(indices.element_size(), Some(2));
    }

    #[test]
    fn test_view_defaults() {
        let view: BufferView =
            serde_json::from_value(json!({ "buffer": 0, "byteLength": 16 })).unwrap();
        assert_eq!(view.offset(), 0);
        assert_eq!(view.end(), Some(16));
    }

    #[test]
    fn test_view_end_overflow() {
        let view = BufferView::new(0, usize::MAX - 2, 8);
        assert_eq!(view.end(), None);
    }
}
