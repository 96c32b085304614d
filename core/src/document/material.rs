//! Materials, textures and images
//!
//! Materials reference textures through five core slots and through texture
//! slots inside material extensions. Both kinds are enumerated here so the
//! compactor never has to know which slot a reference came from.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::error::{Error, Result};

/// Texture slots carried by material extensions, per extension name
pub const EXTENSION_TEXTURE_SLOTS: &[(&str, &[&str])] = &[
    (
        "KHR_materials_pbrSpecularGlossiness",
        &["diffuseTexture", "specularGlossinessTexture"],
    ),
    (
        "KHR_materials_clearcoat",
        &[
            "clearcoatTexture",
            "clearcoatRoughnessTexture",
            "clearcoatNormalTexture",
        ],
    ),
    (
        "KHR_materials_sheen",
        &["sheenColorTexture", "sheenRoughnessTexture"],
    ),
    (
        "KHR_materials_specular",
        &["specularTexture", "specularColorTexture"],
    ),
    ("KHR_materials_transmission", &["transmissionTexture"]),
    ("KHR_materials_volume", &["thicknessTexture"]),
    (
        "KHR_materials_iridescence",
        &["iridescenceTexture", "iridescenceThicknessTexture"],
    ),
    ("KHR_materials_anisotropy", &["anisotropyTexture"]),
];

/// Texture extensions that carry an alternate image `source`
pub const TEXTURE_SOURCE_EXTENSIONS: &[&str] =
    &["EXT_texture_webp", "KHR_texture_basisu", "MSFT_texture_dds"];

/// Reference from a material slot to a texture
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextureInfo {
    pub index: usize,
    /// `texCoord`, `scale`, `strength`, extensions...
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl TextureInfo {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            other: Map::new(),
        }
    }
}

/// Metallic-roughness block of a material
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PbrMetallicRoughness {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_color_texture: Option<TextureInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metallic_roughness_texture: Option<TextureInfo>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Material {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pbr_metallic_roughness: Option<PbrMetallicRoughness>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normal_texture: Option<TextureInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occlusion_texture: Option<TextureInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emissive_texture: Option<TextureInfo>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extensions: BTreeMap<String, Value>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl Material {
    fn core_slots(&self) -> impl Iterator<Item = &TextureInfo> {
        let pbr = self.pbr_metallic_roughness.as_ref();
        [
            pbr.and_then(|p| p.base_color_texture.as_ref()),
            pbr.and_then(|p| p.metallic_roughness_texture.as_ref()),
            self.normal_texture.as_ref(),
            self.occlusion_texture.as_ref(),
            self.emissive_texture.as_ref(),
        ]
        .into_iter()
        .flatten()
    }

    fn core_slots_mut(&mut self) -> impl Iterator<Item = &mut TextureInfo> {
        let (base, metallic) = match self.pbr_metallic_roughness.as_mut() {
            Some(p) => (
                p.base_color_texture.as_mut(),
                p.metallic_roughness_texture.as_mut(),
            ),
            None => (None, None),
        };
        [
            base,
            metallic,
            self.normal_texture.as_mut(),
            self.occlusion_texture.as_mut(),
            self.emissive_texture.as_mut(),
        ]
        .into_iter()
        .flatten()
    }

    /// Every texture index referenced by this material, core slots first,
    /// then recognized extension slots in table order
    ///
    /// `material` is this material's index, used for error reporting.
    pub fn texture_refs(&self, material: usize) -> Result<Vec<usize>> {
        let mut refs: Vec<usize> = self.core_slots().map(|t| t.index).collect();
        for (extension, slots) in EXTENSION_TEXTURE_SLOTS {
            let Some(ext) = self.extensions.get(*extension) else {
                continue;
            };
            for slot in *slots {
                if let Some(info) = ext.get(*slot) {
                    refs.push(slot_index(info, material, extension, slot)?);
                }
            }
        }
        Ok(refs)
    }

    /// Rewrite every texture reference through `f`
    pub fn remap_textures(
        &mut self,
        material: usize,
        mut f: impl FnMut(usize) -> Result<usize>,
    ) -> Result<()> {
        for info in self.core_slots_mut() {
            info.index = f(info.index)?;
        }
        for (extension, slots) in EXTENSION_TEXTURE_SLOTS {
            let Some(ext) = self.extensions.get_mut(*extension) else {
                continue;
            };
            for slot in *slots {
                if let Some(info) = ext.get_mut(*slot) {
                    let new = f(slot_index(info, material, extension, slot)?)?;
                    info["index"] = Value::from(new);
                }
            }
        }
        Ok(())
    }
}

fn slot_index(info: &Value, material: usize, extension: &str, slot: &str) -> Result<usize> {
    info.get("index")
        .and_then(Value::as_u64)
        .map(|i| i as usize)
        .ok_or_else(|| Error::MalformedTextureSlot {
            material,
            extension: extension.to_string(),
            slot: slot.to_string(),
        })
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Texture {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sampler: Option<usize>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extensions: BTreeMap<String, Value>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl Texture {
    /// Texture sampling `source`
    pub fn with_source(source: usize) -> Self {
        Self {
            source: Some(source),
            ..Self::default()
        }
    }

    /// Every image index referenced by this texture
    pub fn image_refs(&self) -> Vec<usize> {
        let extension_sources = TEXTURE_SOURCE_EXTENSIONS.iter().filter_map(|name| {
            self.extensions
                .get(*name)
                .and_then(|ext| ext.get("source"))
                .and_then(Value::as_u64)
                .map(|i| i as usize)
        });
        self.source.into_iter().chain(extension_sources).collect()
    }

    /// Rewrite every image reference through `f`
    pub fn remap_images(&mut self, mut f: impl FnMut(usize) -> Result<usize>) -> Result<()> {
        if let Some(source) = self.source.as_mut() {
            *source = f(*source)?;
        }
        for name in TEXTURE_SOURCE_EXTENSIONS {
            let Some(ext) = self.extensions.get_mut(*name) else {
                continue;
            };
            if let Some(old) = ext.get("source").and_then(Value::as_u64) {
                ext["source"] = Value::from(f(old as usize)?);
            }
        }
        Ok(())
    }
}

/// Image: external URI or embedded buffer view
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buffer_view: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl Image {
    /// Image embedded in `buffer_view`
    pub fn embedded(buffer_view: usize, mime_type: impl Into<String>) -> Self {
        Self {
            buffer_view: Some(buffer_view),
            mime_type: Some(mime_type.into()),
            ..Self::default()
        }
    }
}
