//! End-to-end pipeline tests over generated GLB files
//!
//! Outputs are re-imported with the `gltf` crate, which validates every
//! index and buffer range on load.

mod gltf_generator;

use glbslice::sidecar::sidecar_path;
use glbslice::{
    ImageFormat, ImageSettings, Pipeline, PipelineSection, build_all, io, load_manifest,
};
use glbslice_core::{Alignment, Granularity};
use gltf_generator::{TEXTURE_SIZE, planters_document, planters_glb};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn write_planters(dir: &Path) -> PathBuf {
    let path = dir.join("Planters.glb");
    fs::write(&path, planters_glb()).unwrap();
    path
}

fn settings(split_depth: usize) -> PipelineSection {
    PipelineSection {
        split_depth,
        granularity: Granularity::Children,
        align: None,
        strip_attributes: Vec::new(),
    }
}

fn file_names(paths: &[PathBuf]) -> Vec<String> {
    paths
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect()
}

fn root_translation(path: &Path) -> [f32; 3] {
    let (doc, _, _) = gltf::import(path).unwrap();
    let root = doc.default_scene().unwrap().nodes().next().unwrap();
    root.transform().decomposed().0
}

#[test]
fn test_split_parts_are_self_contained() {
    let dir = tempdir().unwrap();
    let input = write_planters(dir.path());
    let out = dir.path().join("out");

    let report = Pipeline::new(&settings(1), None)
        .process_asset(&input, "Planters", &out)
        .unwrap();

    assert_eq!(
        file_names(&report.outputs),
        ["Planters_level1-Pot.glb", "Planters_level1-Plant.glb"]
    );

    let (pot, buffers, images) = gltf::import(&report.outputs[0]).unwrap();
    assert_eq!(pot.nodes().count(), 1);
    assert_eq!(pot.meshes().count(), 1);
    assert_eq!(pot.materials().count(), 1);
    assert_eq!(pot.textures().count(), 1);
    assert_eq!(buffers.len(), 1);
    assert_eq!(images[0].width, TEXTURE_SIZE);

    let (plant, _, images) = gltf::import(&report.outputs[1]).unwrap();
    assert_eq!(plant.nodes().count(), 2);
    assert_eq!(plant.meshes().count(), 1);
    assert_eq!(plant.materials().count(), 0);
    assert!(images.is_empty());
}

#[test]
fn test_split_bakes_parent_translation() {
    let dir = tempdir().unwrap();
    let input = write_planters(dir.path());
    let out = dir.path().join("out");

    let report = Pipeline::new(&settings(1), None)
        .process_asset(&input, "Planters", &out)
        .unwrap();

    assert_eq!(root_translation(&report.outputs[0]), [5.0, 7.0, 9.0]);
    assert_eq!(root_translation(&report.outputs[1]), [1.0, 2.0, 3.0]);
}

#[test]
fn test_two_level_split_names_and_transforms() {
    let dir = tempdir().unwrap();
    let input = write_planters(dir.path());
    let out = dir.path().join("out");

    let report = Pipeline::new(&settings(2), None)
        .process_asset(&input, "Planters", &out)
        .unwrap();

    // Pot has no children, so it passes through the second level whole
    assert_eq!(
        file_names(&report.outputs),
        ["Planters_level1-Pot.glb", "Planters_level1-Plant_level2-Leaf.glb"]
    );
    assert_eq!(root_translation(&report.outputs[1]), [1.0, 3.0, 3.0]);
}

#[test]
fn test_alignment_writes_sidecar() {
    let dir = tempdir().unwrap();
    let input = write_planters(dir.path());
    let out = dir.path().join("out");
    let mut settings = settings(1);
    settings.align = Some("0,-1,0".parse::<Alignment>().unwrap());

    let report = Pipeline::new(&settings, None)
        .process_asset(&input, "Planters", &out)
        .unwrap();

    // Pot spans [4.5, 5.5] x [6.5, 7.5] x [8.5, 9.5]; its bottom center moves to the origin
    assert_eq!(root_translation(&report.outputs[0]), [0.0, 0.5, 0.0]);
    assert_eq!(
        fs::read_to_string(out.join("Planters_level1-Pot_size.txt")).unwrap(),
        "Size: [1, 1, 1]\nAlign to: [0, -1, 0]\n"
    );
    assert!(out.join("Planters_level1-Plant_size.txt").exists());
}

#[test]
fn test_whole_asset_strip_and_images() {
    let dir = tempdir().unwrap();
    let input = write_planters(dir.path());
    let out = dir.path().join("out");
    let mut settings = settings(0);
    settings.strip_attributes = vec!["NORMAL".to_string(), "TANGENT".to_string()];
    let images = ImageSettings {
        max_width: 16,
        max_height: 16,
        min_size_kb: 0,
        format: ImageFormat::Png,
        quality: 85,
    };

    let report = Pipeline::new(&settings, Some(&images))
        .process_asset(&input, "Planters", &out)
        .unwrap();

    assert_eq!(file_names(&report.outputs), ["Planters.glb"]);
    let (doc, _, decoded) = gltf::import(&report.outputs[0]).unwrap();
    // Marker has no geometry and is pruned
    assert_eq!(doc.nodes().count(), 4);
    assert_eq!((decoded[0].width, decoded[0].height), (16, 16));
    for mesh in doc.meshes() {
        for prim in mesh.primitives() {
            assert!(prim.get(&gltf::Semantic::Normals).is_none());
            assert!(prim.get(&gltf::Semantic::Positions).is_some());
        }
    }

    // The replaced image bytes are gone from the payload
    let original = planters_document();
    let saved = io::load(&report.outputs[0]).unwrap();
    assert!(saved.payloads[0].len() < original.payloads[0].len());
    assert_eq!(saved.buffer_views.len(), original.buffer_views.len() - 2);
}

#[test]
fn test_webp_output_registers_extension() {
    let dir = tempdir().unwrap();
    let input = write_planters(dir.path());
    let out = dir.path().join("out");
    let images = ImageSettings {
        max_width: 32,
        max_height: 32,
        min_size_kb: 0,
        format: ImageFormat::Webp,
        quality: 85,
    };

    let report = Pipeline::new(&settings(1), Some(&images))
        .process_asset(&input, "Planters", &out)
        .unwrap();

    let pot = io::load(&report.outputs[0]).unwrap();
    assert_eq!(pot.images[0].mime_type.as_deref(), Some("image/webp"));
    assert_eq!(pot.textures[0].source, Some(0));
    assert_eq!(pot.textures[0].extensions["EXT_texture_webp"]["source"], 0);
    assert_eq!(pot.extensions_used, ["EXT_texture_webp"]);
    assert!(pot.extensions_required.is_empty());

    let plant = io::load(&report.outputs[1]).unwrap();
    assert!(plant.extensions_used.is_empty());
}

#[test]
fn test_gltf_with_external_buffer() {
    let dir = tempdir().unwrap();
    let mut doc = planters_document();
    fs::write(dir.path().join("planters.bin"), &doc.payloads[0]).unwrap();
    doc.buffers[0].uri = Some("planters.bin".to_string());
    let input = dir.path().join("planters.gltf");
    fs::write(&input, doc.to_json_vec().unwrap()).unwrap();

    let report = Pipeline::new(&settings(0), None)
        .process_asset(&input, "planters", &dir.path().join("out"))
        .unwrap();

    let (imported, buffers, _) = gltf::import(&report.outputs[0]).unwrap();
    assert_eq!(imported.meshes().count(), 2);
    assert!(matches!(
        imported.buffers().next().unwrap().source(),
        gltf::buffer::Source::Bin
    ));
    assert_eq!(buffers.len(), 1);
}

#[test]
fn test_dangling_material_fails_asset() {
    let dir = tempdir().unwrap();
    let mut doc = planters_document();
    doc.meshes[1].primitives[0].material = Some(7);
    let input = dir.path().join("broken.glb");
    fs::write(&input, glb_builder::assemble_glb(&doc).unwrap()).unwrap();

    let err = Pipeline::new(&settings(0), None)
        .process_asset(&input, "broken", &dir.path().join("out"))
        .unwrap_err();

    assert!(format!("{err:#}").contains("material index 7"));
}

#[test]
fn test_batch_skips_failed_assets() {
    let dir = tempdir().unwrap();
    let models = dir.path().join("models");
    fs::create_dir_all(models.join("nested")).unwrap();
    write_planters(&models);
    fs::write(models.join("nested").join("corrupt.glb"), b"not a model").unwrap();
    fs::write(models.join("notes.txt"), b"ignored").unwrap();
    let manifest = dir.path().join("glbslice.toml");
    fs::write(
        &manifest,
        r#"
[pipeline]
split_depth = 1
strip_attributes = []

[output]
dir = "parts"

[[assets]]
path = "models"
"#,
    )
    .unwrap();

    let ctx = load_manifest(&manifest).unwrap();
    let report = build_all(&ctx, None).unwrap();

    assert_eq!(report.processed, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(report.outputs.len(), 2);
    assert!(dir.path().join("parts").join("Planters_level1-Pot.glb").exists());
}

#[test]
fn test_batch_fails_when_every_asset_fails() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("bad.glb"), b"glTF\x02\x00\x00\x00").unwrap();
    let manifest = dir.path().join("glbslice.toml");
    fs::write(&manifest, "[[assets]]\npath = \"bad.glb\"\n").unwrap();

    let ctx = load_manifest(&manifest).unwrap();
    assert!(build_all(&ctx, None).is_err());
}

#[test]
fn test_named_entry_and_output_override() {
    let dir = tempdir().unwrap();
    write_planters(dir.path());
    let manifest = dir.path().join("glbslice.toml");
    fs::write(
        &manifest,
        r#"
[pipeline]
split_depth = 0

[[assets]]
path = "Planters.glb"
name = "Patio Set"
"#,
    )
    .unwrap();
    let override_dir = dir.path().join("override");

    let ctx = load_manifest(&manifest).unwrap();
    let report = build_all(&ctx, Some(&override_dir)).unwrap();

    assert_eq!(report.outputs, [override_dir.join("Patio_Set.glb")]);
    gltf::import(&report.outputs[0]).unwrap();
}

#[test]
fn test_same_named_siblings_get_distinct_files() {
    let dir = tempdir().unwrap();
    let mut doc = planters_document();
    doc.nodes[2].name = Some("Pot".to_string());
    let input = dir.path().join("Planters.glb");
    fs::write(&input, glb_builder::assemble_glb(&doc).unwrap()).unwrap();

    let report = Pipeline::new(&settings(1), None)
        .process_asset(&input, "Planters", &dir.path().join("out"))
        .unwrap();

    assert_eq!(
        file_names(&report.outputs),
        ["Planters_level1-Pot.glb", "Planters_level1-Pot_2.glb"]
    );
    assert_eq!(root_translation(&report.outputs[0]), [5.0, 7.0, 9.0]);
    assert_eq!(root_translation(&report.outputs[1]), [1.0, 2.0, 3.0]);
}

#[test]
fn test_batch_keeps_inputs_with_the_same_stem() {
    let dir = tempdir().unwrap();
    let models = dir.path().join("models");
    fs::create_dir_all(models.join("indoor")).unwrap();
    fs::create_dir_all(models.join("outdoor")).unwrap();
    write_planters(&models.join("indoor"));
    write_planters(&models.join("outdoor"));
    let manifest = dir.path().join("glbslice.toml");
    fs::write(&manifest, "[pipeline]\nsplit_depth = 0\n\n[[assets]]\npath = \"models\"\n").unwrap();

    let ctx = load_manifest(&manifest).unwrap();
    let report = build_all(&ctx, None).unwrap();

    assert_eq!(report.processed, 2);
    assert_eq!(file_names(&report.outputs), ["Planters.glb", "Planters_1.glb"]);
    for output in &report.outputs {
        gltf::import(output).unwrap();
    }
}

#[test]
fn test_repeated_runs_are_byte_identical() {
    let dir = tempdir().unwrap();
    let input = write_planters(dir.path());
    let mut settings = settings(2);
    settings.align = Some("0,-1,0".parse::<Alignment>().unwrap());
    settings.strip_attributes = vec!["NORMAL".to_string()];
    let images = ImageSettings {
        max_width: 32,
        max_height: 32,
        min_size_kb: 0,
        format: ImageFormat::Webp,
        quality: 85,
    };
    let pipeline = Pipeline::new(&settings, Some(&images));

    let first = pipeline
        .process_asset(&input, "Planters", &dir.path().join("first"))
        .unwrap();
    let second = pipeline
        .process_asset(&input, "Planters", &dir.path().join("second"))
        .unwrap();

    assert_eq!(file_names(&first.outputs), file_names(&second.outputs));
    for (a, b) in first.outputs.iter().zip(&second.outputs) {
        assert_eq!(fs::read(a).unwrap(), fs::read(b).unwrap(), "{}", a.display());
        assert_eq!(
            fs::read(sidecar_path(a)).unwrap(),
            fs::read(sidecar_path(b)).unwrap()
        );
    }
}

#[test]
fn test_gltf_with_external_image_is_self_contained() {
    let dir = tempdir().unwrap();
    let mut doc = planters_document();
    let view = doc.images[0].buffer_view.take().unwrap();
    fs::write(dir.path().join("pot.png"), doc.view_bytes(view).unwrap()).unwrap();
    doc.images[0].uri = Some("pot.png".to_string());
    doc.images[0].mime_type = None;
    fs::write(dir.path().join("planters.bin"), &doc.payloads[0]).unwrap();
    doc.buffers[0].uri = Some("planters.bin".to_string());
    let input = dir.path().join("planters.gltf");
    fs::write(&input, doc.to_json_vec().unwrap()).unwrap();

    let report = Pipeline::new(&settings(1), None)
        .process_asset(&input, "planters", &dir.path().join("out").join("nested"))
        .unwrap();

    let pot = io::load(&report.outputs[0]).unwrap();
    assert_eq!(pot.images[0].uri, None);
    assert_eq!(pot.images[0].mime_type.as_deref(), Some("image/png"));
    let (_, _, images) = gltf::import(&report.outputs[0]).unwrap();
    assert_eq!(images[0].width, TEXTURE_SIZE);
}
