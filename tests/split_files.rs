#![allow(clippy::unwrap_used)]
//! End-to-end splitting of PSD files on disk

use std::path::{Path, PathBuf};
use std::sync::Arc;

use psd_splitter::file::psd::{
    load_psd, save_psd, CanvasInfo, ChannelData, ColorMode, ImageData, LayerBounds, LayerRecord,
    PsdDocument, ResolutionInfo, SectionType,
};
use psd_splitter::inputs::collect_inputs;
use psd_splitter::split::{EmptyUnitPolicy, SplitOptions, VisibleTarget};
use psd_splitter::{SplitError, Splitter, SplitterConfig};

fn pixel_layer(name: &str, value: u8) -> LayerRecord {
    let mut record = LayerRecord::new(name, encoding_rs::UTF_8);
    record.bounds = LayerBounds {
        top: 1,
        left: 1,
        bottom: 3,
        right: 3,
    };
    record.channels = (-1..3)
        .map(|id| ChannelData {
            id,
            data: Arc::from(vec![0, 0, value, value, value, value]),
        })
        .collect();
    record
}

fn divider() -> LayerRecord {
    LayerRecord::new("</Layer group>", encoding_rs::UTF_8).with_section(SectionType::BoundingDivider)
}

fn folder(name: &str, visible: bool) -> LayerRecord {
    let mut record = LayerRecord::new(name, encoding_rs::UTF_8).with_section(SectionType::OpenFolder);
    record.flags.visible = visible;
    record
}

/// Storage order (bottom first):
/// paper, Body[ink, shade], (hidden) @walk[frame1[a], frame2[b]], Empty[]
fn source_document() -> PsdDocument {
    let layers = vec![
        pixel_layer("paper", 10),
        divider(),
        pixel_layer("shade", 20),
        pixel_layer("ink", 30),
        folder("Body", true),
        divider(),
        divider(),
        pixel_layer("b", 40),
        folder("frame2", true),
        divider(),
        pixel_layer("a", 50),
        folder("frame1", true),
        folder("@walk", false),
        divider(),
        folder("Empty", true),
    ];

    PsdDocument {
        canvas: CanvasInfo {
            channels: 4,
            color_mode: ColorMode::Rgb as u16,
            depth: 8,
            height: 4,
            width: 4,
            compression: 1,
            resolution: Some(ResolutionInfo::new(144)),
            color_mode_data: Vec::new(),
            merged_alpha: true,
        },
        resources: vec![ResolutionInfo::new(144).to_resource()],
        layers: layers.into_iter().map(Arc::new).collect(),
        global_mask: Vec::new(),
        extra_info: Vec::new(),
        image_data: ImageData::Planes(vec![vec![7; 16]; 4]),
    }
}

fn write_source(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    save_psd(&path, &source_document()).unwrap();
    path
}

fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

fn layer_names(path: &Path) -> Vec<String> {
    load_psd(path, encoding_rs::UTF_8)
        .unwrap()
        .layers
        .iter()
        .map(|r| r.name.clone())
        .collect()
}

#[test]
fn test_split_top_level() {
    let tmp = tempfile::tempdir().unwrap();
    let source = write_source(tmp.path(), "scene.psd");

    let report = Splitter::new(SplitterConfig::default())
        .unwrap()
        .split_file(&source)
        .unwrap();

    let out = tmp.path().join("out-scene.psd");
    assert_eq!(report.output_dir, out);
    assert_eq!(
        file_names(&out),
        vec!["scene-000-paper.psd", "scene-001-Body.psd", "scene-002-@walk.psd"]
    );
    assert_eq!(
        layer_names(&out.join("scene-001-Body.psd")),
        vec!["</Layer group>", "shade", "ink", "Body"]
    );
}

#[test]
fn test_outputs_keep_canvas_and_layer_data() {
    let tmp = tempfile::tempdir().unwrap();
    let source = write_source(tmp.path(), "scene.psd");
    Splitter::new(SplitterConfig::default())
        .unwrap()
        .split_file(&source)
        .unwrap();

    let original = load_psd(&source, encoding_rs::UTF_8).unwrap();
    let part = load_psd(
        &tmp.path().join("out-scene.psd/scene-000-paper.psd"),
        encoding_rs::UTF_8,
    )
    .unwrap();

    assert_eq!(part.canvas.width, original.canvas.width);
    assert_eq!(part.canvas.height, original.canvas.height);
    assert_eq!(part.canvas.channels, original.canvas.channels);
    assert_eq!(part.canvas.resolution, original.canvas.resolution);
    assert!(part.canvas.merged_alpha);
    assert_eq!(part.layers.len(), 1);
    assert_eq!(*part.layers[0], *original.layers[0]);
}

#[test]
fn test_expand_marker_groups() {
    let tmp = tempfile::tempdir().unwrap();
    let source = write_source(tmp.path(), "walk.psd");
    let config = SplitterConfig {
        split: SplitOptions {
            expand_marker_groups: true,
            ..Default::default()
        },
        ..Default::default()
    };

    let report = Splitter::new(config).unwrap().split_file(&source).unwrap();
    let names: Vec<&str> = report.units.iter().map(|u| u.name.as_str()).collect();
    assert_eq!(names, vec!["000-paper", "001-Body", "002-frame2", "002-frame1"]);
    assert_eq!(
        layer_names(&report.units[3].file),
        vec!["</Layer group>", "a", "frame1"]
    );
}

#[test]
fn test_show_forces_group_visible_in_output_only() {
    let tmp = tempfile::tempdir().unwrap();
    let source = write_source(tmp.path(), "scene.psd");
    let config = SplitterConfig {
        split: SplitOptions {
            force_visible_root: true,
            visible_target: VisibleTarget::Last,
            ..Default::default()
        },
        ..Default::default()
    };
    let report = Splitter::new(config).unwrap().split_file(&source).unwrap();

    let walk = load_psd(&report.units[2].file, encoding_rs::UTF_8).unwrap();
    let header = walk.layers.last().unwrap();
    assert_eq!(header.name, "@walk");
    assert!(header.visible());

    let original = load_psd(&source, encoding_rs::UTF_8).unwrap();
    let header = original.layers.iter().find(|r| r.name == "@walk").unwrap();
    assert!(!header.visible());
}

#[test]
fn test_emit_empty_units() {
    let tmp = tempfile::tempdir().unwrap();
    let source = write_source(tmp.path(), "scene.psd");
    let config = SplitterConfig {
        split: SplitOptions {
            empty_units: EmptyUnitPolicy::Emit,
            ..Default::default()
        },
        ..Default::default()
    };
    let report = Splitter::new(config).unwrap().split_file(&source).unwrap();

    let last = report.units.last().unwrap();
    assert_eq!(last.name, "003-Empty");
    assert_eq!(last.layer_count, 2);
}

#[test]
fn test_broken_groups_write_nothing() {
    let tmp = tempfile::tempdir().unwrap();
    let mut doc = source_document();
    doc.layers.remove(1);
    let source = tmp.path().join("broken.psd");
    save_psd(&source, &doc).unwrap();

    let err = Splitter::new(SplitterConfig::default())
        .unwrap()
        .split_file(&source)
        .unwrap_err();
    assert!(matches!(err, SplitError::Structure { .. }));
    assert!(!tmp.path().join("out-broken.psd").exists());
}

#[test]
fn test_rerun_skips_previous_output() {
    let tmp = tempfile::tempdir().unwrap();
    write_source(tmp.path(), "scene.psd");
    let config = SplitterConfig {
        recurse: true,
        ..Default::default()
    };
    let splitter = Splitter::new(config).unwrap();

    let dirs = [tmp.path().to_path_buf()];
    let first = collect_inputs(&dirs, true, "out-");
    assert_eq!(first.len(), 1);
    splitter.run(&first);

    let second = collect_inputs(&dirs, true, "out-");
    assert_eq!(second, first);
    let results = splitter.run(&second);
    assert!(results.iter().all(|(_, r)| r.is_ok()));
    assert_eq!(file_names(&tmp.path().join("out-scene.psd")).len(), 3);
}
