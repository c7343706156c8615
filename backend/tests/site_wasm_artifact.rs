use std::{collections::HashSet, fs, path::PathBuf};

use wasmparser::{Parser, Payload, Validator};

fn wasm_pkg_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .expect("backend manifest must have a parent directory")
        .join("frontend")
        .join("site-wasm")
        .join("pkg")
}

fn wasm_and_js_paths() -> (PathBuf, PathBuf) {
    let pkg_dir = wasm_pkg_dir();
    (pkg_dir.join("site_fx_bg.wasm"), pkg_dir.join("site_fx.js"))
}

fn assert_bundle_present() {
    let (wasm_path, js_path) = wasm_and_js_paths();
    assert!(
        wasm_path.is_file(),
        "Missing wasm artifact at {}",
        wasm_path.display()
    );
    assert!(
        js_path.is_file(),
        "Missing JS glue at {}",
        js_path.display()
    );
}

// The bundle needs the wasm32 target and wasm-bindgen; run these with
// `cargo test -- --ignored` once build.rs has produced it.
#[test]
#[ignore = "needs the site_wasm bundle from build.rs"]
fn site_wasm_artifact_is_present_and_exports_expected_symbols() {
    assert_bundle_present();
    let (wasm_path, _) = wasm_and_js_paths();

    let wasm_bytes = fs::read(&wasm_path)
        .unwrap_or_else(|err| panic!("Failed to read {}: {err}", wasm_path.display()));

    // Validate the module structure and collect its export names.
    let mut validator = Validator::new();
    let mut exports = HashSet::new();
    for payload in Parser::new(0).parse_all(&wasm_bytes) {
        let payload = payload.expect("wasm payload parsing failed");
        validator
            .payload(&payload)
            .expect("wasm module failed validation");

        if let Payload::ExportSection(section) = payload {
            for export in section {
                let export = export.expect("failed to parse export entry");
                exports.insert(export.name.to_owned());
            }
        }
    }

    let expected = [
        "site_init",
        "site_unmount",
        "spark_configure",
        "spark_click",
        "spark_frame",
        "spark_segments_ptr",
        "spark_segments_len",
        "spark_color",
        "spark_active_count",
        "resize_observe",
        "resize_poll",
        "surface_width",
        "surface_height",
        "section_bounds",
        "section_scroll",
        "section_frame",
        "section_refresh",
        "section_active",
        "section_anchor_target",
        "scroll_progress",
    ];

    let missing: Vec<_> = expected
        .iter()
        .filter(|name| !exports.contains(**name))
        .copied()
        .collect();

    assert!(
        missing.is_empty(),
        "WASM missing expected exports: {:?}",
        missing
    );
}

#[test]
#[ignore = "needs the site_wasm bundle from build.rs"]
fn site_wasm_js_glue_targets_embedded_wasm() {
    assert_bundle_present();
    let (_, js_path) = wasm_and_js_paths();

    let js = fs::read_to_string(&js_path)
        .unwrap_or_else(|err| panic!("Failed to read {}: {err}", js_path.display()));

    assert!(
        js.contains("site_fx_bg.wasm"),
        "JS glue does not reference the bundled wasm binary"
    );
    assert!(
        js.contains("export default __wbg_init"),
        "JS glue is missing the default init export"
    );
}
