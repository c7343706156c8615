use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

const WASM_PACKAGE: &str = "site_wasm";
const OUT_NAME: &str = "site_fx";

fn main() {
    let manifest_dir =
        PathBuf::from(env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR missing"));
    let workspace_root = manifest_dir
        .parent()
        .expect("backend must live inside workspace")
        .to_path_buf();
    let wasm_crate = workspace_root.join("frontend/site-wasm");
    let pkg_dir = wasm_crate.join("pkg");

    println!(
        "cargo:rerun-if-changed={}",
        wasm_crate.join("Cargo.toml").display()
    );
    println!("cargo:rerun-if-changed={}", wasm_crate.join("src").display());
    println!("cargo:rerun-if-env-changed=WASM_BINDGEN");
    println!("cargo:rerun-if-env-changed=SKIP_SITE_WASM_BUILD");

    if env::var("CI").is_ok() || env::var("SKIP_SITE_WASM_BUILD").is_ok() {
        println!(
            "cargo:warning=Skipping {} build; serving whatever is in {}",
            WASM_PACKAGE,
            pkg_dir.display()
        );
        return;
    }

    // The server runs fine without the bundle, so a missing wasm toolchain
    // only warrants a warning.
    if let Err(e) = build_bundle(&workspace_root, &pkg_dir) {
        println!("cargo:warning={} bundle not rebuilt: {}", WASM_PACKAGE, e);
    }
}

fn build_bundle(workspace_root: &Path, pkg_dir: &Path) -> Result<(), String> {
    let cargo = env::var("CARGO").unwrap_or_else(|_| "cargo".to_string());
    let base_rustflags = env::var("RUSTFLAGS").unwrap_or_default();
    let mut rustflags = base_rustflags.trim().to_string();
    if !rustflags.is_empty() {
        rustflags.push(' ');
    }
    rustflags.push_str("-C opt-level=3 -C codegen-units=1 -C lto=fat");

    let default_target_dir = env::var("CARGO_TARGET_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| workspace_root.join("target"));
    let wasm_target_dir = default_target_dir.join("wasm-cache");

    let build_status = Command::new(&cargo)
        .current_dir(workspace_root)
        .args([
            "build",
            "--package",
            WASM_PACKAGE,
            "--release",
            "--target",
            "wasm32-unknown-unknown",
        ])
        .env("RUSTFLAGS", &rustflags)
        .env("CARGO_TARGET_DIR", &wasm_target_dir)
        .status()
        .map_err(|e| format!("failed to invoke cargo: {e}"))?;

    if !build_status.success() {
        return Err("cargo build for wasm32-unknown-unknown failed".to_string());
    }

    let target_wasm = wasm_target_dir
        .join("wasm32-unknown-unknown/release")
        .join(format!("{WASM_PACKAGE}.wasm"));
    if !target_wasm.exists() {
        return Err(format!("expected wasm artifact at {}", target_wasm.display()));
    }

    if pkg_dir.exists() {
        fs::remove_dir_all(pkg_dir).map_err(|e| format!("unable to clear pkg dir: {e}"))?;
    }
    fs::create_dir_all(pkg_dir).map_err(|e| format!("unable to create pkg dir: {e}"))?;

    let wasm_bindgen = env::var("WASM_BINDGEN").unwrap_or_else(|_| "wasm-bindgen".to_string());
    let bindgen_status = Command::new(&wasm_bindgen)
        .arg("--target")
        .arg("web")
        .arg("--out-dir")
        .arg(pkg_dir)
        .arg("--out-name")
        .arg(OUT_NAME)
        .arg(&target_wasm)
        .status()
        .map_err(|e| {
            format!(
                "failed to run {} (install via `cargo install wasm-bindgen-cli` or set WASM_BINDGEN): {e}",
                wasm_bindgen
            )
        })?;

    if !bindgen_status.success() {
        return Err("wasm-bindgen emitted a non-zero exit status".to_string());
    }
    Ok(())
}
