// build.rs
// Compiles the GLSL sources under resources/shaders into the SPIR-V blobs the renderer loads

use std::env;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Output name for a shader source: `cube.vert` becomes `vert.spv`.
fn output_name(path: &Path) -> Option<String> {
    let ext = path.extension()?.to_str()?;
    match ext {
        "vert" | "frag" => Some(format!("{}.spv", ext)),
        _ => None,
    }
}

fn is_stale(src: &Path, dst: &Path) -> bool {
    match (std::fs::metadata(src), std::fs::metadata(dst)) {
        (Ok(src_meta), Ok(dst_meta)) => match (src_meta.modified(), dst_meta.modified()) {
            (Ok(src_time), Ok(dst_time)) => src_time > dst_time,
            _ => true,
        },
        _ => true,
    }
}

fn compile_shaders(shader_dir: &Path, target_dir: &Path, glslc: &Path) -> usize {
    let entries = match std::fs::read_dir(shader_dir) {
        Ok(entries) => entries,
        Err(_) => {
            println!("cargo:warning=No shader directory found at {:?}", shader_dir);
            return 0;
        }
    };

    let mut compiled = 0;
    for entry in entries.flatten() {
        let path = entry.path();
        let Some(name) = output_name(&path) else {
            continue;
        };
        let out_file = target_dir.join(name);

        if !is_stale(&path, &out_file) {
            eprintln!("info: Shader {:?} is up to date", path.file_name().unwrap_or_default());
            continue;
        }

        let status = Command::new(glslc).arg(&path).arg("-o").arg(&out_file).status();
        match status {
            Ok(s) if s.success() => {
                eprintln!("info: Compiled {:?} -> {:?}", path, out_file);
                compiled += 1;
            }
            Ok(s) => {
                println!("cargo:warning=glslc failed for {:?} with exit code {}", path, s.code().unwrap_or(-1));
            }
            Err(e) => {
                println!("cargo:warning=Failed to run glslc for {:?}: {}", path, e);
            }
        }
    }
    compiled
}

fn main() {
    println!("cargo:rerun-if-changed=resources/shaders");
    println!("cargo:rerun-if-env-changed=VULKAN_SDK");
    println!("cargo:rerun-if-env-changed=SKIP_SHADERS");

    if env::var("SKIP_SHADERS").is_ok() {
        eprintln!("info: Skipping shader compilation (SKIP_SHADERS set)");
        return;
    }

    let glslc = match env::var("VULKAN_SDK") {
        Ok(sdk) => {
            let bin = if cfg!(target_os = "windows") { "Bin/glslc.exe" } else { "bin/glslc" };
            PathBuf::from(sdk).join(bin)
        }
        Err(_) => PathBuf::from("glslc"),
    };

    if glslc.is_absolute() && !glslc.exists() {
        println!("cargo:warning=glslc not found at {:?}, shader compilation skipped", glslc);
        return;
    }

    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".into()));
    let shader_dir = manifest_dir.join("resources/shaders");
    // Lands in <workspace>/shaders so `./shaders/` resolves when run from the workspace root
    let target_dir = manifest_dir.join("../../shaders");

    if let Err(e) = std::fs::create_dir_all(&target_dir) {
        println!("cargo:warning=Failed to create shader output directory: {}", e);
        return;
    }

    let compiled = compile_shaders(&shader_dir, &target_dir, &glslc);
    if compiled > 0 {
        eprintln!("info: Successfully compiled {} shader(s)", compiled);
    }
}
