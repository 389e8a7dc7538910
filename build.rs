//! Build script to generate the preset manifest for WASM builds
//!
//! Scans data/ and lists every preset file, since WASM can't enumerate
//! directories at runtime.

use std::fs;
use std::io::Write;
use std::path::Path;

fn main() {
    println!("cargo:rerun-if-changed=data");

    let data_dir = Path::new("data");
    let manifest_path = Path::new("data/manifest.txt");

    let mut manifest = String::new();

    if data_dir.exists() {
        let mut files: Vec<_> = fs::read_dir(data_dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.path()
                    .extension()
                    .map(|ext| ext.to_ascii_lowercase() == "ron")
                    .unwrap_or(false)
            })
            .filter(|e| {
                fs::read_to_string(e.path())
                    .map(|s| s.contains("PresetFile"))
                    .unwrap_or(false)
            })
            .collect();

        files.sort_by_key(|e| e.file_name());

        for entry in files {
            manifest.push_str(&format!("{}\n", entry.file_name().to_string_lossy()));
        }
    }

    let mut file = fs::File::create(manifest_path).unwrap();
    file.write_all(manifest.as_bytes()).unwrap();
}
