//! Maintenance tasks for debris
//!
//! Usage:
//!   cargo xtask check-presets data            # Parse and cross-check preset files
//!   cargo xtask headless --frames 600         # Run the demo world without a window

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use debris::game::SimWorld;
use debris::{PresetRegistry, SimConfig, Vec2};

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Maintenance tasks for debris")]
struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse every .ron preset file in a directory and check references
    CheckPresets {
        /// Directory holding preset files
        dir: PathBuf,
    },
    /// Step a simulation without a window and print per-frame counts
    Headless {
        #[arg(long, default_value_t = 600)]
        frames: u32,
        /// Preset directory (defaults to data/)
        #[arg(long)]
        presets: Option<PathBuf>,
        /// Settings file
        #[arg(long)]
        config: Option<PathBuf>,
        /// Print every Nth frame
        #[arg(long, default_value_t = 60)]
        every: u32,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    debris::logging::init(cli.verbose);

    match cli.command {
        Commands::CheckPresets { dir } => check_presets(&dir),
        Commands::Headless { frames, presets, config, every } => headless(frames, presets, config, every),
    }
}

/// Get the project root directory
fn project_root() -> PathBuf {
    let manifest = Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest.parent().unwrap_or(manifest).to_path_buf()
}

/// Load each file on its own so every broken one is reported, then check
/// cross-file references on the combined registry.
fn check_presets(dir: &Path) -> Result<()> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read {}", dir.display()))?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().map(|ext| ext == "ron").unwrap_or(false))
        .collect();
    files.sort();

    let mut registry = PresetRegistry::new();
    let mut failures = 0;
    for path in &files {
        // Settings files share the extension; skip anything that isn't a preset file
        let source = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
        if !source.contains("PresetFile") {
            println!("  skip  {}", path.display());
            continue;
        }
        match registry.load_str(&source) {
            Ok(count) => println!("  ok    {} ({} presets)", path.display(), count),
            Err(e) => {
                println!("  FAIL  {}: {}", path.display(), e);
                failures += 1;
            }
        }
    }

    for (owner, missing) in registry.missing_references() {
        println!("  MISSING  {} -> {}/{}", owner, missing.class, missing.name);
        failures += 1;
    }

    println!("{} presets in {} modules", registry.len(), registry.modules().len());
    if failures > 0 {
        anyhow::bail!("{} problem(s) found", failures);
    }
    Ok(())
}

fn headless(frames: u32, presets: Option<PathBuf>, config: Option<PathBuf>, every: u32) -> Result<()> {
    let config = match config {
        Some(path) => SimConfig::load(&path).with_context(|| format!("Failed to load {}", path.display()))?,
        None => SimConfig::default(),
    };
    let dir = presets.unwrap_or_else(|| project_root().join("data"));

    let mut world = SimWorld::new(config);
    let loaded = world
        .presets
        .load_dir(&dir)
        .with_context(|| format!("Failed to load presets from {}", dir.display()))?;
    log::info!("{} presets loaded", loaded);

    let (w, h) = (world.config.scene_width as i32, world.config.scene_height as i32);
    world.scene.fill_rect(0, h - 20, w, h, debris::game::scene::materials::SOIL);

    let mid = w as f32 * 0.5;
    world.spawn("Actor", "Crab", None, Vec2::new(mid, h as f32 - 40.0))?;
    for i in 0..8 {
        let x = mid - 80.0 + i as f32 * 20.0;
        world.spawn("MOSRotating", "Crate", None, Vec2::new(x, 20.0 + (i % 3) as f32 * 10.0))?;
    }

    let every = every.max(1);
    let mut totals = (0usize, 0usize, 0usize);
    for _ in 0..frames {
        let stats = world.step();
        totals.0 += stats.mo_hits;
        totals.1 += stats.settled;
        totals.2 += stats.deleted;
        if stats.frame % every as u64 == 0 {
            println!(
                "frame {:>6}  roots {:>4}  objects {:>4}  moids {:>4}",
                stats.frame, stats.roots, stats.objects, stats.moids
            );
        }
    }
    println!("mo hits {}  settled {}  deleted {}", totals.0, totals.1, totals.2);
    Ok(())
}
