//! Sculpt CLI - build, inspect and sample CSG scripts

mod repl;
mod settings;
mod slice;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use glam::Vec3;
use sculpt_csg::{FlatEvaluator, Tree, WgslGenerator, to_dot};
use sculpt_script::{LiveScript, ScriptParser, ScriptWatcher, WatchEvent};
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use crate::settings::{Settings, load_settings};
use crate::slice::Slice;

#[derive(Parser)]
#[command(name = "sculpt")]
#[command(about = "Constructive solid geometry from a line-oriented script", long_about = None)]
#[command(version)]
struct Cli {
    /// Log parser and optimizer details (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a script and report the optimized tree
    Check {
        /// Script file
        script: PathBuf,
    },

    /// Print the signed distance at a point
    #[command(allow_negative_numbers = true)]
    Eval {
        /// Script file
        script: PathBuf,
        x: f32,
        y: f32,
        z: f32,
    },

    /// Sample a z plane, as text or as a PNG heat map
    Slice {
        /// Script file
        script: PathBuf,

        /// Height of the slicing plane
        #[arg(long, default_value = "0", allow_negative_numbers = true)]
        z: f32,

        /// Samples per axis (defaults to the settings file)
        #[arg(short, long)]
        resolution: Option<u32>,

        /// Half width of the sampled square (defaults to the settings file)
        #[arg(short, long)]
        extent: Option<f32>,

        /// Write a PNG instead of printing to the terminal
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Export the tree as a Graphviz graph
    Dot {
        /// Script file
        script: PathBuf,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also write the parse-order tree after every statement into DIR
        #[arg(long, value_name = "DIR")]
        steps: Option<PathBuf>,
    },

    /// Generate a WGSL distance function
    Wgsl {
        /// Script file
        script: PathBuf,

        /// Name of the generated function
        #[arg(long, default_value = "scene_sdf")]
        function_name: String,

        /// Prepend the shared formula library
        #[arg(long)]
        full: bool,
    },

    /// Dump the optimized tree as JSON
    Json {
        /// Script file
        script: PathBuf,
    },

    /// Re-parse a script whenever it changes
    Watch {
        /// Script file to watch
        script: PathBuf,
    },

    /// Interactive REPL, one statement per line
    Repl,

    /// Show or initialise the settings file
    Config {
        /// Write the current settings to the settings file
        #[arg(long)]
        init: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let settings = load_settings();

    match cli.command {
        Commands::Check { script } => run_check(&script)?,
        Commands::Eval { script, x, y, z } => run_eval(&script, Vec3::new(x, y, z))?,
        Commands::Slice {
            script,
            z,
            resolution,
            extent,
            output,
        } => {
            let resolution = resolution.unwrap_or(settings.slice_resolution);
            let extent = extent.unwrap_or(settings.slice_extent);
            run_slice(&script, z, resolution, extent, output.as_deref(), &settings)?;
        }
        Commands::Dot {
            script,
            output,
            steps,
        } => run_dot(&script, output.as_deref(), steps.as_deref())?,
        Commands::Wgsl {
            script,
            function_name,
            full,
        } => run_wgsl(&script, &function_name, full)?,
        Commands::Json { script } => run_json(&script)?,
        Commands::Watch { script } => run_watch(&script, settings.watch_debounce_ms)?,
        Commands::Repl => repl::run_repl(&settings)?,
        Commands::Config { init } => run_config(&settings, init)?,
    }

    Ok(())
}

fn load(script: &Path) -> Result<Tree> {
    sculpt_script::load_file(script)
        .with_context(|| format!("Could not build a tree from {}", script.display()))
}

fn run_check(script: &Path) -> Result<()> {
    let tree = load(script)?;
    let leaves = tree.nodes.iter().filter(|node| node.is_leaf()).count();

    println!(
        "OK - {} nodes ({} primitives, {} operations)",
        tree.len(),
        leaves,
        tree.len() - leaves
    );
    if let Some(name) = tree.root_node().and_then(|root| root.name.as_deref()) {
        println!("Root: {}", name);
    }
    Ok(())
}

fn run_eval(script: &Path, p: Vec3) -> Result<()> {
    let tree = load(script)?;
    let d = FlatEvaluator::with_capacity(tree.len()).distance(&tree, p);
    let side = if d < 0.0 { "inside" } else { "outside" };
    println!("{} ({})", d, side);
    Ok(())
}

fn run_slice(
    script: &Path,
    z: f32,
    resolution: u32,
    extent: f32,
    output: Option<&Path>,
    settings: &Settings,
) -> Result<()> {
    if extent <= 0.0 {
        bail!("Slice extent must be positive, got {}", extent);
    }
    let tree = load(script)?;
    let slice = Slice::sample(&tree, resolution as usize, extent, z);

    match output {
        Some(path) => {
            slice
                .to_image()
                .save(path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Saved to: {}", path.display());
        }
        None => {
            println!("z = {}, x and y in [-{}, {}]", slice.z, slice.extent, slice.extent);
            print!("{}", slice.to_ascii(&settings.ramp()));
        }
    }
    Ok(())
}

fn run_dot(script: &Path, output: Option<&Path>, steps: Option<&Path>) -> Result<()> {
    if let Some(dir) = steps {
        write_steps(script, dir)?;
    }

    let dot = to_dot(&load(script)?);
    match output {
        Some(path) => {
            fs::write(path, dot).with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Saved to: {}", path.display());
        }
        None => print!("{}", dot),
    }
    Ok(())
}

/// One DOT file per applied statement, showing the tree as the parser
/// grows it.
fn write_steps(script: &Path, dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    let stem = script
        .file_stem()
        .map_or_else(|| "step".into(), |s| s.to_string_lossy());

    let file = fs::File::open(script)
        .with_context(|| format!("Failed to open {}", script.display()))?;
    let mut parser = ScriptParser::new();
    let mut written = 0;
    for line in BufReader::new(file).lines() {
        if parser.feed_line(&line?)? {
            let path = dir.join(format!("{}_{:03}.dot", stem, parser.statements()));
            fs::write(&path, to_dot(parser.tree()))
                .with_context(|| format!("Failed to write {}", path.display()))?;
            written += 1;
        }
    }

    tracing::info!("Wrote {} step graphs to {}", written, dir.display());
    Ok(())
}

fn run_wgsl(script: &Path, function_name: &str, full: bool) -> Result<()> {
    let tree = load(script)?;
    let generator = WgslGenerator::new().with_function_name(function_name);
    let code = if full {
        generator.build_shader(&tree)?
    } else {
        generator.generate(&tree)?
    };
    print!("{}", code);
    Ok(())
}

fn run_json(script: &Path) -> Result<()> {
    let tree = load(script)?;
    let json = serde_json::to_string_pretty(&tree).context("Failed to serialize tree")?;
    println!("{}", json);
    Ok(())
}

fn run_watch(script: &Path, debounce_ms: u64) -> Result<()> {
    if !script.exists() {
        bail!("Script file not found: {}", script.display());
    }

    let mut watcher = ScriptWatcher::new(Some(debounce_ms))?;
    watcher.watch(script)?;

    println!("Watching {}", script.display());
    println!("Press Ctrl+C to stop\n");

    let mut live = LiveScript::new(script);
    reload_and_report(&mut live);

    while let Some(event) = watcher.recv() {
        match event {
            WatchEvent::Modified(_) => reload_and_report(&mut live),
            WatchEvent::Error(e) => eprintln!("{}", e),
        }
    }

    Ok(())
}

fn reload_and_report(live: &mut LiveScript) {
    println!("--- Parsing: {} ---", live.path.display());

    if live.reload() {
        if let Some(tree) = &live.tree {
            let d = FlatEvaluator::with_capacity(tree.len()).distance(tree, Vec3::ZERO);
            println!("OK - {} nodes, distance at origin {}", tree.len(), d);
        }
    } else if let Some(error) = &live.last_error {
        eprintln!("ERROR:\n{}", error);
        if live.tree.is_some() {
            eprintln!("(keeping the previous tree)");
        }
    }
}

fn run_config(settings: &Settings, init: bool) -> Result<()> {
    let path = settings::settings_path().context("Could not determine config directory")?;
    if init {
        settings::save_settings(settings)?;
        println!("Wrote {}", path.display());
    } else {
        println!("# {}", path.display());
        println!("{}", serde_json::to_string_pretty(settings)?);
    }
    Ok(())
}
