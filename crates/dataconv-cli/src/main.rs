//! # dataconv-cli
//!
//! Command-line front end: runs a YAML mapping between two record files.

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use dataconv_mapping::{Direction, ExtensionRegistry, Mapping, MappingDsl, MappingRuntime};
use dataconv_record::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dataconv")]
#[command(about = "Bidirectional record conversion driven by path mappings")]
#[command(version)]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Copy values from one record into the other
    Convert {
        /// Mapping file path
        #[arg(short, long)]
        mapping: PathBuf,

        /// Side A record (JSON or YAML)
        #[arg(long)]
        side_a: Option<PathBuf>,

        /// Side B record (JSON or YAML)
        #[arg(long)]
        side_b: Option<PathBuf>,

        /// Run opposite to the mapping's direction
        #[arg(long)]
        reverse: bool,

        /// Where to write the destination record; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Load a mapping and report wildcard parity in both directions
    Check {
        /// Mapping file path
        #[arg(short, long)]
        mapping: PathBuf,

        /// Require the direction opposite to the mapping's to pass
        #[arg(long)]
        reverse: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Convert {
            mapping,
            side_a,
            side_b,
            reverse,
            output,
        } => convert(
            &mapping,
            side_a.as_deref(),
            side_b.as_deref(),
            reverse,
            output.as_deref(),
        ),
        Commands::Check { mapping, reverse } => check(&mapping, reverse),
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_mapping(path: &Path) -> anyhow::Result<(Mapping, Direction, MappingRuntime)> {
    let definition = MappingDsl::parse_file(path)
        .with_context(|| format!("Failed to load mapping {}", path.display()))?;
    let runtime = MappingRuntime::with_extensions(ExtensionRegistry::with_builtins()?);
    let mapping = runtime
        .load(&definition)
        .with_context(|| format!("Invalid mapping {}", path.display()))?;
    Ok((mapping, definition.direction, runtime))
}

fn pick_direction(default_direction: Direction, reverse: bool) -> Direction {
    if reverse {
        default_direction.reversed()
    } else {
        default_direction
    }
}

fn convert(
    mapping_path: &Path,
    side_a: Option<&Path>,
    side_b: Option<&Path>,
    reverse: bool,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let (mapping, default_direction, runtime) = load_mapping(mapping_path)?;
    let direction = pick_direction(default_direction, reverse);

    let (source_path, destination_path) = match direction {
        Direction::AToB => (side_a, side_b),
        Direction::BToA => (side_b, side_a),
    };
    let Some(source_path) = source_path else {
        bail!(
            "Direction {direction} reads {}, pass it with {}",
            source_side(direction),
            source_flag(direction)
        );
    };

    let mut source = read_record(source_path)?;
    let mut destination = match destination_path {
        Some(path) => read_record(path)?,
        None => Value::Map(dataconv_record::Map::new()),
    };
    info!(
        mapping = mapping.name(),
        %direction,
        source = %source_path.display(),
        "converting"
    );

    let outcome = match direction {
        Direction::AToB => runtime.execute(&mapping, &mut source, &mut destination, direction),
        Direction::BToA => runtime.execute(&mapping, &mut destination, &mut source, direction),
    };

    write_record(output, &destination)?;

    if let Err(failure) = outcome {
        for item in failure.failures() {
            error!("{item}");
        }
        return Err(failure.into());
    }
    Ok(())
}

fn source_side(direction: Direction) -> &'static str {
    match direction {
        Direction::AToB => "side A",
        Direction::BToA => "side B",
    }
}

fn source_flag(direction: Direction) -> &'static str {
    match direction {
        Direction::AToB => "--side-a",
        Direction::BToA => "--side-b",
    }
}

fn check(mapping_path: &Path, reverse: bool) -> anyhow::Result<()> {
    let (mapping, default_direction, _) = load_mapping(mapping_path)?;
    let required = pick_direction(default_direction, reverse);

    println!("mapping '{}': {} setting(s)", mapping.name(), mapping.len());
    let mut required_failed = None;
    for direction in [Direction::AToB, Direction::BToA] {
        match mapping.validate(direction) {
            Ok(()) => println!("  {direction}: ok"),
            Err(failure) => {
                println!(
                    "  {direction}: {} problem(s)",
                    failure.failures().len()
                );
                for item in failure.failures() {
                    println!("    {item}");
                }
                if direction == required {
                    required_failed = Some(failure);
                }
            }
        }
    }

    match required_failed {
        Some(failure) => Err(failure.into()),
        None => Ok(()),
    }
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("yaml" | "yml")
    )
}

fn read_record(path: &Path) -> anyhow::Result<Value> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let record = if is_yaml(path) {
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse YAML record {}", path.display()))?
    } else {
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse JSON record {}", path.display()))?
    };
    Ok(record)
}

fn write_record(output: Option<&Path>, record: &Value) -> anyhow::Result<()> {
    let mut rendered = serde_json::to_string_pretty(record)?;
    rendered.push('\n');
    match output {
        Some(path) => fs::write(path, rendered)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => print!("{rendered}"),
    }
    Ok(())
}
