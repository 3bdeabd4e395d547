use anyhow::{Context, Result};
use clap::Parser;
use roadnet::export::OutputFormat;
use roadnet::pipeline::run_and_export;
use roadnet::projection::SpatialReference;
use roadnet::spatial_filter::BoundingBox;
use roadnet::tag_classifier::LevelTable;
use roadnet::PipelineConfig;
use std::path::PathBuf;
use std::time::Instant;

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

fn parse_epsg(raw: &str) -> Result<SpatialReference, String> {
    let code: u32 = raw
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not an EPSG code", raw))?;
    SpatialReference::from_epsg(code).map_err(|e| e.to_string())
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// OSM extract to read (.osm.pbf)
    #[arg(env = "ROADNET_INPUT")]
    input: PathBuf,

    /// Where to write the graph
    #[arg(short, long, env = "ROADNET_OUTPUT", default_value = "roadNetwork.json")]
    output: PathBuf,

    /// json, geojson, csv, graphml or gexf. Inferred from the output extension when omitted.
    #[arg(short, long)]
    format: Option<OutputFormat>,

    /// Keep only nodes inside "lon,lat,lon,lat" (any two opposite corners)
    #[arg(long, allow_hyphen_values = true)]
    bbox: Option<BoundingBox>,

    /// Drop nodes without coordinates, isolated nodes and self-loops
    #[arg(long)]
    clean: bool,

    /// Contract chains of degree-2 nodes once
    #[arg(long)]
    simplify: bool,

    /// Contract chains until nothing changes
    #[arg(long)]
    simplify_fixpoint: bool,

    /// Spatial reference used for edge lengths
    #[arg(long, value_parser = parse_epsg, default_value = "3857", conflicts_with = "no_distance")]
    epsg: SpatialReference,

    /// Do not compute edge lengths
    #[arg(long)]
    no_distance: bool,

    /// JSON level table replacing the built-in one
    #[arg(long, env = "ROADNET_LEVEL_TABLE")]
    level_table: Option<PathBuf>,

    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(if args.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .init();

    let start = Instant::now();

    let format = args
        .format
        .or_else(|| OutputFormat::from_path(&args.output))
        .unwrap_or_default();

    let level_table = match &args.level_table {
        Some(path) => LevelTable::from_json_file(path)
            .with_context(|| format!("loading level table {}", path.display()))?,
        None => LevelTable::default(),
    };

    let distance = (!args.no_distance).then_some(args.epsg);

    let config = PipelineConfig {
        input: args.input,
        output: args.output,
        format,
        bbox: args.bbox,
        clean: args.clean,
        simplify: args.simplify,
        simplify_fixpoint: args.simplify_fixpoint,
        distance,
        level_table,
        verbose: args.verbose,
    };

    let report = run_and_export(&config)
        .with_context(|| format!("processing {}", config.input.display()))?;

    println!(
        "Wrote {} ({}) in {:.2?}",
        config.output.display(),
        report.summary,
        start.elapsed()
    );

    Ok(())
}
