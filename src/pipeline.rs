use crate::config::PipelineConfig;
use crate::error::RoadNetError;
use crate::export::write_graph;
use crate::graph_builder::BuildStats;
use crate::osm_reader::read_extract;
use crate::projection::{LengthStats, assign_lengths};
use crate::road_graph::{GraphSummary, RoadGraph};
use crate::simplify::{simplify_chains, simplify_to_fixpoint};
use crate::spatial_filter::filter_to_bbox;
use crate::tag_classifier::LevelTable;
use crate::topology::{CleanReport, clean};
use tracing::info;

/// What each stage did. `None` means the stage did not run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineReport {
    pub build: BuildStats,
    pub filtered_nodes: Option<usize>,
    pub clean: Option<CleanReport>,
    pub lengths: Option<LengthStats>,
    /// `(passes, contractions)`
    pub simplify: Option<(usize, usize)>,
    pub summary: GraphSummary,
}

fn log_summary(stage: &str, graph: &RoadGraph) {
    debug_assert!(graph.check_integrity().is_empty());
    info!("{}: {}", stage, graph.summary());
}

fn log_level_table(table: &LevelTable) {
    for entry in table.entries() {
        info!("level {}: {}", entry.level, entry.classes.join(", "));
    }
    info!("level {}: anything else", table.fallback_level());
}

/// Run every enabled stage after construction, in order:
/// bounding box, clean, lengths, simplify.
pub fn process(graph: &mut RoadGraph, config: &PipelineConfig) -> PipelineReport {
    let mut report = PipelineReport::default();

    if let Some(bbox) = &config.bbox {
        info!("Bounding boxing to {}", bbox);
        report.filtered_nodes = Some(filter_to_bbox(graph, bbox));
        log_summary("bounding box", graph);
    }

    if config.clean {
        info!("Cleaning the graph");
        report.clean = Some(clean(graph));
        log_summary("clean", graph);
    }

    if let Some(reference) = &config.distance {
        info!("Computing edge lengths in EPSG:{}", reference.epsg());
        report.lengths = Some(assign_lengths(graph, reference));
    }

    if config.simplify_fixpoint {
        info!("Simplifying chains until stable");
        report.simplify = Some(simplify_to_fixpoint(graph));
        log_summary("simplify", graph);
    } else if config.simplify {
        info!("Simplifying chains");
        report.simplify = Some((1, simplify_chains(graph)));
        log_summary("simplify", graph);
    }

    report.summary = graph.summary();
    report
}

/// Read the extract named in `config` and run the enabled stages on it.
pub fn run(config: &PipelineConfig) -> Result<(RoadGraph, PipelineReport), RoadNetError> {
    if config.verbose {
        log_level_table(&config.level_table);
    }

    info!("Parsing {}", config.input.display());
    let (mut graph, build) = read_extract(&config.input, &config.level_table)?;
    info!(
        "{} of {} ways kept, {} tag diagnostics",
        build.ways_kept, build.ways_seen, build.diagnostics
    );
    log_summary("parsed", &graph);

    let mut report = process(&mut graph, config);
    report.build = build;
    Ok((graph, report))
}

/// [`run`], then write the result where `config` says.
pub fn run_and_export(config: &PipelineConfig) -> Result<PipelineReport, RoadNetError> {
    let (graph, report) = run(config)?;

    info!(
        "Writing {} graph in {}",
        config.format,
        config.output.display()
    );
    write_graph(&graph, &config.output, config.format)?;

    Ok(report)
}
