use crate::export::OutputFormat;
use crate::projection::SpatialReference;
use crate::spatial_filter::BoundingBox;
use crate::tag_classifier::LevelTable;
use std::path::PathBuf;

/// Everything a pipeline run needs. Parsing of raw values happens before this
/// is built, so a `PipelineConfig` is always valid.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    pub format: OutputFormat,
    pub bbox: Option<BoundingBox>,
    pub clean: bool,
    pub simplify: bool,
    /// Repeat simplification until nothing changes. Implies `simplify`.
    pub simplify_fixpoint: bool,
    /// `None` skips length computation.
    pub distance: Option<SpatialReference>,
    pub level_table: LevelTable,
    /// Also log the level table in use.
    pub verbose: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::new(),
            output: PathBuf::from("roadNetwork.json"),
            format: OutputFormat::Json,
            bbox: None,
            clean: false,
            simplify: false,
            simplify_fixpoint: false,
            distance: Some(SpatialReference::default()),
            level_table: LevelTable::default(),
            verbose: false,
        }
    }
}
