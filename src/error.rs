//! Error types for the road network pipeline.
//!
//! Per-record anomalies (bad lane counts, unknown highway classes, edges
//! without coordinates) never surface here; they are absorbed with a default
//! and a log line. These errors are the fatal, run-aborting kind.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum BoundingBoxError {
    #[error("bounding box needs 4 coordinates (lon,lat,lon,lat), got {0}")]
    WrongCount(usize),
    #[error("bounding box coordinate '{0}' is not a number")]
    NotANumber(String),
    #[error("bounding box coordinate {0} is not finite")]
    NotFinite(f64),
}

#[derive(Error, Debug, PartialEq)]
pub enum ProjectionError {
    #[error("EPSG:{0} is not a supported target spatial reference")]
    UnsupportedEpsg(u32),
}

#[derive(Error, Debug)]
pub enum LevelTableError {
    #[error("I/O error reading level table '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed level table '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("level table has no entries")]
    Empty,
}

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("I/O error opening extract '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to decode extract '{path}': {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: osmpbfreader::Error,
    },
    #[error("extract reader thread panicked")]
    ProducerPanicked,
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("I/O error writing '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("CSV encoding failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("XML encoding failed: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("unknown output format '{0}', expected json, geojson, csv, graphml or gexf")]
    UnknownFormat(String),
}

#[derive(Error, Debug)]
pub enum RoadNetError {
    #[error(transparent)]
    BoundingBox(#[from] BoundingBoxError),
    #[error(transparent)]
    Projection(#[from] ProjectionError),
    #[error(transparent)]
    LevelTable(#[from] LevelTableError),
    #[error(transparent)]
    Extract(#[from] ExtractError),
    #[error(transparent)]
    Export(#[from] ExportError),
}
