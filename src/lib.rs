// Copyright: Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Removal of the attribution is not allowed, as covered under the AGPL license

#![deny(
    clippy::mutable_key_type,
    clippy::map_entry,
    clippy::boxed_local,
    clippy::let_unit_value,
    clippy::redundant_allocation,
    clippy::bool_comparison,
    clippy::bind_instead_of_map,
    clippy::vec_box,
    clippy::while_let_loop,
    clippy::useless_asref,
    clippy::repeat_once,
    clippy::deref_addrof,
    clippy::suspicious_map,
    clippy::single_char_pattern,
    clippy::for_kv_map,
    clippy::let_and_return,
    clippy::iter_nth,
    clippy::iter_cloned_collect,
    clippy::match_result_ok,
    clippy::cmp_owned,
    clippy::op_ref
)]

pub mod config;
pub mod error;
pub mod export;
pub mod graph_builder;
pub mod osm_reader;
pub mod osm_types;
pub mod pipeline;
pub mod projection;
pub mod road_graph;
pub mod simplify;
pub mod spatial_filter;
pub mod tag_classifier;
pub mod topology;


pub use config::PipelineConfig;
pub use error::RoadNetError;
pub use road_graph::{EdgeKey, RoadAttributes, RoadEdge, RoadGraph, RoadNode};
