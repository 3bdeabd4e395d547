//! Maps raw OSM way tags onto typed [`RoadAttributes`].
//!
//! Classification is pure: anything unusual in the tags is replaced by a safe
//! default and reported as a [`TagDiagnostic`] on the result. It never fails.

use crate::error::LevelTableError;
use crate::osm_types::WayTags;
use crate::road_graph::{RoadAttributes, RoadLevel};
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

pub const UNCLASSIFIED: &str = "unclassified";
pub const DEFAULT_LANES: u32 = 1;
pub const DEFAULT_FALLBACK_LEVEL: RoadLevel = 7;

/// One row of the level table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelEntry {
    pub level: RoadLevel,
    pub classes: Vec<String>,
}

/// On-disk shape of a level table file.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct LevelTableFile {
    levels: Vec<LevelEntry>,
    #[serde(default = "default_fallback_level")]
    fallback_level: RoadLevel,
}

fn default_fallback_level() -> RoadLevel {
    DEFAULT_FALLBACK_LEVEL
}

/// Ordered (level, classes) table. When a class appears in several entries the
/// earliest entry wins.
#[derive(Debug, Clone)]
pub struct LevelTable {
    entries: Vec<LevelEntry>,
    lookup: AHashMap<String, RoadLevel>,
    fallback_level: RoadLevel,
}

impl LevelTable {
    pub fn new(entries: Vec<LevelEntry>, fallback_level: RoadLevel) -> Self {
        let entries: Vec<LevelEntry> = entries
            .into_iter()
            .map(|entry| LevelEntry {
                level: entry.level,
                classes: entry
                    .classes
                    .iter()
                    .map(|c| c.to_ascii_lowercase())
                    .collect(),
            })
            .collect();

        let mut lookup = AHashMap::new();
        for entry in &entries {
            for class in &entry.classes {
                lookup.entry(class.clone()).or_insert(entry.level);
            }
        }

        Self {
            entries,
            lookup,
            fallback_level,
        }
    }

    /// Load a table from JSON:
    /// `{"levels":[{"level":1,"classes":["motorway"]}],"fallback_level":7}`
    pub fn from_json_file(path: &Path) -> Result<Self, LevelTableError> {
        let raw = fs::read_to_string(path).map_err(|source| LevelTableError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw).map_err(|err| match err {
            LevelTableError::Parse { source, .. } => LevelTableError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    pub fn from_json_str(raw: &str) -> Result<Self, LevelTableError> {
        let file: LevelTableFile =
            serde_json::from_str(raw).map_err(|source| LevelTableError::Parse {
                path: Default::default(),
                source,
            })?;
        if file.levels.is_empty() {
            return Err(LevelTableError::Empty);
        }
        Ok(Self::new(file.levels, file.fallback_level))
    }

    /// Level of the first entry containing `class` (case-insensitive).
    pub fn level_of(&self, class: &str) -> Option<RoadLevel> {
        self.lookup.get(&class.to_ascii_lowercase()).copied()
    }

    pub fn fallback_level(&self) -> RoadLevel {
        self.fallback_level
    }

    pub fn entries(&self) -> &[LevelEntry] {
        &self.entries
    }
}

impl Default for LevelTable {
    fn default() -> Self {
        let entry = |level: RoadLevel, classes: &[&str]| LevelEntry {
            level,
            classes: classes.iter().map(|c| c.to_string()).collect(),
        };

        Self::new(
            vec![
                entry(1, &["motorway", "motorway_link", "trunk", "trunk_link"]),
                entry(2, &["primary", "primary_link"]),
                entry(3, &["secondary", "secondary_link"]),
                entry(4, &["tertiary", "tertiary_link"]),
                entry(
                    5,
                    &["unclassified", "residential", "living_street", "road", "service"],
                ),
                entry(
                    6,
                    &[
                        "pedestrian", "footway", "cycleway", "path", "steps", "track",
                        "bridleway",
                    ],
                ),
            ],
            DEFAULT_FALLBACK_LEVEL,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaneDefaultReason {
    NoLeadingDigits,
    Overflow,
}

/// Outcome of reading a `lanes=*` value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaneParse {
    Parsed(u32),
    Defaulted {
        raw: String,
        reason: LaneDefaultReason,
    },
}

impl LaneParse {
    pub fn value(&self) -> u32 {
        match self {
            LaneParse::Parsed(n) => *n,
            LaneParse::Defaulted { .. } => DEFAULT_LANES,
        }
    }
}

/// Reads the leading run of ASCII digits, so `"3 lanes"` and `"2;3"` parse.
pub fn parse_lanes(raw: &str) -> LaneParse {
    let end = raw
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map_or(raw.len(), |(i, _)| i);

    let defaulted = |reason| LaneParse::Defaulted {
        raw: raw.to_string(),
        reason,
    };

    if end == 0 {
        return defaulted(LaneDefaultReason::NoLeadingDigits);
    }

    match raw[..end].parse::<u32>() {
        Ok(n) => LaneParse::Parsed(n),
        Err(_) => defaulted(LaneDefaultReason::Overflow),
    }
}

/// Non-fatal anomaly found while classifying a way.
#[derive(Debug, Clone, PartialEq)]
pub enum TagDiagnostic {
    UnparsableLanes {
        raw: String,
        reason: LaneDefaultReason,
    },
    NonAsciiHighway {
        raw: String,
    },
    UnknownHighwayClass {
        class: String,
        fallback: RoadLevel,
    },
}

impl fmt::Display for TagDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagDiagnostic::UnparsableLanes { raw, reason } => {
                let why = match reason {
                    LaneDefaultReason::NoLeadingDigits => "no leading digits",
                    LaneDefaultReason::Overflow => "value too large",
                };
                write!(f, "lanes={raw:?} ({why}), using {DEFAULT_LANES}")
            }
            TagDiagnostic::NonAsciiHighway { raw } => {
                write!(f, "highway={raw:?} is not ASCII, using {UNCLASSIFIED}")
            }
            TagDiagnostic::UnknownHighwayClass { class, fallback } => {
                write!(f, "highway={class:?} not in level table, using level {fallback}")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub attrs: RoadAttributes,
    pub diagnostics: Vec<TagDiagnostic>,
}

fn is_cycleway(class: &str) -> bool {
    class.starts_with("cycleway")
}

/// Whether a way belongs to the road network at all.
pub fn is_road(tags: &WayTags) -> bool {
    tags.contains_key("highway")
}

/// Classify a way's tags. `None` when the way carries no `highway` tag and
/// therefore is not part of the road network.
pub fn classify(tags: &WayTags, table: &LevelTable) -> Option<Classification> {
    let raw_highway = tags.get("highway")?;
    let mut diagnostics = Vec::new();

    let lanes = match tags.get("lanes") {
        None => DEFAULT_LANES,
        Some(raw) => {
            let parsed = parse_lanes(raw);
            if let LaneParse::Defaulted { raw, reason } = &parsed {
                diagnostics.push(TagDiagnostic::UnparsableLanes {
                    raw: raw.clone(),
                    reason: *reason,
                });
            }
            parsed.value()
        }
    };

    let oneway = tags.get("oneway").is_some_and(|v| v == "yes");

    let highway = if raw_highway.is_ascii() {
        raw_highway.clone()
    } else {
        diagnostics.push(TagDiagnostic::NonAsciiHighway {
            raw: raw_highway.clone(),
        });
        UNCLASSIFIED.to_string()
    };

    let bicycle = match tags.get("bicycle") {
        Some(v) => v == "yes" || v == "designated",
        None => is_cycleway(&highway),
    };

    let pedestrian = match tags.get("foot") {
        Some(v) => v == "yes",
        None => highway == "pedestrian" || highway == "footway",
    };

    let level = match table.level_of(&highway) {
        Some(level) => level,
        None => {
            let fallback = table.fallback_level();
            diagnostics.push(TagDiagnostic::UnknownHighwayClass {
                class: highway.clone(),
                fallback,
            });
            fallback
        }
    };

    Some(Classification {
        attrs: RoadAttributes {
            highway,
            level,
            lanes,
            oneway,
            bicycle,
            pedestrian,
        },
        diagnostics,
    })
}
