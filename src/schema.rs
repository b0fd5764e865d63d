// Field-set schema: which fields exist, what shape they have, and where they appear.
//
// Every report layout variant is a `FieldSchema`. Renderers never guess whether a
// field is a scalar or a list; that is decided here and applied once at ingestion.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ReportError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaVersion {
    /// Registration, owner, inspector, checklists, notes, ratings and photos.
    #[default]
    Standard,
    /// Standard plus tyre positions, wheel condition, paint depth and repair cost.
    Extended,
}

impl FromStr for SchemaVersion {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "standard" => Ok(SchemaVersion::Standard),
            "extended" => Ok(SchemaVersion::Extended),
            other => Err(ReportError::ConfigError(format!(
                "unknown schema version '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaVersion::Standard => write!(f, "standard"),
            SchemaVersion::Extended => write!(f, "extended"),
        }
    }
}

// ============================================================================
// Field kinds
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    Scalar,
    List,
    Map,
}

/// Fields that always hold an ordered list of short strings.
pub const LIST_FIELDS: &[&str] = &[
    "exteriorChecks",
    "interiorChecks",
    "engineChecks",
    "tiresChecks",
    "structureChecks",
];

/// Fields that hold a nested mapping.
pub const MAP_FIELDS: &[&str] = &["ratings"];

/// Field that must be present for a report to be generated at all.
pub const REGISTRATION_NUMBER: &str = "registrationNumber";

pub fn field_kind(name: &str) -> FieldKind {
    if LIST_FIELDS.contains(&name) {
        FieldKind::List
    } else if MAP_FIELDS.contains(&name) {
        FieldKind::Map
    } else {
        FieldKind::Scalar
    }
}

// ============================================================================
// Row and slot declarations
// ============================================================================

/// How a displayed value is derived from record fields.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ValueSource {
    Key(&'static str),
    /// First non-empty of several aliases.
    FirstOf(&'static [&'static str]),
    /// Non-empty values joined with a space.
    Joined(&'static [&'static str]),
    /// Value followed by a unit, e.g. `45320 km`.
    WithUnit(&'static str, &'static str),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RowSpec {
    pub label: &'static str,
    pub source: ValueSource,
}

const fn row(label: &'static str, key: &'static str) -> RowSpec {
    RowSpec {
        label,
        source: ValueSource::Key(key),
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhotoSlot {
    pub key: &'static str,
    pub caption: &'static str,
}

const fn slot(key: &'static str, caption: &'static str) -> PhotoSlot {
    PhotoSlot { key, caption }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RatingSpec {
    pub key: &'static str,
    pub label: &'static str,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Area {
    Exterior,
    Interior,
    Engine,
    Tires,
    Structure,
}

impl Area {
    pub const ALL: [Area; 5] = [
        Area::Exterior,
        Area::Interior,
        Area::Engine,
        Area::Tires,
        Area::Structure,
    ];

    /// Prefix used for extra photo slots, e.g. `exterior/scratchRearDoor`.
    pub fn slug(&self) -> &'static str {
        match self {
            Area::Exterior => "exterior",
            Area::Interior => "interior",
            Area::Engine => "engine",
            Area::Tires => "tires",
            Area::Structure => "structure",
        }
    }
}

/// One per-area inspection section.
#[derive(Clone, Debug, PartialEq)]
pub struct AreaSpec {
    pub area: Area,
    pub title: &'static str,
    pub checklist: &'static str,
    pub notes: &'static str,
    /// Labeled values shown as a boxed block (tyre positions).
    pub rows: Vec<RowSpec>,
    /// Extra free-text field with its heading (paint depth readings).
    pub detail: Option<(&'static str, &'static str)>,
    /// Highlighted cost badge (estimated repair cost).
    pub cost: Option<(&'static str, &'static str)>,
    pub photo_slots: Vec<PhotoSlot>,
    /// Checklist column length before wrapping to the next column.
    pub rows_per_column: usize,
}

// ============================================================================
// Schema
// ============================================================================

#[derive(Clone, Debug, PartialEq)]
pub struct FieldSchema {
    pub version: SchemaVersion,
    pub registration_left: Vec<RowSpec>,
    pub registration_right: Vec<RowSpec>,
    pub owner_left: Vec<RowSpec>,
    pub owner_right: Vec<RowSpec>,
    pub inspector: Vec<RowSpec>,
    pub ratings: Vec<RatingSpec>,
    pub document_photos: Vec<PhotoSlot>,
    pub areas: Vec<AreaSpec>,
}

impl FieldSchema {
    pub fn for_version(version: SchemaVersion) -> Self {
        let extended = version == SchemaVersion::Extended;

        let registration_left = vec![
            row("Vehicle Number", REGISTRATION_NUMBER),
            RowSpec {
                label: "Chassis Number",
                source: ValueSource::FirstOf(&["chassisNumber", "vinNumber"]),
            },
            row("Manufacture Year", "manufactureYear"),
            row("Fuel Type", "fuelType"),
            RowSpec {
                label: "Odometer Reading",
                source: ValueSource::WithUnit("odometerReading", "km"),
            },
            row("Variant", "variant"),
        ];
        let registration_right = vec![
            RowSpec {
                label: "Make / Model",
                source: ValueSource::Joined(&["make", "model"]),
            },
            row("Engine Number", "engineNumber"),
            row("Registration Date", "registrationDate"),
            row("Color", "color"),
            row("Number of Owners", "ownersCount"),
        ];

        let tire_rows = if extended {
            vec![
                row("Front LHS", "tireFrontLHS"),
                row("Front RHS", "tireFrontRHS"),
                row("Rear LHS", "tireRearLHS"),
                row("Rear RHS", "tireRearRHS"),
                row("Spare Tire", "tireSpare"),
                row("Alloy Wheels Condition", "wheelCondition"),
            ]
        } else {
            Vec::new()
        };

        let areas = vec![
            AreaSpec {
                area: Area::Exterior,
                title: "Exterior / Body Inspection",
                checklist: "exteriorChecks",
                notes: "exteriorNotes",
                rows: Vec::new(),
                detail: extended.then_some(("Paint Depth Readings:", "paintDepth")),
                cost: None,
                photo_slots: vec![
                    slot("frontBumper", "Front Bumper"),
                    slot("bonnet", "Bonnet"),
                    slot("grille", "Grille"),
                    slot("frontLeft", "Front Left"),
                    slot("frontRight", "Front Right"),
                    slot("leftSide", "Left Side"),
                    slot("rightSide", "Right Side"),
                    slot("rearBumper", "Rear Bumper"),
                    slot("bootLid", "Boot Lid"),
                    slot("roof", "Roof"),
                ],
                rows_per_column: 12,
            },
            AreaSpec {
                area: Area::Interior,
                title: "Interior Inspection",
                checklist: "interiorChecks",
                notes: "interiorNotes",
                rows: Vec::new(),
                detail: None,
                cost: None,
                photo_slots: vec![
                    slot("dashboard", "Dashboard"),
                    slot("frontSeats", "Front Seats"),
                    slot("rearSeats", "Rear Seats"),
                    slot("infotainment", "Infotainment"),
                    slot("roofLining", "Roof Lining"),
                    slot("boot", "Boot Space"),
                ],
                rows_per_column: 12,
            },
            AreaSpec {
                area: Area::Engine,
                title: "Engine & Mechanical Inspection",
                checklist: "engineChecks",
                notes: "engineNotes",
                rows: Vec::new(),
                detail: None,
                cost: extended.then_some(("Estimated Repair Cost", "repairCost")),
                photo_slots: vec![
                    slot("engineBay", "Engine Bay"),
                    slot("battery", "Battery"),
                    slot("engineNumberPlate", "Engine Number Plate"),
                ],
                rows_per_column: 12,
            },
            AreaSpec {
                area: Area::Tires,
                title: "Tires & Wheels Inspection",
                checklist: "tiresChecks",
                notes: "tiresNotes",
                rows: tire_rows,
                detail: None,
                cost: None,
                photo_slots: vec![
                    slot("tireFrontLeft", "Front Left Tire"),
                    slot("tireFrontRight", "Front Right Tire"),
                    slot("tireRearLeft", "Rear Left Tire"),
                    slot("tireRearRight", "Rear Right Tire"),
                    slot("spareTire", "Spare Tire"),
                ],
                rows_per_column: 12,
            },
            AreaSpec {
                area: Area::Structure,
                title: "Structure & Undercarriage",
                checklist: "structureChecks",
                notes: "structureNotes",
                rows: Vec::new(),
                detail: None,
                cost: None,
                photo_slots: vec![
                    slot("underbody", "Underbody"),
                    slot("pillars", "Pillars"),
                    slot("apronLeft", "Left Apron"),
                    slot("apronRight", "Right Apron"),
                ],
                rows_per_column: 8,
            },
        ];

        Self {
            version,
            registration_left,
            registration_right,
            owner_left: vec![
                row("Owner Name", "ownerName"),
                row("Email Address", "ownerEmail"),
            ],
            owner_right: vec![
                row("Contact Number", "ownerContact"),
                row("Inspection Location", "location"),
            ],
            inspector: vec![
                row("Inspector Name", "inspectorName"),
                row("Inspector Location", "inspectorLocation"),
            ],
            ratings: vec![
                RatingSpec { key: "interior", label: "Interior" },
                RatingSpec { key: "exterior", label: "Exterior / Body" },
                RatingSpec { key: "engine", label: "Engine" },
                RatingSpec { key: "structure", label: "Structure" },
                RatingSpec { key: "testDrive", label: "Test Drive" },
                RatingSpec { key: "electrical", label: "Electrical" },
            ],
            document_photos: vec![
                slot("rcBook", "RC Book"),
                slot("chassisPlate", "Chassis Plate"),
                slot("odometer", "Odometer"),
            ],
            areas,
        }
    }

    /// True when `key` names a slot this schema places somewhere.
    pub fn declares_slot(&self, key: &str) -> bool {
        self.document_photos.iter().any(|s| s.key == key)
            || self
                .areas
                .iter()
                .any(|a| a.photo_slots.iter().any(|s| s.key == key))
    }
}

/// `frontBumper` -> `Front Bumper`, `tire_spare` -> `Tire Spare`.
pub fn humanize_slot(key: &str) -> String {
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();
    for ch in key.chars() {
        if ch == '_' || ch == '-' || ch == ' ' || ch == '/' {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }
        if ch.is_uppercase() && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        current.push(ch);
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
        .iter()
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_and_map_fields_are_declared() {
        assert_eq!(field_kind("exteriorChecks"), FieldKind::List);
        assert_eq!(field_kind("ratings"), FieldKind::Map);
        assert_eq!(field_kind("ownerName"), FieldKind::Scalar);
    }

    #[test]
    fn extended_schema_adds_tire_rows_and_paint_depth() {
        let standard = FieldSchema::for_version(SchemaVersion::Standard);
        let extended = FieldSchema::for_version(SchemaVersion::Extended);
        let tires = |s: &FieldSchema| s.areas.iter().find(|a| a.area == Area::Tires).unwrap().rows.len();
        assert_eq!(tires(&standard), 0);
        assert_eq!(tires(&extended), 6);
        assert!(extended.areas[0].detail.is_some());
        assert!(standard.areas[0].detail.is_none());
    }

    #[test]
    fn areas_follow_report_order() {
        let schema = FieldSchema::for_version(SchemaVersion::Standard);
        let order: Vec<Area> = schema.areas.iter().map(|a| a.area).collect();
        assert_eq!(order, Area::ALL.to_vec());
        assert!(schema.declares_slot("frontBumper"));
        assert!(schema.declares_slot("rcBook"));
        assert!(!schema.declares_slot("sunroof"));
    }

    #[test]
    fn humanizes_slot_names() {
        assert_eq!(humanize_slot("frontBumper"), "Front Bumper");
        assert_eq!(humanize_slot("tire_spare"), "Tire Spare");
        assert_eq!(humanize_slot("exterior/scratchRearDoor"), "Exterior Scratch Rear Door");
    }

    #[test]
    fn parses_schema_versions() {
        assert_eq!("Extended".parse::<SchemaVersion>().unwrap(), SchemaVersion::Extended);
        assert!("v9".parse::<SchemaVersion>().is_err());
    }
}
