//! Vendor field name translation.
//!
//! Each format has its own vocabulary for the same measurements. Mappers look up
//! a normalized field name (lowercase, separators stripped) in a table and
//! either route the value into a canonical slot, rename it to a standardized
//! additional field, or keep it under its original name.

use super::RawPoint;

/// Canonical slots a vendor field can land in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    HeartRate,
    Power,
    Cadence,
    Speed,
    Temperature,
    Altitude,
    Distance,
}

/// Outcome of looking up a vendor field name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappedField {
    /// Value belongs in a canonical slot
    Slot(Slot),
    /// Value is kept as an additional field under a standardized name
    Additional(&'static str),
    /// Value is kept under its original name
    Unknown,
}

/// Lowercase a field name and strip `_`, `-`, `.`, `:` and spaces.
pub fn normalize_field_name(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '_' | '-' | '.' | ':' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Per-format translation of vendor field names.
pub trait FieldMapper {
    /// Look up an already-normalized name.
    fn lookup(&self, normalized: &str) -> Option<MappedField>;

    /// Map a raw vendor field name.
    fn map(&self, name: &str) -> MappedField {
        self.lookup(&normalize_field_name(name))
            .unwrap_or(MappedField::Unknown)
    }

    /// Store `value` in `point` according to the mapping of `name`.
    fn apply(&self, name: &str, value: f64, point: &mut RawPoint) {
        if !value.is_finite() {
            return;
        }
        match self.map(name) {
            MappedField::Slot(slot) => point.set_slot(slot, value),
            MappedField::Additional(standard) => {
                point.extra.insert(standard.to_string(), value);
            }
            MappedField::Unknown => {
                point.extra.insert(name.to_string(), value);
            }
        }
    }
}

fn find(table: &[(&str, MappedField)], normalized: &str) -> Option<MappedField> {
    table
        .iter()
        .find(|(key, _)| *key == normalized)
        .map(|(_, mapped)| *mapped)
}

/// Names shared by every GPS-capable format.
const COMMON_FIELDS: &[(&str, MappedField)] = &[
    ("sat", MappedField::Additional("satellites")),
    ("satellites", MappedField::Additional("satellites")),
    ("hdop", MappedField::Additional("hdop")),
    ("vdop", MappedField::Additional("vdop")),
    ("pdop", MappedField::Additional("pdop")),
    ("gpsaccuracy", MappedField::Additional("gps_accuracy")),
];

const GPX_FIELDS: &[(&str, MappedField)] = &[
    ("hr", MappedField::Slot(Slot::HeartRate)),
    ("heartrate", MappedField::Slot(Slot::HeartRate)),
    ("cad", MappedField::Slot(Slot::Cadence)),
    ("cadence", MappedField::Slot(Slot::Cadence)),
    ("power", MappedField::Slot(Slot::Power)),
    ("watts", MappedField::Slot(Slot::Power)),
    ("pwr", MappedField::Slot(Slot::Power)),
    ("speed", MappedField::Slot(Slot::Speed)),
    ("atemp", MappedField::Slot(Slot::Temperature)),
    ("temp", MappedField::Slot(Slot::Temperature)),
    ("temperature", MappedField::Slot(Slot::Temperature)),
    ("ele", MappedField::Slot(Slot::Altitude)),
    ("distance", MappedField::Slot(Slot::Distance)),
];

const TCX_FIELDS: &[(&str, MappedField)] = &[
    ("heartratebpm", MappedField::Slot(Slot::HeartRate)),
    ("cadence", MappedField::Slot(Slot::Cadence)),
    ("runcadence", MappedField::Slot(Slot::Cadence)),
    ("watts", MappedField::Slot(Slot::Power)),
    ("speed", MappedField::Slot(Slot::Speed)),
    ("altitudemeters", MappedField::Slot(Slot::Altitude)),
    ("distancemeters", MappedField::Slot(Slot::Distance)),
    ("temperature", MappedField::Slot(Slot::Temperature)),
];

const FIT_FIELDS: &[(&str, MappedField)] = &[
    ("heartrate", MappedField::Slot(Slot::HeartRate)),
    ("power", MappedField::Slot(Slot::Power)),
    ("cadence", MappedField::Slot(Slot::Cadence)),
    ("speed", MappedField::Slot(Slot::Speed)),
    ("enhancedspeed", MappedField::Slot(Slot::Speed)),
    ("temperature", MappedField::Slot(Slot::Temperature)),
    ("altitude", MappedField::Slot(Slot::Altitude)),
    ("enhancedaltitude", MappedField::Slot(Slot::Altitude)),
    ("distance", MappedField::Slot(Slot::Distance)),
];

/// Garmin writes cadence under sport-specific names.
const GARMIN_FIT_FIELDS: &[(&str, MappedField)] = &[
    ("runcadence", MappedField::Slot(Slot::Cadence)),
    ("bikecadence", MappedField::Slot(Slot::Cadence)),
];

/// Field names found in GPX `<trkpt>` children and extension blocks.
#[derive(Debug, Default, Clone, Copy)]
pub struct GpxFieldMapper;

impl FieldMapper for GpxFieldMapper {
    fn lookup(&self, normalized: &str) -> Option<MappedField> {
        find(GPX_FIELDS, normalized).or_else(|| find(COMMON_FIELDS, normalized))
    }
}

/// Field names found in TCX `<Trackpoint>` elements and the TPX extension.
#[derive(Debug, Default, Clone, Copy)]
pub struct TcxFieldMapper;

impl FieldMapper for TcxFieldMapper {
    fn lookup(&self, normalized: &str) -> Option<MappedField> {
        find(TCX_FIELDS, normalized).or_else(|| find(COMMON_FIELDS, normalized))
    }
}

/// Field names of FIT `record` messages.
#[derive(Debug, Default, Clone, Copy)]
pub struct FitFieldMapper;

impl FieldMapper for FitFieldMapper {
    fn lookup(&self, normalized: &str) -> Option<MappedField> {
        find(FIT_FIELDS, normalized).or_else(|| find(COMMON_FIELDS, normalized))
    }
}

/// FIT mapper for Garmin devices: Garmin-specific names first, then the
/// generic FIT table.
#[derive(Debug, Default, Clone, Copy)]
pub struct GarminFitFieldMapper {
    base: FitFieldMapper,
}

impl FieldMapper for GarminFitFieldMapper {
    fn lookup(&self, normalized: &str) -> Option<MappedField> {
        find(GARMIN_FIT_FIELDS, normalized).or_else(|| self.base.lookup(normalized))
    }
}
