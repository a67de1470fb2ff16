//! Activity model: records, laps and activities.

pub mod types;

pub use types::{
    column, extra_field_names, present_fields, with_column, Activity, ActivityRecord, Color,
    Field, Lap, Metric, ACTIVITY_COLORS,
};
