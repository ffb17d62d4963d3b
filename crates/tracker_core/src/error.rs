use thiserror::Error;

/// A day argument that cannot address the tracked month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("day {day} is outside 1..={days_in_month}")]
pub struct DayError {
    pub day: u32,
    pub days_in_month: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("month index {0} is outside 0..=11")]
pub struct MonthError(pub u32);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutineError {
    #[error("invalid routine file: {0}")]
    Malformed(String),
    #[error("routine for {day} item {index} has an empty `{field}`")]
    EmptyField {
        day: String,
        index: usize,
        field: &'static str,
    },
    #[error("unknown weekday `{0}`")]
    UnknownWeekday(String),
    #[error("unknown day group preset `{0}`")]
    UnknownPreset(String),
    #[error("please assign all days, missing: {}", .0.join(", "))]
    UnassignedDays(Vec<String>),
    #[error("{day} is assigned to both `{first}` and `{second}`")]
    OverlappingDay {
        day: String,
        first: String,
        second: String,
    },
    #[error("at least one day group is required")]
    NoGroups,
}
