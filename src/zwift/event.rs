//! Typed views over raw event payloads.
//!
//! The remote API uses camelCase keys. Each view resolves a logical
//! snake_case field name to its key only when the field is read, so fields
//! that are never read are never validated. Fields that need more than a
//! plain JSON read (timestamps, nested subgroups) are listed in a per-type
//! descriptor table.

use super::reference::{ReferenceTable, RouteInfo};
use super::tags;
use crate::error::ModelError;

use serde_json::{Map, Value};
use std::collections::HashSet;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use tracing::warn;

pub type RawRecord = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Timestamp,
    Subgroups,
}

#[derive(Debug, Clone, Copy)]
struct FieldDescriptor {
    name: &'static str,
    format: Format,
}

const fn timestamp(name: &'static str) -> FieldDescriptor {
    FieldDescriptor {
        name,
        format: Format::Timestamp,
    }
}

const EVENT_FIELDS: &[FieldDescriptor] = &[
    timestamp("event_start"),
    FieldDescriptor {
        name: "event_subgroups",
        format: Format::Subgroups,
    },
];

const SUBGROUP_FIELDS: &[FieldDescriptor] = &[
    timestamp("registration_start"),
    timestamp("registration_end"),
    timestamp("line_up_start"),
    timestamp("line_up_end"),
    timestamp("event_subgroup_start"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventType {
    Race,
    GroupRide,
    GroupWorkout,
    TimeTrial,
}

impl EventType {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "RACE" => Some(Self::Race),
            "GROUP_RIDE" => Some(Self::GroupRide),
            "GROUP_WORKOUT" => Some(Self::GroupWorkout),
            "TIME_TRIAL" => Some(Self::TimeTrial),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Race => "Race",
            Self::GroupRide => "Group Ride",
            Self::GroupWorkout => "Group Workout",
            Self::TimeTrial => "Time Trial",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sport {
    Cycling,
    Running,
}

impl Sport {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "CYCLING" => Some(Self::Cycling),
            "RUNNING" => Some(Self::Running),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    NoDrafting,
    NoPowerups,
    LadiesOnly,
    AllowsLateJoin,
    NoTtBikes,
    ShowRaceResults,
    NoZpower,
}

impl Rule {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "NO_DRAFTING" => Some(Self::NoDrafting),
            "NO_POWERUPS" => Some(Self::NoPowerups),
            "LADIES_ONLY" => Some(Self::LadiesOnly),
            "ALLOWS_LATE_JOIN" => Some(Self::AllowsLateJoin),
            "NO_TT_BIKES" => Some(Self::NoTtBikes),
            "SHOW_RACE_RESULTS" => Some(Self::ShowRaceResults),
            "ENFORCE_NO_ZPOWER" => Some(Self::NoZpower),
            _ => None,
        }
    }

    /// Footer label; rules without one are not shown.
    pub fn label(self) -> Option<&'static str> {
        match self {
            Self::NoDrafting => Some("no draft"),
            Self::AllowsLateJoin => Some("late join"),
            Self::NoZpower => Some("no zpower riders"),
            Self::NoPowerups => Some("no powerups"),
            Self::LadiesOnly => Some("ladies only"),
            Self::NoTtBikes => Some("no tt bikes"),
            Self::ShowRaceResults => None,
        }
    }
}

/// How long an event is; at most one of these is set on a payload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CourseLength {
    Distance { meters: f64 },
    Duration { seconds: u64 },
    Laps(u64),
    Unspecified,
}

/// Who may join a subgroup.
#[derive(Debug, Clone, PartialEq)]
pub enum Access {
    Label(String),
    Pace { from: f64, to: f64 },
}

enum FieldValue<'a> {
    Raw(&'a Value),
    Timestamp(OffsetDateTime),
    Subgroups(Vec<EventSubgroup>),
}

/// `event_subgroup_start` -> `eventSubgroupStart`
fn external_key(name: &str) -> String {
    let mut key = String::with_capacity(name.len());
    for (idx, word) in name.split('_').filter(|word| !word.is_empty()).enumerate() {
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            if idx == 0 {
                key.extend(first.to_lowercase());
            } else {
                key.extend(first.to_uppercase());
            }
            key.extend(chars.flat_map(char::to_lowercase));
        }
    }
    key
}

pub(crate) fn parse_timestamp(value: &str) -> Option<OffsetDateTime> {
    OffsetDateTime::parse(value, &Rfc3339).ok().or_else(|| {
        let format = format_description!(
            "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond][offset_hour sign:mandatory][offset_minute]"
        );
        OffsetDateTime::parse(value, format).ok()
    })
}

#[derive(Debug, Clone)]
struct Record {
    data: RawRecord,
    fields: &'static [FieldDescriptor],
}

impl Record {
    fn field(&self, name: &str) -> Result<FieldValue<'_>, ModelError> {
        let key = external_key(name);
        let value = self.data.get(&key).ok_or_else(|| ModelError::MissingField {
            name: name.to_string(),
            key: key.clone(),
        })?;
        let format = self
            .fields
            .iter()
            .find(|field| field.name == name)
            .map(|field| field.format);

        match format {
            None => Ok(FieldValue::Raw(value)),
            Some(Format::Timestamp) => {
                let text = value.as_str().ok_or_else(|| unexpected(name, "timestamp string"))?;
                parse_timestamp(text)
                    .map(FieldValue::Timestamp)
                    .ok_or_else(|| ModelError::Timestamp {
                        name: name.to_string(),
                        value: text.to_string(),
                    })
            }
            Some(Format::Subgroups) => subgroups_from(name, value).map(FieldValue::Subgroups),
        }
    }

    fn raw(&self, name: &str) -> Result<&Value, ModelError> {
        match self.field(name)? {
            FieldValue::Raw(value) => Ok(value),
            _ => Err(unexpected(name, "plain value")),
        }
    }

    fn str(&self, name: &str) -> Result<&str, ModelError> {
        self.raw(name)?
            .as_str()
            .ok_or_else(|| unexpected(name, "string"))
    }

    fn opt_str(&self, name: &str) -> Result<Option<&str>, ModelError> {
        match self.raw(name)? {
            Value::Null => Ok(None),
            Value::String(value) => Ok(Some(value)),
            _ => Err(unexpected(name, "string or null")),
        }
    }

    fn u64(&self, name: &str) -> Result<u64, ModelError> {
        self.raw(name)?
            .as_u64()
            .ok_or_else(|| unexpected(name, "unsigned integer"))
    }

    fn f64(&self, name: &str) -> Result<f64, ModelError> {
        self.raw(name)?
            .as_f64()
            .ok_or_else(|| unexpected(name, "number"))
    }

    fn opt_f64(&self, name: &str) -> Result<Option<f64>, ModelError> {
        match self.raw(name)? {
            Value::Null => Ok(None),
            value => value
                .as_f64()
                .map(Some)
                .ok_or_else(|| unexpected(name, "number or null")),
        }
    }

    fn opt_i64(&self, name: &str) -> Result<Option<i64>, ModelError> {
        match self.raw(name)? {
            Value::Null => Ok(None),
            value => value
                .as_i64()
                .map(Some)
                .ok_or_else(|| unexpected(name, "integer or null")),
        }
    }

    fn bool(&self, name: &str) -> Result<bool, ModelError> {
        self.raw(name)?
            .as_bool()
            .ok_or_else(|| unexpected(name, "boolean"))
    }

    fn str_list(&self, name: &str) -> Result<Vec<&str>, ModelError> {
        match self.raw(name)? {
            Value::Null => Ok(Vec::new()),
            Value::Array(values) => values
                .iter()
                .map(|value| value.as_str().ok_or_else(|| unexpected(name, "list of strings")))
                .collect(),
            _ => Err(unexpected(name, "list of strings")),
        }
    }

    fn timestamp(&self, name: &str) -> Result<OffsetDateTime, ModelError> {
        match self.field(name)? {
            FieldValue::Timestamp(value) => Ok(value),
            _ => Err(unexpected(name, "timestamp")),
        }
    }

    fn rules(&self) -> Result<Vec<Rule>, ModelError> {
        Ok(self
            .str_list("rules_set")?
            .into_iter()
            .filter_map(Rule::parse)
            .collect())
    }

    fn route<'t>(&self, reference: &'t ReferenceTable) -> Result<RouteInfo<'t>, ModelError> {
        let route_id = self.u64("route_id")?;
        Ok(match reference.route(route_id) {
            Some(route) => route,
            None => {
                warn!(route_id, "unknown route id");
                RouteInfo::unknown()
            }
        })
    }
}

fn unexpected(name: &str, expected: &'static str) -> ModelError {
    ModelError::UnexpectedType {
        name: name.to_string(),
        expected,
    }
}

fn subgroups_from(name: &str, value: &Value) -> Result<Vec<EventSubgroup>, ModelError> {
    let items = value
        .as_array()
        .ok_or_else(|| unexpected(name, "list of subgroups"))?;
    let mut seen = HashSet::new();
    let mut subgroups = Vec::with_capacity(items.len());
    for item in items {
        let data = item
            .as_object()
            .ok_or_else(|| unexpected(name, "list of subgroups"))?;
        let subgroup = EventSubgroup::from_raw(data.clone());
        let id = subgroup.id()?;
        if !seen.insert(id) {
            return Err(ModelError::DuplicateSubgroup(id));
        }
        subgroups.push(subgroup);
    }
    Ok(subgroups)
}

/// Wraps a fetched event payload.
pub fn normalize(raw: RawRecord) -> Event {
    Event::from_raw(raw)
}

#[derive(Debug, Clone)]
pub struct Event {
    record: Record,
}

impl Event {
    pub fn from_raw(data: RawRecord) -> Self {
        Self {
            record: Record {
                data,
                fields: EVENT_FIELDS,
            },
        }
    }

    pub fn from_value(value: Value) -> Result<Self, ModelError> {
        match value {
            Value::Object(data) => Ok(Self::from_raw(data)),
            _ => Err(unexpected("event", "object")),
        }
    }

    pub fn id(&self) -> Result<u64, ModelError> {
        self.record.u64("id")
    }

    pub fn name(&self) -> Result<&str, ModelError> {
        self.record.str("name")
    }

    pub fn event_start(&self) -> Result<OffsetDateTime, ModelError> {
        self.record.timestamp("event_start")
    }

    pub fn event_type(&self) -> Result<EventType, ModelError> {
        let value = self.record.str("event_type")?;
        EventType::parse(value).ok_or_else(|| ModelError::UnknownVariant {
            name: "event_type".to_string(),
            value: value.to_string(),
        })
    }

    pub fn sport(&self) -> Result<Sport, ModelError> {
        let value = self.record.str("sport")?;
        Sport::parse(value).ok_or_else(|| ModelError::UnknownVariant {
            name: "sport".to_string(),
            value: value.to_string(),
        })
    }

    pub fn rules(&self) -> Result<Vec<Rule>, ModelError> {
        self.record.rules()
    }

    pub fn tags(&self) -> Result<Vec<&str>, ModelError> {
        self.record.str_list("tags")
    }

    pub fn category_enforcement(&self) -> Result<bool, ModelError> {
        self.record.bool("category_enforcement")
    }

    pub fn bike_hash(&self) -> Result<Option<i64>, ModelError> {
        self.record.opt_i64("bike_hash")
    }

    pub fn jersey_hash(&self) -> Result<Option<i64>, ModelError> {
        self.record.opt_i64("jersey_hash")
    }

    pub fn distance_in_meters(&self) -> Result<Option<f64>, ModelError> {
        self.record.opt_f64("distance_in_meters")
    }

    pub fn duration_in_seconds(&self) -> Result<Option<f64>, ModelError> {
        self.record.opt_f64("duration_in_seconds")
    }

    pub fn laps(&self) -> Result<Option<f64>, ModelError> {
        self.record.opt_f64("laps")
    }

    /// Zero counts as unset; distance wins over duration, duration over laps.
    pub fn course_length(&self) -> Result<CourseLength, ModelError> {
        if let Some(meters) = self.distance_in_meters()?.filter(|value| *value > 0.0) {
            return Ok(CourseLength::Distance { meters });
        }
        if let Some(seconds) = self.duration_in_seconds()?.filter(|value| *value > 0.0) {
            return Ok(CourseLength::Duration {
                seconds: seconds as u64,
            });
        }
        if let Some(laps) = self.laps()?.filter(|value| *value > 0.0) {
            return Ok(CourseLength::Laps(laps as u64));
        }
        Ok(CourseLength::Unspecified)
    }

    pub fn subgroups(&self) -> Result<Vec<EventSubgroup>, ModelError> {
        match self.record.field("event_subgroups")? {
            FieldValue::Subgroups(subgroups) => Ok(subgroups),
            _ => Err(unexpected("event_subgroups", "list of subgroups")),
        }
    }

    pub fn route_id(&self) -> Result<u64, ModelError> {
        self.record.u64("route_id")
    }

    pub fn route<'t>(&self, reference: &'t ReferenceTable) -> Result<RouteInfo<'t>, ModelError> {
        self.record.route(reference)
    }

    pub fn map<'t>(&self, reference: &'t ReferenceTable) -> Result<&'t str, ModelError> {
        Ok(self.record.route(reference)?.world)
    }

    pub fn powerups(&self) -> Result<Option<Vec<(String, u32)>>, ModelError> {
        Ok(tags::powerups(self.tags()?))
    }

    pub fn trainer_difficulty_min(&self) -> Result<Option<f64>, ModelError> {
        Ok(tags::trainer_difficulty_min(self.tags()?))
    }

    pub fn url(&self) -> Result<String, ModelError> {
        Ok(super::event_url(self.id()?))
    }
}

#[derive(Debug, Clone)]
pub struct EventSubgroup {
    record: Record,
}

impl EventSubgroup {
    pub fn from_raw(data: RawRecord) -> Self {
        Self {
            record: Record {
                data,
                fields: SUBGROUP_FIELDS,
            },
        }
    }

    pub fn id(&self) -> Result<u64, ModelError> {
        self.record.u64("id")
    }

    pub fn subgroup_label(&self) -> Result<&str, ModelError> {
        self.record.str("subgroup_label")
    }

    pub fn range_access_label(&self) -> Result<Option<&str>, ModelError> {
        self.record.opt_str("range_access_label")
    }

    pub fn from_pace_value(&self) -> Result<f64, ModelError> {
        self.record.f64("from_pace_value")
    }

    pub fn to_pace_value(&self) -> Result<f64, ModelError> {
        self.record.f64("to_pace_value")
    }

    /// Access label when one is set, pace bounds otherwise.
    pub fn access(&self) -> Result<Access, ModelError> {
        match self.range_access_label()? {
            Some(label) if !label.is_empty() => Ok(Access::Label(label.to_string())),
            _ => Ok(Access::Pace {
                from: self.from_pace_value()?,
                to: self.to_pace_value()?,
            }),
        }
    }

    pub fn event_subgroup_start(&self) -> Result<OffsetDateTime, ModelError> {
        self.record.timestamp("event_subgroup_start")
    }

    pub fn rules(&self) -> Result<Vec<Rule>, ModelError> {
        self.record.rules()
    }

    pub fn tags(&self) -> Result<Vec<&str>, ModelError> {
        self.record.str_list("tags")
    }

    pub fn route_id(&self) -> Result<u64, ModelError> {
        self.record.u64("route_id")
    }

    pub fn route<'t>(&self, reference: &'t ReferenceTable) -> Result<RouteInfo<'t>, ModelError> {
        self.record.route(reference)
    }

    pub fn map<'t>(&self, reference: &'t ReferenceTable) -> Result<&'t str, ModelError> {
        Ok(self.record.route(reference)?.world)
    }

    pub fn powerups(&self) -> Result<Option<Vec<(String, u32)>>, ModelError> {
        Ok(tags::powerups(self.tags()?))
    }

    pub fn trainer_difficulty_min(&self) -> Result<Option<f64>, ModelError> {
        Ok(tags::trainer_difficulty_min(self.tags()?))
    }
}
