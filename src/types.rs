use crate::error::MalformedRecord;
use chrono::{DateTime, Datelike, Local, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Latitude/longitude pair, stored as `[lat, lng]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Coords {
    pub lat: f64,
    pub lng: f64,
}

impl Coords {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl From<[f64; 2]> for Coords {
    fn from([lat, lng]: [f64; 2]) -> Self {
        Self { lat, lng }
    }
}

impl From<Coords> for [f64; 2] {
    fn from(c: Coords) -> Self {
        [c.lat, c.lng]
    }
}

/// Parses one latitude or longitude in degrees. Non-finite values are
/// rejected: they cannot be stored as JSON numbers.
pub fn parse_degrees(raw: &str) -> Result<f64, String> {
    let v: f64 = raw
        .trim()
        .parse()
        .map_err(|e| format!("not a number: {raw:?} ({e})"))?;
    if v.is_finite() {
        Ok(v)
    } else {
        Err(format!("not a finite coordinate: {raw:?}"))
    }
}

impl fmt::Display for Coords {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lat, self.lng)
    }
}

/// Time-derived identifier: the last ten digits of the creation time in
/// milliseconds. Two workouts created in the same millisecond collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkoutId(String);

impl WorkoutId {
    pub fn from_time(t: DateTime<Utc>) -> Self {
        let ms = t.timestamp_millis().to_string();
        let start = ms.len().saturating_sub(10);
        Self(ms[start..].to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for WorkoutId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for WorkoutId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum WorkoutKind {
    #[default]
    Running,
    Cycling,
}

impl WorkoutKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Cycling => "cycling",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Running => "Running",
            Self::Cycling => "Cycling",
        }
    }

    pub const fn icon(self) -> &'static str {
        match self {
            Self::Running => "🏃‍♀️",
            Self::Cycling => "🚴‍♂️",
        }
    }
}

impl fmt::Display for WorkoutKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkoutKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "running" => Ok(Self::Running),
            "cycling" => Ok(Self::Cycling),
            other => Err(format!("unknown workout type: {other:?}")),
        }
    }
}

/// The type-specific input a workout is built from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Effort {
    /// Steps per minute.
    Cadence(f64),
    /// Meters; may be negative.
    ElevationGain(f64),
}

impl Effort {
    pub const fn kind(self) -> WorkoutKind {
        match self {
            Self::Cadence(_) => WorkoutKind::Running,
            Self::ElevationGain(_) => WorkoutKind::Cycling,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WorkoutDetail {
    Running {
        cadence: f64,
        /// min/km
        pace: f64,
    },
    #[serde(rename_all = "camelCase")]
    Cycling {
        elevation_gain: f64,
        /// km/h
        speed: f64,
    },
}

impl WorkoutDetail {
    pub const fn kind(&self) -> WorkoutKind {
        match self {
            Self::Running { .. } => WorkoutKind::Running,
            Self::Cycling { .. } => WorkoutKind::Cycling,
        }
    }
}

pub fn pace(distance: f64, duration: f64) -> f64 {
    duration / distance
}

pub fn speed(distance: f64, duration: f64) -> f64 {
    distance / (duration / 60.0)
}

/// `"<Type> on <Month> <day>"`, using the local calendar date.
pub fn describe(kind: WorkoutKind, date: DateTime<Utc>) -> String {
    let local = date.with_timezone(&Local);
    let month = MONTHS[local.month0() as usize];
    format!("{} on {month} {}", kind.label(), local.day())
}

/// A logged workout. Never mutated after construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Workout {
    id: WorkoutId,
    date: DateTime<Utc>,
    coords: Coords,
    /// km
    distance: f64,
    /// min
    duration: f64,
    description: String,
    #[serde(flatten)]
    detail: WorkoutDetail,
}

impl Workout {
    /// Builds a workout dated `date`. Inputs are trusted; validation happens
    /// in the form before this is called.
    pub fn new(
        date: DateTime<Utc>,
        coords: Coords,
        distance: f64,
        duration: f64,
        effort: Effort,
    ) -> Self {
        let detail = match effort {
            Effort::Cadence(cadence) => WorkoutDetail::Running {
                cadence,
                pace: pace(distance, duration),
            },
            Effort::ElevationGain(elevation_gain) => WorkoutDetail::Cycling {
                elevation_gain,
                speed: speed(distance, duration),
            },
        };

        Self {
            id: WorkoutId::from_time(date),
            date,
            coords,
            distance,
            duration,
            description: describe(effort.kind(), date),
            detail,
        }
    }

    pub fn running(coords: Coords, distance: f64, duration: f64, cadence: f64) -> Self {
        Self::new(Utc::now(), coords, distance, duration, Effort::Cadence(cadence))
    }

    pub fn cycling(coords: Coords, distance: f64, duration: f64, elevation_gain: f64) -> Self {
        Self::new(
            Utc::now(),
            coords,
            distance,
            duration,
            Effort::ElevationGain(elevation_gain),
        )
    }

    pub const fn id(&self) -> &WorkoutId {
        &self.id
    }

    pub const fn date(&self) -> DateTime<Utc> {
        self.date
    }

    pub const fn coords(&self) -> Coords {
        self.coords
    }

    pub const fn distance(&self) -> f64 {
        self.distance
    }

    pub const fn duration(&self) -> f64 {
        self.duration
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub const fn detail(&self) -> &WorkoutDetail {
        &self.detail
    }

    pub const fn kind(&self) -> WorkoutKind {
        self.detail.kind()
    }

    pub const fn pace(&self) -> Option<f64> {
        match self.detail {
            WorkoutDetail::Running { pace, .. } => Some(pace),
            WorkoutDetail::Cycling { .. } => None,
        }
    }

    pub const fn speed(&self) -> Option<f64> {
        match self.detail {
            WorkoutDetail::Cycling { speed, .. } => Some(speed),
            WorkoutDetail::Running { .. } => None,
        }
    }
}

/// Plain persisted shape of a workout. Every variant field is optional so a
/// record written by an older or foreign writer still parses.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutRecord {
    pub id: WorkoutId,
    pub date: DateTime<Utc>,
    pub coords: Coords,
    pub distance: f64,
    pub duration: f64,
    #[serde(rename = "type")]
    pub kind: WorkoutKind,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub cadence: Option<f64>,
    #[serde(default)]
    pub pace: Option<f64>,
    #[serde(default)]
    pub elevation_gain: Option<f64>,
    #[serde(default)]
    pub speed: Option<f64>,
}

impl TryFrom<WorkoutRecord> for Workout {
    type Error = MalformedRecord;

    /// Stored derived values win; `null` ones (non-finite when written) are
    /// derived again.
    fn try_from(r: WorkoutRecord) -> Result<Self, Self::Error> {
        let missing = |field| MalformedRecord {
            id: r.id.to_string(),
            field,
        };

        let detail = match r.kind {
            WorkoutKind::Running => WorkoutDetail::Running {
                cadence: r.cadence.ok_or_else(|| missing("cadence"))?,
                pace: r.pace.unwrap_or_else(|| pace(r.distance, r.duration)),
            },
            WorkoutKind::Cycling => WorkoutDetail::Cycling {
                elevation_gain: r.elevation_gain.ok_or_else(|| missing("elevationGain"))?,
                speed: r.speed.unwrap_or_else(|| speed(r.distance, r.duration)),
            },
        };

        let description = r
            .description
            .unwrap_or_else(|| describe(r.kind, r.date));

        Ok(Self {
            id: r.id,
            date: r.date,
            coords: r.coords,
            distance: r.distance,
            duration: r.duration,
            description,
            detail,
        })
    }
}
