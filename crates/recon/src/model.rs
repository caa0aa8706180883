use std::collections::BTreeMap;

use chrono::NaiveTime;
use serde::Serialize;

use crate::sky::{CompareMode, SkyCondition};

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlarmKind {
    EmergencyStop,
    SkyException,
    Other,
}

/// One typed entry from a run log, in log order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogEvent {
    /// Explicit data part count; overwrites any earlier count.
    PartsDeclared { parts: u32 },
    /// A data part with its clock; `stop` is missing when the part was cut short.
    PartClock { start: NaiveTime, stop: Option<NaiveTime> },
    /// A data section that never started its clock.
    EmptyPart,
    Alarm { kind: AlarmKind, time: NaiveTime },
    /// Auto-stop recorded inside an auto-restart block. Recovery treats it as
    /// an ordinary alarm only; it never doubles as the run's `AutoStop`.
    AutoRestartStop { time: NaiveTime },
    AutoStop { time: NaiveTime },
    Weather { time: NaiveTime, raw: String },
}

// ---------------------------------------------------------------------------
// Timeline
// ---------------------------------------------------------------------------

/// Start/stop of one data part, in seconds since midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PartWindow {
    pub part: usize,
    pub start: i64,
    pub stop: i64,
}

impl PartWindow {
    pub fn mid(&self) -> f64 {
        (self.start + self.stop) as f64 / 2.0
    }

    pub fn duration(&self) -> i64 {
        self.stop - self.start
    }

    /// True when `t` falls in `(start, stop]`.
    pub fn contains(&self, t: i64) -> bool {
        self.start < t && t <= self.stop
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopSource {
    AutoStop,
    EmergencyStop,
    OtherAlarm,
    Fallback,
}

/// A part stop that was missing from the log and had to be inferred.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StopRecovery {
    /// Position of the clock entry in the log, 1-based.
    pub clock_index: usize,
    pub start: i64,
    pub stop: i64,
    pub source: StopSource,
}

#[derive(Debug, Clone)]
pub struct Timeline {
    /// Part count as declared by the log, after empty sections were subtracted.
    pub declared_parts: i64,
    /// Recovered parts ordered by start, numbered from 1.
    pub parts: Vec<PartWindow>,
    pub run_end: i64,
    /// Raw weather strings keyed by seconds since midnight (not yet wrap-shifted).
    pub weather: BTreeMap<i64, String>,
    pub recovered_stops: Vec<StopRecovery>,
    /// Parts discarded because their stop fell outside the run.
    pub discarded_parts: usize,
}

impl Timeline {
    pub fn run_start(&self) -> i64 {
        self.parts.iter().map(|p| p.start).min().unwrap_or(0)
    }

    pub fn starts(&self) -> Vec<i64> {
        let mut v: Vec<i64> = self.parts.iter().map(|p| p.start).collect();
        v.sort_unstable();
        v
    }

    pub fn stops(&self) -> Vec<i64> {
        let mut v: Vec<i64> = self.parts.iter().map(|p| p.stop).collect();
        v.sort_unstable();
        v
    }
}

// ---------------------------------------------------------------------------
// Weather
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherCategory {
    Preliminary,
    PostRun,
    Remote,
    Local,
}

/// Where an accepted observation came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    Local,
    Remote,
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Remote => write!(f, "remote"),
        }
    }
}

/// Weather entries partitioned by category; every raw entry lands in at most one map.
#[derive(Debug, Clone, Default)]
pub struct ClassifiedWeather {
    pub local: BTreeMap<i64, SkyCondition>,
    pub remote: BTreeMap<i64, SkyCondition>,
    pub preliminary: BTreeMap<i64, SkyCondition>,
    pub postrun: BTreeMap<i64, SkyCondition>,
    /// Entries without a usable 7-digit code.
    pub unrecognized: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Observation {
    pub time: i64,
    pub code: SkyCondition,
    pub origin: Origin,
}

// ---------------------------------------------------------------------------
// Segments
// ---------------------------------------------------------------------------

/// A data part with its reconciled sky condition. Part 0 is the synthetic
/// "before the run" segment and has all offsets zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSegment {
    pub part: usize,
    pub start: i64,
    pub stop: i64,
    pub mid: f64,
    /// Safety bound: start plus the maximum part duration.
    pub max: i64,
    pub code: SkyCondition,
    /// Time of an observation made during this part, if any.
    pub weather_time: Option<i64>,
    pub source: Option<Origin>,
}

/// One line of per-part output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartRecord {
    pub part: usize,
    pub start: i64,
    pub previous: SkyCondition,
    pub current: SkyCondition,
    pub next: SkyCondition,
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize)]
pub struct ReconSummary {
    pub declared_parts: i64,
    pub parts: usize,
    pub discarded_parts: usize,
    pub recovered_stops: usize,
    pub fallback_stops: usize,
    pub local: usize,
    pub remote: usize,
    pub preliminary: usize,
    pub postrun: usize,
    pub unrecognized: usize,
    pub corrections_dropped: usize,
    pub promoted: usize,
    pub accepted: usize,
}

/// Raw offsets for timeline plots.
#[derive(Debug, Clone, Serialize)]
pub struct TimelineView {
    pub starts: Vec<i64>,
    pub stops: Vec<i64>,
    pub midpoints: Vec<f64>,
    pub run_end: i64,
    pub local: Vec<i64>,
    pub remote: Vec<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconMeta {
    pub detector: String,
    pub mode: CompareMode,
    pub merged_remote: bool,
    pub engine_version: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconResult {
    pub meta: ReconMeta,
    pub summary: ReconSummary,
    pub timeline: TimelineView,
    pub recovered_stops: Vec<StopRecovery>,
    /// Segment 0 first, then parts 1..n.
    pub segments: Vec<RunSegment>,
}

impl ReconResult {
    /// Output records for parts 1..n. The last part repeats its own code as "next".
    pub fn part_records(&self) -> Vec<PartRecord> {
        self.segments
            .iter()
            .enumerate()
            .skip(1)
            .map(|(i, seg)| PartRecord {
                part: seg.part,
                start: seg.start,
                previous: self.segments[i - 1].code,
                current: seg.code,
                next: self.segments.get(i + 1).map(|s| s.code).unwrap_or(seg.code),
            })
            .collect()
    }
}
