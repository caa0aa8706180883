//! Recover data part boundaries from a run log's event stream.
//!
//! Parts whose clock never recorded a stop get one from, in order: the
//! run's auto-stop (last part only), the nearest emergency stop, the nearest
//! other alarm, an unused auto-stop, and finally `start + fallback_stop_secs`.
//! Each alarm is used for at most one part, and the auto-stop is never given
//! to an earlier part while the last part still needs it.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveTime, Timelike};

use crate::config::TimelineConfig;
use crate::error::ReconError;
use crate::model::{AlarmKind, LogEvent, PartWindow, StopRecovery, StopSource, Timeline};

pub fn seconds(t: NaiveTime) -> i64 {
    i64::from(t.num_seconds_from_midnight())
}

/// Alarm times that can still be claimed as a part stop.
#[derive(Debug, Default)]
struct AlarmPool {
    emergency: Vec<NaiveTime>,
    other: Vec<NaiveTime>,
    auto_stop: Option<NaiveTime>,
    /// The last clock entry lacks a stop, so the auto-stop is held for it.
    auto_stop_reserved: bool,
}

impl AlarmPool {
    fn resolve(
        &mut self,
        start: NaiveTime,
        is_last: bool,
        fallback_secs: i64,
    ) -> (NaiveTime, StopSource) {
        if is_last {
            if let Some(t) = self.auto_stop.take() {
                return (t, StopSource::AutoStop);
            }
        }
        if let Some(t) = take_nearest(&mut self.emergency, start) {
            return (t, StopSource::EmergencyStop);
        }
        if let Some(t) = take_nearest(&mut self.other, start) {
            return (t, StopSource::OtherAlarm);
        }
        if !self.auto_stop_reserved {
            if let Some(t) = self.auto_stop.take() {
                return (t, StopSource::AutoStop);
            }
        }
        (start + Duration::seconds(fallback_secs), StopSource::Fallback)
    }
}

/// Remove and return the time closest to `target`. Ties go to the earlier entry.
fn take_nearest(times: &mut Vec<NaiveTime>, target: NaiveTime) -> Option<NaiveTime> {
    let idx = times
        .iter()
        .enumerate()
        .min_by_key(|(_, t)| (**t - target).num_seconds().abs())
        .map(|(i, _)| i)?;
    Some(times.remove(idx))
}

pub fn recover_timeline(
    events: &[LogEvent],
    config: &TimelineConfig,
) -> Result<Timeline, ReconError> {
    let mut declared_parts: i64 = 0;
    let mut clocks: Vec<(NaiveTime, Option<NaiveTime>)> = Vec::new();
    let mut pool = AlarmPool::default();
    let mut weather = BTreeMap::new();

    for event in events {
        match event {
            LogEvent::PartsDeclared { parts } => declared_parts = i64::from(*parts),
            LogEvent::PartClock { start, stop } => clocks.push((*start, *stop)),
            LogEvent::EmptyPart => declared_parts -= 1,
            LogEvent::Alarm { kind: AlarmKind::EmergencyStop, time } => pool.emergency.push(*time),
            LogEvent::Alarm { kind: AlarmKind::SkyException, time } => pool.other.push(*time),
            LogEvent::Alarm { kind: AlarmKind::Other, .. } => {}
            LogEvent::AutoRestartStop { time } => pool.other.push(*time),
            LogEvent::AutoStop { time } => pool.auto_stop = Some(*time),
            LogEvent::Weather { time, raw } => {
                weather.insert(seconds(*time), raw.clone());
            }
        }
    }

    pool.auto_stop_reserved = matches!(clocks.last(), Some((_, None)));

    if declared_parts <= 0 {
        return Err(ReconError::NoDataParts);
    }

    // Resolve missing stops in clock order; keep each stop paired with its start.
    let last = clocks.len().saturating_sub(1);
    let mut recovered_stops = Vec::new();
    let mut pairs: Vec<(i64, i64)> = Vec::with_capacity(clocks.len());
    for (i, (start, stop)) in clocks.iter().enumerate() {
        let stop = match stop {
            Some(t) => *t,
            None => {
                let (t, source) = pool.resolve(*start, i == last, config.fallback_stop_secs);
                if source == StopSource::Fallback {
                    log::warn!(
                        "no stop time for clock entry {} (start {start}); using start + {}s",
                        i + 1,
                        config.fallback_stop_secs
                    );
                } else {
                    log::debug!("clock entry {} stop recovered from {source:?} at {t}", i + 1);
                }
                recovered_stops.push(StopRecovery {
                    clock_index: i + 1,
                    start: seconds(*start),
                    stop: seconds(t),
                    source,
                });
                t
            }
        };
        pairs.push((seconds(*start), seconds(stop)));
    }

    let first_start = pairs.iter().map(|p| p.0).min();
    let run_end = pairs.iter().map(|p| p.1).max();
    let (Some(first_start), Some(run_end)) = (first_start, run_end) else {
        return Err(ReconError::NoDataParts);
    };

    let before = pairs.len();
    pairs.retain(|&(start, stop)| {
        let keep = first_start < stop && stop <= run_end;
        if !keep {
            log::warn!("discarding part starting at {start}s: stop {stop}s lies outside the run");
        }
        keep
    });
    let discarded_parts = before - pairs.len();
    if pairs.is_empty() {
        return Err(ReconError::NoDataParts);
    }

    pairs.sort_by_key(|&(start, _)| start);
    let parts: Vec<PartWindow> = pairs
        .into_iter()
        .enumerate()
        .map(|(i, (start, stop))| PartWindow { part: i + 1, start, stop })
        .collect();

    if declared_parts != parts.len() as i64 {
        log::warn!(
            "log declares {declared_parts} data part(s) but {} were recovered",
            parts.len()
        );
    }

    Ok(Timeline {
        declared_parts,
        parts,
        run_end,
        weather,
        recovered_stops,
        discarded_parts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> NaiveTime {
        NaiveTime::parse_from_str(s, "%H:%M:%S").unwrap()
    }

    fn clock(start: &str, stop: Option<&str>) -> LogEvent {
        LogEvent::PartClock { start: t(start), stop: stop.map(t) }
    }

    fn recover(events: &[LogEvent]) -> Result<Timeline, ReconError> {
        recover_timeline(events, &TimelineConfig::default())
    }

    #[test]
    fn complete_clocks() {
        let events = vec![
            LogEvent::PartsDeclared { parts: 2 },
            clock("03:00:00", Some("03:20:00")),
            clock("03:25:00", Some("03:45:00")),
        ];
        let tl = recover(&events).unwrap();
        assert_eq!(tl.declared_parts, 2);
        assert_eq!(tl.starts(), vec![10_800, 12_300]);
        assert_eq!(tl.stops(), vec![12_000, 13_500]);
        assert_eq!(tl.run_end, 13_500);
        assert_eq!(tl.run_start(), 10_800);
        assert!(tl.recovered_stops.is_empty());
    }

    #[test]
    fn no_declared_parts_is_fatal() {
        let events = vec![clock("03:00:00", Some("03:20:00"))];
        assert!(matches!(recover(&events), Err(ReconError::NoDataParts)));

        let events = vec![LogEvent::PartsDeclared { parts: 1 }, LogEvent::EmptyPart];
        assert!(matches!(recover(&events), Err(ReconError::NoDataParts)));
    }

    #[test]
    fn declared_but_no_clocks_is_fatal() {
        let events = vec![LogEvent::PartsDeclared { parts: 3 }];
        assert!(matches!(recover(&events), Err(ReconError::NoDataParts)));
    }

    #[test]
    fn empty_sections_reduce_declared_count() {
        let events = vec![
            LogEvent::PartsDeclared { parts: 3 },
            clock("03:00:00", Some("03:20:00")),
            LogEvent::EmptyPart,
            clock("03:30:00", Some("03:50:00")),
        ];
        let tl = recover(&events).unwrap();
        assert_eq!(tl.declared_parts, 2);
        assert_eq!(tl.parts.len(), 2);
    }

    #[test]
    fn missing_stop_falls_back_to_twenty_minutes() {
        let events = vec![
            LogEvent::PartsDeclared { parts: 1 },
            clock("03:00:00", None),
        ];
        let tl = recover(&events).unwrap();
        assert_eq!(tl.parts[0].stop, 10_800 + 1200);
        assert_eq!(tl.recovered_stops.len(), 1);
        assert_eq!(tl.recovered_stops[0].source, StopSource::Fallback);
    }

    #[test]
    fn missing_stop_uses_nearest_emergency_stop() {
        let events = vec![
            LogEvent::PartsDeclared { parts: 2 },
            clock("03:00:00", None),
            LogEvent::Alarm { kind: AlarmKind::EmergencyStop, time: t("05:00:00") },
            LogEvent::Alarm { kind: AlarmKind::EmergencyStop, time: t("03:12:00") },
            clock("03:30:00", Some("03:50:00")),
        ];
        let tl = recover(&events).unwrap();
        assert_eq!(tl.parts[0].stop, seconds(t("03:12:00")));
        assert_eq!(tl.recovered_stops[0].source, StopSource::EmergencyStop);
    }

    #[test]
    fn alarms_are_consumed_once() {
        let events = vec![
            LogEvent::PartsDeclared { parts: 3 },
            clock("03:00:00", None),
            LogEvent::Alarm { kind: AlarmKind::EmergencyStop, time: t("03:10:00") },
            clock("03:20:00", None),
            LogEvent::AutoRestartStop { time: t("03:35:00") },
            clock("04:00:00", Some("04:20:00")),
        ];
        let tl = recover(&events).unwrap();
        assert_eq!(tl.parts[0].stop, seconds(t("03:10:00")));
        assert_eq!(tl.parts[1].stop, seconds(t("03:35:00")));
        assert_eq!(tl.recovered_stops[1].source, StopSource::OtherAlarm);
    }

    #[test]
    fn sky_exception_counts_as_other_alarm() {
        let events = vec![
            LogEvent::PartsDeclared { parts: 2 },
            clock("03:00:00", None),
            LogEvent::Alarm { kind: AlarmKind::SkyException, time: t("03:14:00") },
            LogEvent::Alarm { kind: AlarmKind::Other, time: t("03:01:00") },
            clock("03:30:00", Some("03:50:00")),
        ];
        let tl = recover(&events).unwrap();
        assert_eq!(tl.parts[0].stop, seconds(t("03:14:00")));
    }

    #[test]
    fn last_part_prefers_auto_stop() {
        let events = vec![
            LogEvent::PartsDeclared { parts: 2 },
            clock("03:00:00", Some("03:20:00")),
            clock("03:30:00", None),
            LogEvent::Alarm { kind: AlarmKind::EmergencyStop, time: t("03:40:00") },
            LogEvent::AutoStop { time: t("03:45:00") },
        ];
        let tl = recover(&events).unwrap();
        assert_eq!(tl.parts[1].stop, seconds(t("03:45:00")));
        assert_eq!(tl.recovered_stops[0].source, StopSource::AutoStop);
        assert_eq!(tl.run_end, seconds(t("03:45:00")));
    }

    #[test]
    fn auto_stop_is_held_for_the_last_part() {
        let events = vec![
            LogEvent::PartsDeclared { parts: 2 },
            clock("03:00:00", None),
            clock("03:30:00", None),
            LogEvent::AutoStop { time: t("03:45:00") },
        ];
        let tl = recover(&events).unwrap();
        assert_eq!(tl.parts[0].stop, 10_800 + 1200);
        assert_eq!(tl.parts[1].stop, seconds(t("03:45:00")));
        assert!(tl.parts[0].stop <= tl.parts[1].start);
        assert_eq!(tl.run_end, 13_500);
        let sources: Vec<_> = tl.recovered_stops.iter().map(|r| r.source).collect();
        assert_eq!(sources, vec![StopSource::Fallback, StopSource::AutoStop]);
    }

    #[test]
    fn auto_restart_stop_is_not_the_run_auto_stop() {
        let events = vec![
            LogEvent::PartsDeclared { parts: 2 },
            clock("03:00:00", Some("03:20:00")),
            clock("03:30:00", None),
            LogEvent::AutoRestartStop { time: t("03:40:00") },
        ];
        let tl = recover(&events).unwrap();
        assert_eq!(tl.parts[1].stop, seconds(t("03:40:00")));
        assert_eq!(tl.recovered_stops[0].source, StopSource::OtherAlarm);
    }

    #[test]
    fn unused_auto_stop_goes_to_an_earlier_part() {
        let events = vec![
            LogEvent::PartsDeclared { parts: 2 },
            clock("03:00:00", None),
            clock("03:30:00", Some("03:50:00")),
            LogEvent::AutoStop { time: t("03:20:00") },
        ];
        let tl = recover(&events).unwrap();
        assert_eq!(tl.parts[0].stop, seconds(t("03:20:00")));
        assert_eq!(tl.recovered_stops[0].source, StopSource::AutoStop);
    }

    #[test]
    fn stop_before_run_start_is_discarded() {
        let events = vec![
            LogEvent::PartsDeclared { parts: 2 },
            clock("03:00:00", Some("03:20:00")),
            clock("03:30:00", None),
            LogEvent::Alarm { kind: AlarmKind::EmergencyStop, time: t("02:00:00") },
        ];
        let tl = recover(&events).unwrap();
        assert_eq!(tl.parts.len(), 1);
        assert_eq!(tl.discarded_parts, 1);
        assert_eq!(tl.run_end, seconds(t("03:20:00")));
    }

    #[test]
    fn parts_are_numbered_by_start_order() {
        let events = vec![
            LogEvent::PartsDeclared { parts: 2 },
            clock("04:00:00", Some("04:20:00")),
            clock("03:00:00", Some("03:20:00")),
        ];
        let tl = recover(&events).unwrap();
        assert_eq!(tl.parts[0], PartWindow { part: 1, start: 10_800, stop: 12_000 });
        assert_eq!(tl.parts[1].part, 2);
        assert_eq!(tl.parts[1].start, 14_400);
    }

    #[test]
    fn weather_is_keyed_by_seconds() {
        let events = vec![
            LogEvent::PartsDeclared { parts: 1 },
            LogEvent::Weather { time: t("02:59:00"), raw: "0000000".into() },
            clock("03:00:00", Some("03:20:00")),
            LogEvent::Weather { time: t("03:10:00"), raw: "[BR] 1000000".into() },
        ];
        let tl = recover(&events).unwrap();
        assert_eq!(tl.weather.len(), 2);
        assert_eq!(tl.weather[&10_740], "0000000");
        assert_eq!(tl.weather[&11_400], "[BR] 1000000");
    }
}
