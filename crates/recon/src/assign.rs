use crate::error::ReconError;
use crate::model::{Observation, Origin, PartWindow, RunSegment};
use crate::sky::{CompareMode, SkyCondition};

/// Assign a reconciled sky condition to every part.
///
/// `observations` must be sorted by time. The returned vector starts with the
/// synthetic part 0, which takes `preliminary` verbatim or, when there is none,
/// copies part 1.
pub fn assign_segments(
    parts: &[PartWindow],
    observations: &[Observation],
    preliminary: Option<&Observation>,
    mode: CompareMode,
    max_part_secs: i64,
) -> Result<Vec<RunSegment>, ReconError> {
    if observations.is_empty() {
        return Err(ReconError::NoObservations);
    }

    let mut segments = Vec::with_capacity(parts.len() + 1);
    segments.push(match preliminary {
        Some(p) => RunSegment {
            part: 0,
            start: 0,
            stop: 0,
            mid: 0.0,
            max: 0,
            code: p.code,
            weather_time: Some(p.time),
            source: Some(Origin::Local),
        },
        // placeholder; replaced by part 1 below
        None => RunSegment {
            part: 0,
            start: 0,
            stop: 0,
            mid: 0.0,
            max: 0,
            code: SkyCondition::clear(),
            weather_time: None,
            source: None,
        },
    });

    for part in parts {
        segments.push(assign_part(part, observations, mode, max_part_secs)?);
    }

    if preliminary.is_none() {
        if let Some(first) = segments.get(1).cloned() {
            segments[0].code = first.code;
            segments[0].source = first.source;
        }
    }

    Ok(segments)
}

fn assign_part(
    part: &PartWindow,
    observations: &[Observation],
    mode: CompareMode,
    max_part_secs: i64,
) -> Result<RunSegment, ReconError> {
    let mid = part.mid();
    let idx = observations.partition_point(|o| (o.time as f64) < mid);

    let (bi, ai) = if idx == 0 {
        log::warn!(
            "no observation precedes part {} (midpoint {mid}s); using the first observation",
            part.part
        );
        (0, 0)
    } else if idx == observations.len() {
        (idx - 1, idx - 1)
    } else {
        (idx - 1, idx)
    };
    let before = &observations[bi];
    let after = &observations[ai];

    let weight_before = (mid - before.time as f64).abs();
    let weight_after = (mid - after.time as f64).abs();

    let code = if bi == ai {
        before.code
    } else {
        SkyCondition::compare(&before.code, &after.code, weight_before, weight_after, mode)?
    };

    let weather_time = if part.contains(before.time) {
        Some(before.time)
    } else if part.contains(after.time) {
        Some(after.time)
    } else {
        None
    };

    let source = if weight_before <= weight_after { before.origin } else { after.origin };

    Ok(RunSegment {
        part: part.part,
        start: part.start,
        stop: part.stop,
        mid,
        max: part.start + max_part_secs,
        code,
        weather_time,
        source: Some(source),
    })
}
