use std::collections::BTreeMap;

use crate::assign::assign_segments;
use crate::classify::{classify_weather, RunWindow};
use crate::config::ReconConfig;
use crate::corrections::{filter_corrections, merge_remote};
use crate::error::ReconError;
use crate::model::{
    ClassifiedWeather, LogEvent, Observation, Origin, ReconMeta, ReconResult, TimelineView,
};
use crate::sky::SkyCondition;
use crate::summary::{compute_summary, StageCounts};
use crate::timeline::recover_timeline;

/// Reconcile one run log. Pure: the same events and config always give the
/// same result, and nothing is written anywhere.
pub fn run(config: &ReconConfig, events: &[LogEvent]) -> Result<ReconResult, ReconError> {
    let mut timeline = recover_timeline(events, &config.timeline)?;
    let run = RunWindow {
        start: timeline.run_start(),
        end: timeline.run_end,
    };
    log::info!(
        "{} data part(s) between {}s and {}s",
        timeline.parts.len(),
        run.start,
        run.end
    );

    let weather = classify_weather(std::mem::take(&mut timeline.weather), run, &config.weather);
    let accepted = accept_observations(&weather, config);

    let segments = assign_segments(
        &timeline.parts,
        &accepted.observations,
        accepted.preliminary.as_ref(),
        config.assign.mode,
        config.timeline.max_part_secs,
    )?;

    let summary = compute_summary(
        &timeline,
        &weather,
        &StageCounts {
            corrections_dropped: accepted.corrections_dropped,
            promoted: accepted.promoted,
            accepted: accepted.observations.len(),
        },
    );

    let view = TimelineView {
        starts: timeline.starts(),
        stops: timeline.stops(),
        midpoints: timeline.parts.iter().map(|p| p.mid()).collect(),
        run_end: timeline.run_end,
        local: accepted.observations.iter().map(|o| o.time).collect(),
        remote: accepted.remote,
    };

    Ok(ReconResult {
        meta: ReconMeta {
            detector: config.detector.clone(),
            mode: config.assign.mode,
            merged_remote: config.merges_remote(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
        },
        summary,
        timeline: view,
        recovered_stops: timeline.recovered_stops,
        segments,
    })
}

struct Accepted {
    /// Sorted by time; what parts are interpolated from.
    observations: Vec<Observation>,
    preliminary: Option<Observation>,
    /// Remote timestamps left after filtering (and merging).
    remote: Vec<i64>,
    corrections_dropped: usize,
    promoted: usize,
}

/// Build the list of observations parts are assigned from: local codes plus
/// the latest preliminary and earliest post-run code, with corrections
/// removed and, for merge detectors, long gaps filled from remote codes.
fn accept_observations(weather: &ClassifiedWeather, config: &ReconConfig) -> Accepted {
    let mut local: BTreeMap<i64, SkyCondition> = weather.local.clone();

    let preliminary = weather
        .preliminary
        .iter()
        .next_back()
        .map(|(&time, &code)| Observation { time, code, origin: Origin::Local });
    if let Some(p) = preliminary {
        local.insert(p.time, p.code);
    }
    if let Some((&time, &code)) = weather.postrun.iter().next() {
        local.insert(time, code);
    }

    let local_times: Vec<i64> = local.keys().copied().collect();
    let remote_times: Vec<i64> = weather.remote.keys().copied().collect();

    let window = config.corrections.window_secs;
    let mut local_kept = filter_corrections(&local_times, window);
    let mut remote_kept = filter_corrections(&remote_times, window);
    let corrections_dropped =
        (local_times.len() - local_kept.len()) + (remote_times.len() - remote_kept.len());

    let mut promoted = 0;
    if config.merges_remote() {
        let outcome = merge_remote(&local_kept, &remote_kept, config.merge.max_gap_secs);
        promoted = outcome.promoted.len();
        if promoted > 0 {
            log::info!("filled {promoted} gap(s) with remote codes");
        }
        local_kept = outcome.local;
        remote_kept = outcome.remote;
    }

    let observations = local_kept
        .iter()
        .filter_map(|&time| match local.get(&time) {
            Some(&code) => Some(Observation { time, code, origin: Origin::Local }),
            None => weather
                .remote
                .get(&time)
                .map(|&code| Observation { time, code, origin: Origin::Remote }),
        })
        .collect();

    Accepted {
        observations,
        preliminary,
        remote: remote_kept,
        corrections_dropped,
        promoted,
    }
}
