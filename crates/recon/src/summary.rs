use crate::model::{ClassifiedWeather, ReconSummary, StopSource, Timeline};

/// Counts gathered along the pipeline, reported next to the segments.
pub struct StageCounts {
    pub corrections_dropped: usize,
    pub promoted: usize,
    pub accepted: usize,
}

pub fn compute_summary(
    timeline: &Timeline,
    weather: &ClassifiedWeather,
    stages: &StageCounts,
) -> ReconSummary {
    let fallback_stops = timeline
        .recovered_stops
        .iter()
        .filter(|r| r.source == StopSource::Fallback)
        .count();

    ReconSummary {
        declared_parts: timeline.declared_parts,
        parts: timeline.parts.len(),
        discarded_parts: timeline.discarded_parts,
        recovered_stops: timeline.recovered_stops.len(),
        fallback_stops,
        local: weather.local.len(),
        remote: weather.remote.len(),
        preliminary: weather.preliminary.len(),
        postrun: weather.postrun.len(),
        unrecognized: weather.unrecognized,
        corrections_dropped: stages.corrections_dropped,
        promoted: stages.promoted,
        accepted: stages.accepted,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::model::{PartWindow, StopRecovery};
    use crate::sky::SkyCondition;

    #[test]
    fn summary_counts() {
        let timeline = Timeline {
            declared_parts: 3,
            parts: vec![
                PartWindow { part: 1, start: 0, stop: 100 },
                PartWindow { part: 2, start: 200, stop: 300 },
            ],
            run_end: 300,
            weather: BTreeMap::new(),
            recovered_stops: vec![
                StopRecovery {
                    clock_index: 1,
                    start: 0,
                    stop: 100,
                    source: StopSource::EmergencyStop,
                },
                StopRecovery {
                    clock_index: 2,
                    start: 200,
                    stop: 300,
                    source: StopSource::Fallback,
                },
            ],
            discarded_parts: 1,
        };
        let mut weather = ClassifiedWeather::default();
        weather.local.insert(50, SkyCondition::clear());
        weather.remote.insert(60, SkyCondition::clear());
        weather.remote.insert(70, SkyCondition::clear());
        weather.unrecognized = 2;

        let summary = compute_summary(
            &timeline,
            &weather,
            &StageCounts { corrections_dropped: 1, promoted: 1, accepted: 2 },
        );
        assert_eq!(summary.declared_parts, 3);
        assert_eq!(summary.parts, 2);
        assert_eq!(summary.discarded_parts, 1);
        assert_eq!(summary.recovered_stops, 2);
        assert_eq!(summary.fallback_stops, 1);
        assert_eq!(summary.local, 1);
        assert_eq!(summary.remote, 2);
        assert_eq!(summary.unrecognized, 2);
        assert_eq!(summary.accepted, 2);
    }
}
