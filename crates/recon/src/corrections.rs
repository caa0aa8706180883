/// Drop entries made within `window` seconds of the previously kept entry.
///
/// Operators who mistype a code enter a corrected one shortly afterwards; the
/// first entry of each burst is kept. `times` must be sorted ascending.
pub fn filter_corrections(times: &[i64], window: i64) -> Vec<i64> {
    let mut kept: Vec<i64> = Vec::with_capacity(times.len());
    for &t in times {
        match kept.last() {
            Some(&prev) if t - prev < window => {
                log::debug!("dropping entry at {t}s as a correction of {prev}s");
            }
            _ => kept.push(t),
        }
    }
    kept
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    pub local: Vec<i64>,
    pub remote: Vec<i64>,
    /// Remote timestamps moved into `local`, in promotion order.
    pub promoted: Vec<i64>,
}

/// Fill gaps longer than `max_gap` between local timestamps with the remote
/// timestamp nearest the gap's midpoint, repeating until no gap can be split.
///
/// Each promotion removes one remote entry, so this performs at most
/// `remote.len()` promotions.
pub fn merge_remote(local: &[i64], remote: &[i64], max_gap: i64) -> MergeOutcome {
    let mut local = local.to_vec();
    let mut remote = remote.to_vec();
    local.sort_unstable();
    remote.sort_unstable();
    let mut promoted = Vec::new();

    let mut i = 0;
    while i + 1 < local.len() {
        let (start, end) = (local[i], local[i + 1]);
        if end - start > max_gap {
            // |2r - (start + end)| is twice the distance to the midpoint; stays integral.
            let nearest = remote
                .iter()
                .enumerate()
                .filter(|(_, &r)| start < r && r < end)
                .min_by_key(|(_, &r)| (2 * r - start - end).abs())
                .map(|(pos, _)| pos);
            if let Some(pos) = nearest {
                let r = remote.remove(pos);
                log::debug!("promoting remote entry at {r}s into gap {start}s..{end}s");
                local.insert(i + 1, r);
                promoted.push(r);
                // re-examine the left half of the split gap
                continue;
            }
        }
        i += 1;
    }

    MergeOutcome { local, remote, promoted }
}
