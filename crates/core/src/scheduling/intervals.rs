//! Interval-set arithmetic over UTC instants
//!
//! Free/busy computation works on half-open intervals `[start, end)`.
//! All functions expect and preserve ascending order; `normalize` is the
//! entry point for untrusted input.

use chrono::{DateTime, Duration, Utc};

/// Half-open interval `[start, end)` in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Interval {
    /// Construct an interval; empty or inverted bounds yield `None`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Option<Self> {
        (start < end).then_some(Self { start, end })
    }

    /// Whether `other` is fully contained in `self`.
    pub fn contains(&self, other: &Interval) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

/// Sort and merge overlapping or touching intervals into a canonical union.
pub fn normalize(mut intervals: Vec<Interval>) -> Vec<Interval> {
    intervals.sort_by_key(|iv| iv.start);

    let mut merged: Vec<Interval> = Vec::with_capacity(intervals.len());
    for iv in intervals {
        match merged.last_mut() {
            Some(last) if iv.start <= last.end => {
                if iv.end > last.end {
                    last.end = iv.end;
                }
            }
            _ => merged.push(iv),
        }
    }
    merged
}

/// Remove every busy interval from the free set.
///
/// Both inputs must be normalized; the result is normalized.
pub fn subtract(free: &[Interval], busy: &[Interval]) -> Vec<Interval> {
    let mut result = Vec::with_capacity(free.len());

    for &f in free {
        let mut cursor = f.start;
        for &b in busy {
            if b.end <= cursor {
                continue;
            }
            if b.start >= f.end {
                break;
            }
            if b.start > cursor {
                // Free run before this busy block
                result.push(Interval { start: cursor, end: b.start.min(f.end) });
            }
            cursor = cursor.max(b.end);
            if cursor >= f.end {
                break;
            }
        }
        if cursor < f.end {
            result.push(Interval { start: cursor, end: f.end });
        }
    }

    result
}

/// Pairwise intersection of two normalized interval sets.
pub fn intersect(a: &[Interval], b: &[Interval]) -> Vec<Interval> {
    let mut result = Vec::new();
    let (mut i, mut j) = (0, 0);

    while i < a.len() && j < b.len() {
        let start = a[i].start.max(b[j].start);
        let end = a[i].end.min(b[j].end);
        if start < end {
            result.push(Interval { start, end });
        }
        // Advance whichever set ends first
        if a[i].end <= b[j].end {
            i += 1;
        } else {
            j += 1;
        }
    }

    result
}

/// Drop the part of each interval that starts before `cutoff`.
pub fn clip_before(intervals: &[Interval], cutoff: DateTime<Utc>) -> Vec<Interval> {
    intervals
        .iter()
        .filter_map(|iv| {
            if iv.end <= cutoff {
                None
            } else {
                Some(Interval { start: iv.start.max(cutoff), end: iv.end })
            }
        })
        .collect()
}

/// Slice an interval into contiguous slots of exactly `duration`, stepping
/// by `duration` from the interval's start. A slot is emitted only when it
/// fully fits.
pub fn slice(interval: &Interval, duration: Duration) -> Vec<Interval> {
    let mut slots = Vec::new();
    if duration <= Duration::zero() {
        return slots;
    }

    let mut cursor = interval.start;
    while cursor + duration <= interval.end {
        slots.push(Interval { start: cursor, end: cursor + duration });
        cursor += duration;
    }
    slots
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at(hour: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 3, hour, min, 0).unwrap()
    }

    fn iv(s: (u32, u32), e: (u32, u32)) -> Interval {
        Interval { start: at(s.0, s.1), end: at(e.0, e.1) }
    }

    #[test]
    fn normalize_merges_overlapping_and_touching() {
        let merged = normalize(vec![iv((13, 0), (14, 0)), iv((9, 0), (10, 0)), iv((10, 0), (11, 0))]);
        assert_eq!(merged, vec![iv((9, 0), (11, 0)), iv((13, 0), (14, 0))]);
    }

    #[test]
    fn subtract_splits_around_busy_block() {
        let free = vec![iv((9, 0), (12, 0))];
        let busy = vec![iv((10, 0), (10, 30))];
        assert_eq!(subtract(&free, &busy), vec![iv((9, 0), (10, 0)), iv((10, 30), (12, 0))]);
    }

    #[test]
    fn subtract_removes_fully_covered_interval() {
        let free = vec![iv((9, 0), (10, 0))];
        let busy = vec![iv((8, 0), (11, 0))];
        assert!(subtract(&free, &busy).is_empty());
    }

    #[test]
    fn subtract_handles_busy_spanning_edges() {
        let free = vec![iv((9, 0), (12, 0))];
        let busy = vec![iv((8, 0), (9, 30)), iv((11, 30), (13, 0))];
        assert_eq!(subtract(&free, &busy), vec![iv((9, 30), (11, 30))]);
    }

    #[test]
    fn intersect_keeps_common_runs() {
        let a = vec![iv((9, 0), (12, 0)), iv((13, 0), (15, 0))];
        let b = vec![iv((10, 0), (13, 30))];
        assert_eq!(intersect(&a, &b), vec![iv((10, 0), (12, 0)), iv((13, 0), (13, 30))]);
    }

    #[test]
    fn intersect_disjoint_is_empty() {
        let a = vec![iv((9, 0), (10, 0))];
        let b = vec![iv((10, 0), (11, 0))];
        assert!(intersect(&a, &b).is_empty());
    }

    #[test]
    fn clip_before_trims_and_drops() {
        let set = vec![iv((9, 0), (10, 0)), iv((11, 0), (12, 0))];
        let clipped = clip_before(&set, at(9, 30));
        assert_eq!(clipped, vec![iv((9, 30), (10, 0)), iv((11, 0), (12, 0))]);

        let all_past = clip_before(&set, at(13, 0));
        assert!(all_past.is_empty());
    }

    #[test]
    fn slice_steps_from_interval_start() {
        let slots = slice(&iv((9, 0), (10, 45)), Duration::minutes(30));
        assert_eq!(slots, vec![iv((9, 0), (9, 30)), iv((9, 30), (10, 0)), iv((10, 0), (10, 30))]);
    }

    #[test]
    fn slice_emits_nothing_when_slot_does_not_fit() {
        assert!(slice(&iv((9, 0), (9, 20)), Duration::minutes(30)).is_empty());
    }
}
