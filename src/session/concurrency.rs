//! Concurrent-session counting.
//!
//! Two sessions `i` and `j` overlap when `start_j < end_i && end_j > start_i`
//! (open intervals, so touching endpoints do not overlap). A session's
//! count is 1 for itself plus every other session it overlaps, across all
//! of the user's machines.
//!
//! Counting is done with sorted endpoint arrays and binary search instead of
//! comparing every pair, so a user with thousands of sessions in a week
//! stays cheap:
//!
//! ```text
//! overlapping(i) = #{ j : start_j < end_i } - #{ j : end_j <= start_i }
//! ```
//!
//! The subtraction is exact because every session with `end_j <= start_i`
//! also has `start_j <= end_j <= start_i < end_i`. Zero-length sessions
//! break that chain and are corrected for separately.

use super::Session;

/// Overlap counts for a set of `(start, end)` intervals, `start <= end`.
pub fn overlap_counts<T: Ord + Copy>(intervals: &[(T, T)]) -> Vec<usize> {
    let mut starts: Vec<T> = intervals.iter().map(|&(s, _)| s).collect();
    let mut ends: Vec<T> = intervals.iter().map(|&(_, e)| e).collect();
    let mut points: Vec<T> = intervals
        .iter()
        .filter(|(s, e)| s == e)
        .map(|&(s, _)| s)
        .collect();
    starts.sort_unstable();
    ends.sort_unstable();
    points.sort_unstable();

    intervals
        .iter()
        .map(|&(start, end)| {
            let started_before_end = starts.partition_point(|&s| s < end);
            let ended_by_start = ends.partition_point(|&e| e <= start);
            if start < end {
                // the session itself is in `started_before_end` and not in
                // `ended_by_start`; it is counted once either way
                started_before_end - ended_by_start
            } else {
                // a point at t: sessions ending exactly at t and also starting
                // at t are other points, which do not overlap it
                let same_point = points.partition_point(|&p| p <= start)
                    - points.partition_point(|&p| p < start);
                1 + started_before_end + same_point - ended_by_start
            }
        })
        .collect()
}

/// Fill in [`Session::concurrency`] for all sessions of one user.
pub fn annotate_concurrency(sessions: &mut [Session]) {
    let intervals: Vec<_> = sessions
        .iter()
        .map(|s| (s.start_time, s.end_time))
        .collect();
    for (session, count) in sessions.iter_mut().zip(overlap_counts(&intervals)) {
        session.concurrency = count;
    }
}
