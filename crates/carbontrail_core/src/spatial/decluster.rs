//! Marker declustering.
//!
//! # Responsibility
//! - Spread markers that share a rounded coordinate over a centered grid.
//!
//! # Invariants
//! - Output order matches input order one-to-one.
//! - Offsets of one group always average to zero.
//! - Groups are keyed by rounded coordinates, not by canonical location.

use crate::model::coordinate::Coordinate;
use crate::model::event::LifecycleEvent;
use std::collections::HashMap;

/// Default spacing between declustered markers (~40 m).
pub const DEFAULT_BASE_OFFSET_DEG: f64 = 0.0004;
/// Default rounding precision for group keys (~11 m).
pub const DEFAULT_GROUP_PRECISION: u32 = 4;

/// Grid offsets `(d_lat, d_lng)` for `count` items.
///
/// Items fill a `ceil(sqrt(n))`-column grid row by row, centered on the
/// origin. When the last row is partial the whole grid is shifted so the
/// offsets still average to zero.
pub fn grid_offsets(count: usize, base_offset_deg: f64) -> Vec<(f64, f64)> {
    if count == 0 {
        return Vec::new();
    }
    let columns = (count as f64).sqrt().ceil() as usize;
    let rows = count.div_ceil(columns);
    let center_row = (rows as f64 - 1.0) / 2.0;
    let center_col = (columns as f64 - 1.0) / 2.0;

    let cells = (0..count)
        .map(|i| {
            let row = (i / columns) as f64;
            let col = (i % columns) as f64;
            (row - center_row, col - center_col)
        })
        .collect::<Vec<_>>();

    let n = count as f64;
    let (mean_row, mean_col) = cells
        .iter()
        .fold((0.0, 0.0), |(r, c), (row, col)| (r + row / n, c + col / n));

    cells
        .into_iter()
        .map(|(row, col)| {
            (
                (row - mean_row) * base_offset_deg,
                (col - mean_col) * base_offset_deg,
            )
        })
        .collect()
}

/// Offsets a group of events that share an approximate coordinate.
///
/// Each event keeps its own coordinate as origin, so near-identical points
/// stay near-identical relative to each other.
pub fn decluster_group(events: &[&LifecycleEvent], base_offset_deg: f64) -> Vec<Coordinate> {
    grid_offsets(events.len(), base_offset_deg)
        .into_iter()
        .zip(events)
        .map(|((d_lat, d_lng), event)| event.coordinate.offset(d_lat, d_lng))
        .collect()
}

/// One event's declustered display position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedEvent<'a> {
    pub event: &'a LifecycleEvent,
    pub position: Coordinate,
}

/// Groups events by rounded coordinate and declusters each group.
///
/// Output follows input order; group membership order is input order too.
pub fn decluster_events<'a>(
    events: &[&'a LifecycleEvent],
    base_offset_deg: f64,
    precision: u32,
) -> Vec<PlacedEvent<'a>> {
    let mut groups: HashMap<(i64, i64), Vec<usize>> = HashMap::new();
    for (position, event) in events.iter().enumerate() {
        groups
            .entry(event.coordinate.rounded_key(precision))
            .or_default()
            .push(position);
    }

    let mut placed = vec![None; events.len()];
    for members in groups.values() {
        let group = members.iter().map(|&i| events[i]).collect::<Vec<_>>();
        for (&i, position) in members.iter().zip(decluster_group(&group, base_offset_deg)) {
            placed[i] = Some(PlacedEvent {
                event: events[i],
                position,
            });
        }
    }
    placed.into_iter().flatten().collect()
}
