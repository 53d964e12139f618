//! Date alignment (inner join) across series.
//!
//! Dates are matched exactly. The left series sets the output order; a date
//! that appears twice on the left is emitted once, and a date repeated on the
//! right resolves to its last value.

use std::collections::{HashMap, HashSet};

use crate::domain::{AlignedRow, Series};

/// Join `a` and `b` on shared dates, in `a`'s order.
pub fn align(a: &Series, b: &Series) -> Vec<AlignedRow> {
    join(seed_rows(a), b)
}

/// N-way join by repeated pairwise application, in the first series' order.
///
/// `row.values[i]` comes from `series[i]`.
pub fn align_all(series: &[&Series]) -> Vec<AlignedRow> {
    let Some((first, rest)) = series.split_first() else {
        return Vec::new();
    };
    rest.iter().fold(seed_rows(first), |rows, next| join(rows, next))
}

fn seed_rows(series: &Series) -> Vec<AlignedRow> {
    let mut seen = HashSet::with_capacity(series.len());
    series
        .observations
        .iter()
        .filter(|o| seen.insert(o.date))
        .map(|o| AlignedRow {
            date: o.date,
            values: vec![o.value],
        })
        .collect()
}

fn join(rows: Vec<AlignedRow>, next: &Series) -> Vec<AlignedRow> {
    let lookup: HashMap<_, _> = next.observations.iter().map(|o| (o.date, o.value)).collect();

    rows.into_iter()
        .filter_map(|mut row| {
            let value = lookup.get(&row.date)?;
            row.values.push(*value);
            Some(row)
        })
        .collect()
}
