//! Accuracy: mean classification weight over scored moves, as a percentage.

use serde::{Deserialize, Serialize};

use crate::classification::Classification;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Accuracy {
    /// 0-100; 0 when there was nothing to score
    pub value: f64,
    pub classified_moves: usize,
    /// Set when no move could be scored. Callers should not display `value`.
    pub insufficient_data: bool,
}

impl Accuracy {
    pub fn insufficient() -> Self {
        Self {
            value: 0.0,
            classified_moves: 0,
            insufficient_data: true,
        }
    }
}

/// Accuracy of a sequence of labels. Neutral moves are skipped entirely.
pub fn accuracy<I>(labels: I) -> Accuracy
where
    I: IntoIterator<Item = Classification>,
{
    match mean_weight(labels) {
        Some((mean, count)) => Accuracy {
            value: mean * 100.0,
            classified_moves: count,
            insufficient_data: false,
        },
        None => Accuracy::insufficient(),
    }
}

/// Mean weight and the number of scored labels, `None` when nothing was scored.
pub fn mean_weight<I>(labels: I) -> Option<(f64, usize)>
where
    I: IntoIterator<Item = Classification>,
{
    let (sum, count) = labels
        .into_iter()
        .filter_map(Classification::weight)
        .fold((0.0, 0usize), |(sum, count), w| (sum + w, count + 1));

    (count > 0).then(|| (sum / count as f64, count))
}
