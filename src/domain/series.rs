// Time series domain model shared by KPI cards and sparklines
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    /// Unix time in milliseconds
    pub t: i64,
    pub v: f64,
}

impl SeriesPoint {
    pub fn new(t: i64, v: f64) -> Self {
        Self { t, v }
    }
}

/// Downsample time series points using bucket averaging.
///
/// Each bucket keeps its middle point's timestamp, so ascending input stays ascending.
pub fn downsample(points: &[SeriesPoint], max_points: usize) -> Vec<SeriesPoint> {
    if max_points == 0 {
        return Vec::new();
    }
    if points.len() <= max_points {
        return points.to_vec();
    }

    let bucket_size = (points.len() as f64 / max_points as f64).ceil() as usize;
    let mut downsampled = Vec::with_capacity(max_points);

    for chunk in points.chunks(bucket_size) {
        let mid_idx = chunk.len() / 2;
        let avg_value = chunk.iter().map(|p| p.v).sum::<f64>() / chunk.len() as f64;
        downsampled.push(SeriesPoint::new(chunk[mid_idx].t, avg_value));
    }

    downsampled
}

pub fn is_ascending(points: &[SeriesPoint]) -> bool {
    points.windows(2).all(|w| w[0].t <= w[1].t)
}
