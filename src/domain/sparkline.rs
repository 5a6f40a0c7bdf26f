// SVG polyline geometry for KPI sparklines
use super::series::{downsample, SeriesPoint};

/// Build the `points` attribute of an SVG polyline for a series.
///
/// Points are spread evenly on x; y is inverted so larger values sit higher.
pub fn sparkline_points(series: &[SeriesPoint], width: f64, height: f64, padding: f64) -> String {
    if series.is_empty() || width <= 0.0 || height <= 0.0 {
        return String::new();
    }

    let max_points = (width.floor() as usize).max(2);
    let points = downsample(series, max_points);

    let inner_w = (width - 2.0 * padding).max(0.0);
    let inner_h = (height - 2.0 * padding).max(0.0);
    let min = points.iter().map(|p| p.v).fold(f64::INFINITY, f64::min);
    let max = points.iter().map(|p| p.v).fold(f64::NEG_INFINITY, f64::max);
    let span = max - min;
    let step = if points.len() > 1 {
        inner_w / (points.len() - 1) as f64
    } else {
        0.0
    };

    points
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let x = padding + step * i as f64;
            let y = if span == 0.0 {
                padding + inner_h / 2.0
            } else {
                padding + inner_h - (p.v - min) / span * inner_h
            };
            format!("{:.1},{:.1}", x, y)
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_series() {
        assert_eq!(sparkline_points(&[], 100.0, 30.0, 2.0), "");
    }

    #[test]
    fn test_points_scale_to_box() {
        let series = vec![
            SeriesPoint::new(1, 0.0),
            SeriesPoint::new(2, 10.0),
            SeriesPoint::new(3, 5.0),
        ];
        assert_eq!(sparkline_points(&series, 100.0, 20.0, 0.0), "0.0,20.0 50.0,0.0 100.0,10.0");
    }

    #[test]
    fn test_flat_series_draws_mid_line() {
        let series = vec![SeriesPoint::new(1, 3.0), SeriesPoint::new(2, 3.0)];
        assert_eq!(sparkline_points(&series, 10.0, 10.0, 1.0), "1.0,5.0 9.0,5.0");
    }
}
