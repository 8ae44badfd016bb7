use std::fs;
use std::path::PathBuf;

use rand::SeedableRng;
use rand::rngs::StdRng;

use fpl_terminal::api::parse_json;
use fpl_terminal::charts::{
    Heartbeat, bin_heatmap, candle_bounds, polygon_segments, radar_point, radar_polygon,
    radar_rings, sparkline_values, trading_candles,
};
use fpl_terminal::models::{HeatPoint, Top100Chart};

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn candles_open_at_previous_close_in_gameweek_order() {
    let raw = fs::read_to_string(
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/top100_chart.json"),
    )
    .expect("fixture");
    let chart: Top100Chart = parse_json(&raw, "chart").expect("chart");
    let candles = trading_candles(&chart.points);

    let weeks: Vec<u32> = candles.iter().map(|c| c.gameweek).collect();
    assert_eq!(weeks, vec![1, 2, 3]);

    // First week is flat, wicks come from min/max.
    assert!(close(candles[0].open, 80.5));
    assert!(close(candles[0].high, 110.0));
    assert!(close(candles[0].low, 60.0));

    // Missing wicks fall back to the body.
    assert!(close(candles[1].open, 80.5));
    assert!(close(candles[1].high, 80.5));
    assert!(close(candles[1].low, 64.25));
    assert!(!candles[1].rising());

    assert!(close(candles[2].open, 64.25));
    assert!(candles[2].rising());
    assert_eq!(candle_bounds(&candles), (52.0, 110.0));
}

#[test]
fn candle_bounds_pad_flat_and_empty_charts() {
    assert_eq!(candle_bounds(&[]), (0.0, 1.0));
    let flat = trading_candles(&[fpl_terminal::models::Top100ChartPoint {
        gameweek: 1,
        average_points: 50.0,
        ..Default::default()
    }]);
    assert_eq!(candle_bounds(&flat), (49.0, 51.0));
}

#[test]
fn radar_starts_at_top_and_runs_clockwise() {
    let (x, y) = radar_point((0.0, 0.0), 10.0, 0, 4, 100.0);
    assert!(close(x, 0.0) && close(y, 10.0));
    let (x, y) = radar_point((0.0, 0.0), 10.0, 1, 4, 100.0);
    assert!(close(x, 10.0) && close(y, 0.0));
    // Values clamp to the outer ring.
    let (x, y) = radar_point((0.0, 0.0), 10.0, 0, 4, 250.0);
    assert!(close(x, 0.0) && close(y, 10.0));

    let polygon = radar_polygon(&[50.0, 50.0, 50.0], (5.0, 5.0), 10.0);
    assert_eq!(polygon.len(), 3);
    assert_eq!(polygon_segments(&polygon).len(), 3);
    assert!(polygon_segments(&polygon[..1]).is_empty());

    let rings = radar_rings(6, 4, (0.0, 0.0), 8.0);
    assert_eq!(rings.len(), 4);
    assert!(close(rings[3][0].1, 8.0));
    assert!(close(rings[0][0].1, 2.0));
}

#[test]
fn heatmap_normalizes_to_hottest_cell() {
    let points = vec![
        HeatPoint { x: 10.0, y: 10.0 },
        HeatPoint { x: 12.0, y: 14.0 },
        HeatPoint { x: 100.0, y: 100.0 },
        HeatPoint {
            x: f64::NAN,
            y: 50.0,
        },
    ];
    let grid = bin_heatmap(&points, 4, 4);
    assert_eq!(grid.cells.len(), 16);
    assert!(close(grid.get(0, 0), 1.0));
    assert!(close(grid.get(3, 3), 0.5));
    assert!(close(grid.get(1, 1), 0.0));
    assert!(close(grid.get(9, 0), 0.0));

    let empty = bin_heatmap(&[], 0, 0);
    assert_eq!((empty.cols, empty.rows), (1, 1));
    assert!(close(empty.get(0, 0), 0.0));
}

#[test]
fn sparkline_scales_and_keeps_flat_series_visible() {
    assert!(sparkline_values(&[]).is_empty());
    assert_eq!(sparkline_values(&[7.0, 7.0]), vec![1, 1]);
    assert_eq!(sparkline_values(&[0.0, 5.0, 10.0]), vec![1, 51, 100]);
    assert_eq!(sparkline_values(&[1.0, f64::NAN, 2.0]), vec![1, 0, 100]);
}

#[test]
fn heartbeat_trail_is_bounded_and_spikes_each_period() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut heartbeat = Heartbeat::new(3, 4);
    assert!(heartbeat.is_empty());
    for _ in 0..4 {
        heartbeat.step(&mut rng);
    }
    assert_eq!(heartbeat.len(), 3);
    assert_eq!(heartbeat.capacity(), 3);

    let points = heartbeat.points();
    assert_eq!(points.len(), 3);
    let (x, y) = points[2];
    assert!(close(x, 2.0));
    assert!((0.96..=1.0).contains(&y), "spike was {y}");
    assert!(points.iter().all(|(_, y)| (-1.0..=1.0).contains(y)));
}
