use std::collections::VecDeque;
use std::f64::consts::{FRAC_PI_2, TAU};

use rand::Rng;

use crate::models::{HeatPoint, Top100ChartPoint};

/// Angle of radar axis `index`, starting straight up and moving clockwise.
pub fn radar_axis_angle(index: usize, count: usize) -> f64 {
    if count == 0 {
        return FRAC_PI_2;
    }
    FRAC_PI_2 - TAU * index as f64 / count as f64
}

/// Screen point for `value` (0..=100) on axis `index`. Canvas y grows upwards.
pub fn radar_point(
    center: (f64, f64),
    radius: f64,
    index: usize,
    count: usize,
    value: f64,
) -> (f64, f64) {
    let r = value.clamp(0.0, 100.0) / 100.0 * radius;
    let angle = radar_axis_angle(index, count);
    (center.0 + r * angle.cos(), center.1 + r * angle.sin())
}

pub fn radar_polygon(values: &[f64], center: (f64, f64), radius: f64) -> Vec<(f64, f64)> {
    let count = values.len();
    values
        .iter()
        .enumerate()
        .map(|(idx, value)| radar_point(center, radius, idx, count, *value))
        .collect()
}

/// Concentric guide rings at evenly spaced levels, outermost last.
pub fn radar_rings(count: usize, rings: usize, center: (f64, f64), radius: f64) -> Vec<Vec<(f64, f64)>> {
    (1..=rings)
        .map(|ring| {
            let level = 100.0 * ring as f64 / rings as f64;
            (0..count)
                .map(|idx| radar_point(center, radius, idx, count, level))
                .collect()
        })
        .collect()
}

/// Closed outline as line segments.
pub fn polygon_segments(points: &[(f64, f64)]) -> Vec<((f64, f64), (f64, f64))> {
    if points.len() < 2 {
        return Vec::new();
    }
    points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| (*a, *b))
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeatGrid {
    pub cols: usize,
    pub rows: usize,
    /// Row-major, 0..=1 relative to the hottest cell.
    pub cells: Vec<f64>,
}

impl HeatGrid {
    pub fn get(&self, col: usize, row: usize) -> f64 {
        if col >= self.cols || row >= self.rows {
            return 0.0;
        }
        self.cells[row * self.cols + col]
    }
}

/// Bins pitch coordinates (0..=100 on both axes) into a `cols x rows` grid.
pub fn bin_heatmap(points: &[HeatPoint], cols: usize, rows: usize) -> HeatGrid {
    let cols = cols.max(1);
    let rows = rows.max(1);
    let mut counts = vec![0u32; cols * rows];
    for point in points {
        if !point.x.is_finite() || !point.y.is_finite() {
            continue;
        }
        let col = cell_index(point.x, cols);
        let row = cell_index(point.y, rows);
        counts[row * cols + col] += 1;
    }
    let max = counts.iter().copied().max().unwrap_or(0);
    let cells = counts
        .iter()
        .map(|count| {
            if max == 0 {
                0.0
            } else {
                *count as f64 / max as f64
            }
        })
        .collect();
    HeatGrid { cols, rows, cells }
}

fn cell_index(coord: f64, cells: usize) -> usize {
    let scaled = (coord.clamp(0.0, 100.0) / 100.0 * cells as f64) as usize;
    scaled.min(cells - 1)
}

/// Bar heights for a sparkline, relative to the series minimum. A flat series
/// still renders as a visible baseline.
pub fn sparkline_values(series: &[f64]) -> Vec<u64> {
    let finite: Vec<f64> = series.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return Vec::new();
    }
    let min = finite.iter().copied().fold(f64::INFINITY, f64::min);
    let max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = max - min;
    series
        .iter()
        .map(|v| {
            if !v.is_finite() {
                return 0;
            }
            if span <= f64::EPSILON {
                return 1;
            }
            (((v - min) / span) * 99.0).round() as u64 + 1
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candle {
    pub gameweek: u32,
    pub open: f64,
    pub close: f64,
    pub high: f64,
    pub low: f64,
}

impl Candle {
    pub fn rising(&self) -> bool {
        self.close >= self.open
    }
}

/// Top-100 average points as trading candles: each week opens at the previous close.
pub fn trading_candles(points: &[Top100ChartPoint]) -> Vec<Candle> {
    let mut sorted: Vec<&Top100ChartPoint> = points.iter().collect();
    sorted.sort_by_key(|p| p.gameweek);
    let mut candles = Vec::with_capacity(sorted.len());
    let mut prev_close: Option<f64> = None;
    for point in sorted {
        let close = point.average_points;
        let open = prev_close.unwrap_or(close);
        let mut high = open.max(close);
        let mut low = open.min(close);
        if let Some(max) = point.max_points {
            high = high.max(max);
        }
        if let Some(min) = point.min_points {
            low = low.min(min);
        }
        candles.push(Candle {
            gameweek: point.gameweek,
            open,
            close,
            high,
            low,
        });
        prev_close = Some(close);
    }
    candles
}

/// (min, max) across every candle's wicks, padded so a flat chart still has height.
pub fn candle_bounds(candles: &[Candle]) -> (f64, f64) {
    let low = candles.iter().map(|c| c.low).fold(f64::INFINITY, f64::min);
    let high = candles.iter().map(|c| c.high).fold(f64::NEG_INFINITY, f64::max);
    if !low.is_finite() || !high.is_finite() {
        return (0.0, 1.0);
    }
    if (high - low).abs() < f64::EPSILON {
        return (low - 1.0, high + 1.0);
    }
    (low, high)
}

const HEARTBEAT_DECAY: f64 = 0.72;
const HEARTBEAT_NOISE: f64 = 0.04;

/// Decorative EKG trail. One `step` per frame.
#[derive(Debug, Clone)]
pub struct Heartbeat {
    trail: VecDeque<f64>,
    capacity: usize,
    period: u32,
    frame: u32,
    level: f64,
}

impl Heartbeat {
    pub fn new(capacity: usize, period: u32) -> Self {
        Self {
            trail: VecDeque::with_capacity(capacity.max(2)),
            capacity: capacity.max(2),
            period: period.max(2),
            frame: 0,
            level: 0.0,
        }
    }

    pub fn step<R: Rng>(&mut self, rng: &mut R) {
        self.frame = (self.frame + 1) % self.period;
        self.level = match self.frame {
            0 => 1.0,
            1 => -0.35,
            _ => self.level * HEARTBEAT_DECAY,
        };
        let noise = rng.gen_range(-HEARTBEAT_NOISE..=HEARTBEAT_NOISE);
        if self.trail.len() == self.capacity {
            self.trail.pop_front();
        }
        self.trail.push_back((self.level + noise).clamp(-1.0, 1.0));
    }

    pub fn len(&self) -> usize {
        self.trail.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trail.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// (x, y) points with x as the frame offset.
    pub fn points(&self) -> Vec<(f64, f64)> {
        self.trail
            .iter()
            .enumerate()
            .map(|(idx, value)| (idx as f64, *value))
            .collect()
    }
}
