//! Statistics calculations for per-pass query latency.

use std::time::Duration;

/// Latency statistics with percentiles, in nanoseconds per pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct LatencyStats {
    pub avg_ns: f64,
    pub p50_ns: f64,
    pub p95_ns: f64,
    pub p99_ns: f64,
}

impl LatencyStats {
    /// Average latency of `self` divided by that of `other`, or 0 if `other` is empty.
    pub fn speedup_over(&self, other: &LatencyStats) -> f64 {
        if self.avg_ns > 0.0 {
            other.avg_ns / self.avg_ns
        } else {
            0.0
        }
    }
}

/// Calculate latency percentiles from a list of durations.
pub fn calculate_percentiles(times: &[Duration]) -> LatencyStats {
    if times.is_empty() {
        return LatencyStats::default();
    }

    let mut ns: Vec<f64> = times.iter().map(|d| d.as_secs_f64() * 1e9).collect();
    ns.sort_by(|a, b| a.total_cmp(b));

    let n = ns.len();
    let at = |q: f64| ns[((n as f64 * q) as usize).min(n - 1)];

    LatencyStats {
        avg_ns: ns.iter().sum::<f64>() / n as f64,
        p50_ns: at(0.50),
        p95_ns: at(0.95),
        p99_ns: at(0.99),
    }
}

/// Format a number with thousand separators.
pub fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    for (i, c) in s.chars().enumerate() {
        if i > 0 && (s.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result
}
