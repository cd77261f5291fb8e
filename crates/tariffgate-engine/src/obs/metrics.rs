//! Minimal metrics registry for the engine.
//!
//! Counters and histograms carry dynamic labels backed by `DashMap`. Label
//! sets are sorted before use so rendering order is deterministic. Histogram
//! buckets are fixed in milliseconds because hold durations are derived from
//! round-trip times.

use dashmap::DashMap;
use std::fmt::Write;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::Duration;

type LabelKey = Vec<(String, String)>;

fn label_key(labels: &[(&str, &str)]) -> LabelKey {
    let mut key: LabelKey = labels
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    key.sort();
    key
}

fn render_labels(key: &LabelKey) -> String {
    key.iter()
        .map(|(k, v)| {
            let v = v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n");
            format!("{k}=\"{v}\"")
        })
        .collect::<Vec<_>>()
        .join(",")
}

fn series(name: &str, labels: &str) -> String {
    if labels.is_empty() {
        name.to_string()
    } else {
        format!("{name}{{{labels}}}")
    }
}

#[derive(Default)]
pub struct CounterVec {
    map: DashMap<LabelKey, AtomicU64>,
}

impl CounterVec {
    pub fn inc(&self, labels: &[(&str, &str)]) {
        self.add(labels, 1);
    }

    pub fn add(&self, labels: &[(&str, &str)], v: u64) {
        self.map
            .entry(label_key(labels))
            .or_insert_with(|| AtomicU64::new(0))
            .fetch_add(v, Ordering::Relaxed);
    }

    /// Current value for a label set (0 if never touched).
    pub fn get(&self, labels: &[(&str, &str)]) -> u64 {
        self.map
            .get(&label_key(labels))
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    fn render(&self, name: &str, out: &mut String) {
        let _ = writeln!(out, "# TYPE {name} counter");
        for r in self.map.iter() {
            let labels = render_labels(r.key());
            let _ = writeln!(out, "{} {}", series(name, &labels), r.value().load(Ordering::Relaxed));
        }
    }
}

/// Unlabelled gauge.
#[derive(Default)]
pub struct Gauge {
    value: AtomicI64,
}

impl Gauge {
    pub fn inc(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    pub fn dec(&self) {
        self.value.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn sub(&self, v: i64) {
        self.value.fetch_sub(v, Ordering::Relaxed);
    }

    pub fn get(&self) -> i64 {
        self.value.load(Ordering::Relaxed)
    }

    fn render(&self, name: &str, out: &mut String) {
        let _ = writeln!(out, "# TYPE {name} gauge\n{name} {}", self.get());
    }
}

// 1ms .. 60s
const BUCKETS_MS: [u64; 10] = [1, 10, 50, 100, 250, 500, 1_000, 5_000, 15_000, 60_000];

#[derive(Default)]
struct Histogram {
    count: AtomicU64,
    sum_ms: AtomicU64,
    buckets: [AtomicU64; BUCKETS_MS.len()],
}

#[derive(Default)]
pub struct HistogramVec {
    map: DashMap<LabelKey, Histogram>,
}

impl HistogramVec {
    /// Observe a duration (millisecond resolution, cumulative buckets).
    pub fn observe(&self, labels: &[(&str, &str)], d: Duration) {
        let ms = u64::try_from(d.as_millis()).unwrap_or(u64::MAX);
        let hist = self.map.entry(label_key(labels)).or_default();

        hist.count.fetch_add(1, Ordering::Relaxed);
        hist.sum_ms.fetch_add(ms, Ordering::Relaxed);
        for (i, &le) in BUCKETS_MS.iter().enumerate() {
            if ms <= le {
                hist.buckets[i].fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    pub fn count(&self, labels: &[(&str, &str)]) -> u64 {
        self.map
            .get(&label_key(labels))
            .map(|h| h.count.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    fn render(&self, name: &str, out: &mut String) {
        let _ = writeln!(out, "# TYPE {name} histogram");
        for r in self.map.iter() {
            let labels = render_labels(r.key());
            let prefix = if labels.is_empty() { String::new() } else { format!("{labels},") };
            let hist = r.value();
            for (i, le) in BUCKETS_MS.iter().enumerate() {
                let n = hist.buckets[i].load(Ordering::Relaxed);
                let _ = writeln!(out, "{name}_bucket{{{prefix}le=\"{le}\"}} {n}");
            }
            let count = hist.count.load(Ordering::Relaxed);
            let _ = writeln!(out, "{name}_bucket{{{prefix}le=\"+Inf\"}} {count}");
            let _ = writeln!(out, "{} {}", series(&format!("{name}_sum"), &labels), hist.sum_ms.load(Ordering::Relaxed));
            let _ = writeln!(out, "{} {count}", series(&format!("{name}_count"), &labels));
        }
    }
}

#[derive(Default)]
pub struct EngineMetrics {
    /// `decision` = pass | drop | hold
    pub decisions: CounterVec,
    pub geo_unresolved: CounterVec,
    pub flows_retained: Gauge,
    /// `outcome` = released | cancelled | cleared
    pub releases: CounterVec,
    pub hold_duration: HistogramVec,
    pub duplicate_flows: CounterVec,
}

impl EngineMetrics {
    /// Render everything in Prometheus text exposition format.
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.decisions.render("tariffgate_decisions_total", &mut out);
        self.geo_unresolved.render("tariffgate_geo_unresolved_total", &mut out);
        self.flows_retained.render("tariffgate_flows_retained", &mut out);
        self.releases.render("tariffgate_releases_total", &mut out);
        self.hold_duration.render("tariffgate_hold_duration_ms", &mut out);
        self.duplicate_flows.render("tariffgate_duplicate_flows_total", &mut out);
        out
    }
}
