use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Wall-clock time spent in one stage of a frame.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageTiming {
    pub label: String,
    pub elapsed_ms: f64,
}

impl StageTiming {
    pub fn new(label: impl Into<String>, elapsed_ms: f64) -> Self {
        Self {
            label: label.into(),
            elapsed_ms,
        }
    }
}

/// Per-frame timing trace.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimingBreakdown {
    pub total_ms: f64,
    pub stages: Vec<StageTiming>,
}

impl TimingBreakdown {
    pub fn with_total(total_ms: f64) -> Self {
        Self {
            total_ms,
            stages: Vec::new(),
        }
    }

    pub fn push(&mut self, label: impl Into<String>, elapsed_ms: f64) {
        self.stages.push(StageTiming::new(label, elapsed_ms));
    }

    /// Runs `f`, records its duration under `label` and returns its output.
    pub fn time<T>(&mut self, label: &str, f: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let out = f();
        self.push(label, start.elapsed().as_secs_f64() * 1000.0);
        out
    }

    pub fn stage_ms(&self, label: &str) -> Option<f64> {
        self.stages
            .iter()
            .find(|s| s.label == label)
            .map(|s| s.elapsed_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timed_closure_is_recorded() {
        let mut t = TimingBreakdown::default();
        let v = t.time("strings", || 41 + 1);
        assert_eq!(v, 42);
        assert_eq!(t.stages.len(), 1);
        assert!(t.stage_ms("strings").unwrap() >= 0.0);
        assert!(t.stage_ms("frets").is_none());
    }

    #[test]
    fn serializes_camel_case() {
        let mut t = TimingBreakdown::with_total(3.5);
        t.push("pluck", 1.25);
        let json = serde_json::to_string(&t).unwrap();
        assert!(json.contains("\"totalMs\":3.5"));
        assert!(json.contains("\"elapsedMs\":1.25"));
    }
}
