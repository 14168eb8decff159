use indexmap::IndexMap;
use std::time::{Duration, Instant};

/// Stage durations collected while a single request is processed
pub struct RequestTimings {
    stages: IndexMap<String, Duration>,
    checkpoint: Instant,
}

impl RequestTimings {
    pub fn new() -> Self {
        Self {
            stages: IndexMap::new(),
            checkpoint: Instant::now(),
        }
    }

    /// Records the time spent since the previous checkpoint under `stage`.
    pub fn record_stage(&mut self, stage: &str) {
        let now = Instant::now();
        let entry = self
            .stages
            .entry(stage.to_string())
            .or_insert(Duration::ZERO);
        *entry += now.duration_since(self.checkpoint);
        self.checkpoint = now;
    }

    pub fn stage(&self, stage: &str) -> Option<Duration> {
        self.stages.get(stage).copied()
    }

    pub fn into_stages(self) -> IndexMap<String, Duration> {
        self.stages
    }
}

impl Default for RequestTimings {
    fn default() -> Self {
        Self::new()
    }
}
