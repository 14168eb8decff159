use indexmap::IndexMap;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderCallOutcome {
    Success,
    Failure,
    Timeout,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProviderStats {
    pub calls: u64,
    pub failures: u64,
    pub timeouts: u64,
    pub average_latency_ms: f64,
}

/// Read-only copy of the collector state
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub rejected_requests: u64,
    pub failed_requests: u64,
    pub cache_hits: u64,
    pub fallbacks: u64,
    pub average_latency_ms: f64,
    pub average_confidence: f64,
    pub error_rate: f64,
    pub providers: IndexMap<String, ProviderStats>,
}

#[derive(Debug, Default)]
struct RollingAverages {
    latency_ms: Option<f64>,
    confidence: Option<f64>,
}

/// Process-wide request counters with exponentially smoothed averages
pub struct MetricsCollector {
    total: AtomicU64,
    successful: AtomicU64,
    rejected: AtomicU64,
    failed: AtomicU64,
    cache_hits: AtomicU64,
    fallbacks: AtomicU64,
    averages: Mutex<RollingAverages>,
    providers: Mutex<IndexMap<String, ProviderStats>>,
    alpha: f64,
}

impl MetricsCollector {
    pub fn new(alpha: f64) -> Self {
        Self {
            total: AtomicU64::new(0),
            successful: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            cache_hits: AtomicU64::new(0),
            fallbacks: AtomicU64::new(0),
            averages: Mutex::new(RollingAverages::default()),
            providers: Mutex::new(IndexMap::new()),
            alpha: alpha.clamp(f64::EPSILON, 1.0),
        }
    }

    pub fn record_rejection(&self) {
        self.total.fetch_add(1, Ordering::Relaxed);
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_success(&self, latency: Duration, confidence: f32, cache_hit: bool, fallback: bool) {
        self.total.fetch_add(1, Ordering::Relaxed);
        self.successful.fetch_add(1, Ordering::Relaxed);
        if cache_hit {
            self.cache_hits.fetch_add(1, Ordering::Relaxed);
        }
        if fallback {
            self.fallbacks.fetch_add(1, Ordering::Relaxed);
        }

        let mut averages = self.averages.lock();
        averages.latency_ms = Some(Self::update_ewma(
            averages.latency_ms,
            latency.as_secs_f64() * 1000.0,
            self.alpha,
        ));
        averages.confidence = Some(Self::update_ewma(
            averages.confidence,
            confidence as f64,
            self.alpha,
        ));
    }

    pub fn record_failure(&self, latency: Duration) {
        self.total.fetch_add(1, Ordering::Relaxed);
        self.failed.fetch_add(1, Ordering::Relaxed);

        let mut averages = self.averages.lock();
        averages.latency_ms = Some(Self::update_ewma(
            averages.latency_ms,
            latency.as_secs_f64() * 1000.0,
            self.alpha,
        ));
    }

    pub fn record_provider_call(&self, provider: &str, latency: Duration, outcome: ProviderCallOutcome) {
        let mut providers = self.providers.lock();
        let stats = providers.entry(provider.to_string()).or_default();
        let latency_ms = latency.as_secs_f64() * 1000.0;
        stats.average_latency_ms = if stats.calls == 0 {
            latency_ms
        } else {
            Self::update_ewma(Some(stats.average_latency_ms), latency_ms, self.alpha)
        };
        stats.calls += 1;
        match outcome {
            ProviderCallOutcome::Success => {}
            ProviderCallOutcome::Failure => stats.failures += 1,
            ProviderCallOutcome::Timeout => stats.timeouts += 1,
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let total = self.total.load(Ordering::Relaxed);
        let successful = self.successful.load(Ordering::Relaxed);
        let averages = self.averages.lock();
        let error_rate = if total == 0 {
            0.0
        } else {
            1.0 - successful as f64 / total as f64
        };

        MetricsSnapshot {
            total_requests: total,
            successful_requests: successful,
            rejected_requests: self.rejected.load(Ordering::Relaxed),
            failed_requests: self.failed.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            fallbacks: self.fallbacks.load(Ordering::Relaxed),
            average_latency_ms: averages.latency_ms.unwrap_or(0.0),
            average_confidence: averages.confidence.unwrap_or(0.0),
            error_rate,
            providers: self.providers.lock().clone(),
        }
    }

    // The first sample seeds the average instead of being pulled toward zero
    fn update_ewma(current: Option<f64>, sample: f64, alpha: f64) -> f64 {
        match current {
            Some(current) => current * (1.0 - alpha) + sample * alpha,
            None => sample,
        }
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new(0.1)
    }
}
