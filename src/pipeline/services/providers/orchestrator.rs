use super::adapter::ProviderAdapter;
use super::degraded_analyzer::DegradedAnalyzer;
use super::metrics_layer::{ProviderMetrics, ProviderMetricsLayer};
use super::provider_service::ProviderService;
use crate::config::ProviderConfig;
use crate::error::ProviderError;
use crate::pipeline::services::metrics::{MetricsCollector, ProviderCallOutcome};
use crate::pipeline::types::{AnalysisRequest, ProviderOutcome, ProviderResult, ProviderStatus};
use futures::future::join_all;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower::timeout::error::Elapsed;
use tower::timeout::{Timeout, TimeoutLayer};
use tower::util::Either;
use tower::{BoxError, ServiceBuilder, ServiceExt};
use tracing::{debug, info, instrument, warn};

// metrics -> optional timeout -> adapter
type ProviderStack = ProviderMetrics<Either<Timeout<ProviderService>, ProviderService>>;

struct ProviderSlot {
    name: String,
    adapter: Arc<dyn ProviderAdapter>,
    service: ProviderStack,
}

/// Everything the providers produced for one request
#[derive(Debug, Clone)]
pub struct Orchestration {
    /// Successful results in configuration order
    pub results: Vec<ProviderResult>,
    /// One entry per configured provider, in configuration order
    pub outcomes: Vec<ProviderOutcome>,
    /// True when no provider succeeded and the degraded analyzer answered
    pub fallback: bool,
}

/// Fans a validated request out to every configured provider in parallel
pub struct ProviderOrchestrator {
    slots: Vec<ProviderSlot>,
    degraded: DegradedAnalyzer,
    timeout: Option<Duration>,
    default_confidence: f32,
    metrics: Arc<MetricsCollector>,
}

impl ProviderOrchestrator {
    pub fn new(
        adapters: Vec<Arc<dyn ProviderAdapter>>,
        config: &ProviderConfig,
        metrics: Arc<MetricsCollector>,
    ) -> Self {
        let timeout = config.timeout();
        let slots = adapters
            .into_iter()
            .map(|adapter| {
                let name = adapter.name().to_string();
                let service = ServiceBuilder::new()
                    .layer(ProviderMetricsLayer::new(name.clone(), Arc::clone(&metrics)))
                    .option_layer(timeout.map(TimeoutLayer::new))
                    .service(ProviderService::new(Arc::clone(&adapter)));
                ProviderSlot {
                    name,
                    adapter,
                    service,
                }
            })
            .collect();

        Self {
            slots,
            degraded: DegradedAnalyzer::new(config.fallback_confidence),
            timeout,
            default_confidence: config.default_confidence,
            metrics,
        }
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.slots.iter().map(|slot| slot.name.as_str()).collect()
    }

    #[instrument(skip(self, request), fields(providers = self.slots.len()))]
    pub async fn orchestrate(&self, request: Arc<AnalysisRequest>) -> Orchestration {
        // One task per provider so a panicking or stalled adapter stays isolated
        let handles: Vec<_> = self
            .slots
            .iter()
            .map(|slot| {
                let service = slot.service.clone();
                let request = Arc::clone(&request);
                tokio::spawn(async move {
                    let started = Instant::now();
                    let result = service.oneshot(request).await;
                    (result, started.elapsed())
                })
            })
            .collect();

        let mut results = Vec::with_capacity(self.slots.len());
        let mut outcomes = Vec::with_capacity(self.slots.len());

        for (slot, joined) in self.slots.iter().zip(join_all(handles).await) {
            match joined {
                Ok((Ok(mut result), latency)) => {
                    let confidence = result.effective_confidence(self.default_confidence);
                    result.provider = slot.name.clone();
                    result.confidence = Some(confidence);
                    debug!(
                        "Provider '{}' succeeded with confidence {:.2}",
                        slot.name, confidence
                    );
                    outcomes.push(ProviderOutcome::succeeded(&slot.name, confidence, latency));
                    results.push(result);
                }
                Ok((Err(err), latency)) => {
                    let error = self.classify(&slot.name, err);
                    let status = if error.is_timeout() {
                        ProviderStatus::TimedOut
                    } else {
                        ProviderStatus::Failed
                    };
                    warn!("{}", error);
                    outcomes.push(ProviderOutcome::failed(
                        &slot.name,
                        status,
                        error.to_string(),
                        latency,
                    ));
                }
                Err(join_error) => {
                    let error = ProviderError::Panicked {
                        provider: slot.name.clone(),
                    };
                    warn!("{}: {}", error, join_error);
                    self.metrics.record_provider_call(
                        &slot.name,
                        Duration::ZERO,
                        ProviderCallOutcome::Failure,
                    );
                    outcomes.push(ProviderOutcome::failed(
                        &slot.name,
                        ProviderStatus::Failed,
                        error.to_string(),
                        Duration::ZERO,
                    ));
                }
            }
        }

        let fallback = results.is_empty();
        if fallback {
            warn!(
                "All {} providers failed, using degraded local analysis",
                self.slots.len()
            );
            results.push(self.degraded.analyze(&request));
        } else {
            info!(
                "{} of {} providers succeeded",
                results.len(),
                self.slots.len()
            );
        }

        Orchestration {
            results,
            outcomes,
            fallback,
        }
    }

    /// Runs every adapter's initialize hook. A failing adapter stays configured.
    pub async fn initialize(&self) -> Vec<ProviderError> {
        let mut failures = Vec::new();
        for slot in &self.slots {
            if let Err(e) = slot.adapter.initialize().await {
                warn!("Provider '{}' failed to initialize: {}", slot.name, e);
                failures.push(e);
            }
        }
        failures
    }

    pub async fn shutdown(&self) {
        join_all(self.slots.iter().map(|slot| slot.adapter.shutdown())).await;
    }

    fn classify(&self, provider: &str, err: BoxError) -> ProviderError {
        if err.is::<Elapsed>() {
            return ProviderError::Timeout {
                provider: provider.to_string(),
                after_ms: self.timeout.map(|t| t.as_millis() as u64).unwrap_or(0),
            };
        }
        match err.downcast::<ProviderError>() {
            Ok(error) => *error,
            Err(other) => ProviderError::backend(provider, other.to_string()),
        }
    }
}
