use super::events::PipelineEvent;
use crate::config::Configuration;
use crate::error::{AnalysisError, ValidationError};
use crate::pipeline::context::AnalysisContext;
use crate::pipeline::services::cache::{CacheKey, CacheStore};
use crate::pipeline::services::enrichment::ContextEnricher;
use crate::pipeline::services::fusion::ResultFuser;
use crate::pipeline::services::metrics::{MetricsCollector, MetricsSnapshot};
use crate::pipeline::services::providers::{Orchestration, ProviderAdapter, ProviderOrchestrator};
use crate::pipeline::services::semantics::SemanticAnalyzer;
use crate::pipeline::services::validation::ImageValidator;
use crate::pipeline::types::{AnalysisOptions, AnalysisResult, ImageSubmission};
use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;
use tokio::sync::broadcast;
use tower::Service;
use tracing::{debug, error, info, instrument, warn};

const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Entry point of the pipeline: validate, look up the cache, fan out to providers,
/// fuse, enrich, analyze and cache.
///
/// Cheap to clone; clones share the cache, metrics and providers.
#[derive(Clone)]
pub struct ImageAnalysisService {
    inner: Arc<ServiceInner>,
}

struct ServiceInner {
    validator: ImageValidator,
    cache: CacheStore<AnalysisResult>,
    orchestrator: ProviderOrchestrator,
    fuser: ResultFuser,
    enricher: ContextEnricher,
    semantics: SemanticAnalyzer,
    metrics: Arc<MetricsCollector>,
    events: broadcast::Sender<PipelineEvent>,
    shut_down: AtomicBool,
}

impl ImageAnalysisService {
    pub fn builder(configuration: Configuration) -> ImageAnalysisServiceBuilder {
        ImageAnalysisServiceBuilder::new(configuration)
    }

    /// Runs one analysis. `Err` is returned only when validation rejects the payload;
    /// every accepted payload yields exactly one result, possibly flagged as `error`
    /// or `fallback`.
    ///
    /// After [`shutdown`](Self::shutdown) no validation happens: every call, including
    /// one with an invalid payload, returns `Ok` with an `error` result. A request
    /// still waiting on providers when shutdown starts also ends with an `error`
    /// result and is never cached.
    pub async fn analyze(
        &self,
        payload: impl Into<Arc<[u8]>>,
        options: AnalysisOptions,
    ) -> Result<AnalysisResult, ValidationError> {
        self.run(payload.into(), options).await
    }

    #[instrument(skip_all, fields(size = payload.len()))]
    async fn run(
        &self,
        payload: Arc<[u8]>,
        options: AnalysisOptions,
    ) -> Result<AnalysisResult, ValidationError> {
        let inner = &self.inner;
        let start = Instant::now();

        if inner.shut_down.load(Ordering::Acquire) {
            warn!("Analysis requested after shutdown");
            let result = AnalysisResult::failed("Service has been shut down", Vec::new(), start.elapsed());
            self.complete(&result, start);
            return Ok(result);
        }

        let request = match inner.validator.validate(payload, options.normalized()) {
            Ok(request) => request,
            Err(e) => {
                warn!("Rejected image: {}", e);
                inner.metrics.record_rejection();
                self.emit(PipelineEvent::rejected(&e));
                return Err(e);
            }
        };
        debug!(
            "Validated {} image {}x{} ({} bytes)",
            request.format(),
            request.width(),
            request.height(),
            request.size()
        );

        let cache_key = CacheKey::derive(request.payload(), request.options());
        if !request.options().force_refresh {
            if let Some(cached) = inner.cache.get(&cache_key) {
                let result = cached.as_cache_hit(start.elapsed());
                info!("Cache hit for {}", cache_key);
                self.emit(PipelineEvent::CacheHit {
                    result_id: result.id,
                    cache_key: cache_key.to_string(),
                });
                self.complete(&result, start);
                return Ok(result);
            }
        }

        let context = AnalysisContext::new(request, cache_key, start);
        let orchestration = inner.orchestrator.orchestrate(Arc::clone(context.request())).await;
        self.report_providers(&orchestration, context.cache_key());
        let context = context.into_orchestrated(orchestration);

        if inner.shut_down.load(Ordering::Acquire) {
            warn!("Service shut down while providers were running, discarding their results");
            let result = context.into_failed("Service was shut down during analysis");
            self.complete(&result, start);
            return Ok(result);
        }

        let fused = match inner.fuser.fuse(context.provider_results()) {
            Ok(fused) => fused,
            Err(e) => {
                error!("Fusion invariant violated: {}", e);
                let result = context.into_failed(e.to_string());
                self.complete(&result, start);
                return Ok(result);
            }
        };
        let context = context.into_fused(fused);

        let enriched = inner.enricher.enrich(context.fused().clone(), context.request());
        let context = context.into_enriched(enriched);

        let domain = context.request().options().domain.clone();
        let semantics = inner.semantics.analyze(context.enriched(), domain.as_deref());
        let context = context.into_analyzed(semantics);

        let (result, cache_key) = context.into_result();
        if result.fallback {
            debug!("Not caching degraded result for {}", cache_key);
        } else {
            inner.cache.put(cache_key, result.clone());
        }

        info!(
            "Analysis {} finished in {:.1}ms with confidence {:.2}",
            result.id, result.metadata.processing_time_ms, result.summary.confidence
        );
        self.complete(&result, start);
        Ok(result)
    }

    /// Runs provider initialize hooks. Adapters that fail stay configured and
    /// simply fail their calls.
    pub async fn initialize(&self) -> Result<(), AnalysisError> {
        let failures = self.inner.orchestrator.initialize().await;
        let providers = self.provider_names();
        info!("Image analysis service initialized with providers {:?}", providers);
        self.emit(PipelineEvent::Initialized { providers });

        match failures.into_iter().next() {
            Some(first) => Err(first.into()),
            None => Ok(()),
        }
    }

    /// Stops accepting work, runs provider shutdown hooks and drops cached results.
    pub async fn shutdown(&self) {
        if self.inner.shut_down.swap(true, Ordering::AcqRel) {
            return;
        }
        self.inner.cache.close();
        self.inner.orchestrator.shutdown().await;
        info!("Image analysis service shut down");
        self.emit(PipelineEvent::ShutDown);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PipelineEvent> {
        self.inner.events.subscribe()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.inner.metrics.snapshot()
    }

    pub fn cache_len(&self) -> usize {
        self.inner.cache.len()
    }

    pub fn purge_expired(&self) -> usize {
        self.inner.cache.purge_expired()
    }

    pub fn provider_names(&self) -> Vec<String> {
        self.inner
            .orchestrator
            .provider_names()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    fn report_providers(&self, orchestration: &Orchestration, cache_key: &CacheKey) {
        for outcome in orchestration.outcomes.iter().filter(|o| !o.is_success()) {
            self.emit(PipelineEvent::ProviderFailed {
                provider: outcome.provider.clone(),
                status: outcome.status,
                error: outcome.error.clone(),
            });
        }
        if orchestration.fallback {
            self.emit(PipelineEvent::FallbackUsed {
                cache_key: cache_key.to_string(),
            });
        }
    }

    fn complete(&self, result: &AnalysisResult, start: Instant) {
        let latency = start.elapsed();
        if result.error {
            self.inner.metrics.record_failure(latency);
        } else {
            self.inner.metrics.record_success(
                latency,
                result.summary.confidence,
                result.metadata.cache_hit,
                result.fallback,
            );
        }
        self.emit(PipelineEvent::Completed {
            result_id: result.id,
            processing_time_ms: result.metadata.processing_time_ms,
            cache_hit: result.metadata.cache_hit,
            fallback: result.fallback,
            error: result.error,
        });
    }

    fn emit(&self, event: PipelineEvent) {
        // No subscribers is not an error
        let _ = self.inner.events.send(event);
    }
}

impl Service<ImageSubmission> for ImageAnalysisService {
    type Response = AnalysisResult;
    type Error = ValidationError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, submission: ImageSubmission) -> Self::Future {
        let service = self.clone();

        Box::pin(async move { service.run(submission.payload, submission.options).await })
    }
}

pub struct ImageAnalysisServiceBuilder {
    configuration: Configuration,
    providers: Vec<Arc<dyn ProviderAdapter>>,
    event_capacity: usize,
}

impl ImageAnalysisServiceBuilder {
    pub fn new(configuration: Configuration) -> Self {
        Self {
            configuration,
            providers: Vec::new(),
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }

    /// Adds a provider. Providers are queried and fused in the order they are added.
    pub fn provider(self, provider: impl ProviderAdapter + 'static) -> Self {
        self.shared_provider(Arc::new(provider))
    }

    pub fn shared_provider(mut self, provider: Arc<dyn ProviderAdapter>) -> Self {
        self.providers.push(provider);
        self
    }

    // Sets the lifecycle event buffer, this will override the default capacity.
    pub fn event_capacity(mut self, event_capacity: usize) -> Self {
        self.event_capacity = event_capacity.max(1);
        self
    }

    pub fn build(self) -> Result<ImageAnalysisService, AnalysisError> {
        let configuration = self.configuration;
        configuration.validate()?;

        let mut names = HashSet::new();
        for provider in &self.providers {
            if !names.insert(provider.name().to_string()) {
                return Err(AnalysisError::Configuration(format!(
                    "Duplicate provider name '{}'",
                    provider.name()
                )));
            }
        }

        let metrics = Arc::new(MetricsCollector::new(configuration.metrics.smoothing_alpha));
        let (events, _) = broadcast::channel(self.event_capacity);

        let inner = ServiceInner {
            validator: ImageValidator::new(configuration.validation.clone()),
            cache: CacheStore::new(configuration.cache.max_entries, configuration.cache.ttl()),
            orchestrator: ProviderOrchestrator::new(
                self.providers,
                &configuration.providers,
                Arc::clone(&metrics),
            ),
            fuser: ResultFuser::new(configuration.fusion.clone()),
            enricher: ContextEnricher::new(configuration.enrichment.clone()),
            semantics: SemanticAnalyzer::new(configuration.semantics.clone()),
            metrics,
            events,
            shut_down: AtomicBool::new(false),
        };

        Ok(ImageAnalysisService {
            inner: Arc::new(inner),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::services::providers::FALLBACK_PROVIDER;
    use crate::pipeline::test_support::{png_bytes, Behavior, ScriptedAdapter};
    use crate::pipeline::types::{
        AnalysisMode, DetailLevel, DetectedObject, Face, ProviderResult,
    };
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;
    use tower::ServiceExt;

    fn chair_result(provider: &str, confidence: f32) -> ProviderResult {
        ProviderResult::new(provider, "A wooden chair in a bright room")
            .with_object(DetectedObject::new("chair", confidence))
            .with_object(DetectedObject::new("floor", 0.6))
            .with_scene("living room")
            .with_confidence(confidence)
    }

    fn service_with(adapters: Vec<ScriptedAdapter>) -> (ImageAnalysisService, Vec<Arc<AtomicUsize>>) {
        let counters = adapters.iter().map(ScriptedAdapter::call_counter).collect();
        let builder = adapters.into_iter().fold(
            ImageAnalysisService::builder(Configuration::default().provider_timeout(Duration::from_millis(200))),
            |builder, adapter| builder.provider(adapter),
        );
        (builder.build().unwrap(), counters)
    }

    fn total_calls(counters: &[Arc<AtomicUsize>]) -> usize {
        counters.iter().map(|c| c.load(Ordering::SeqCst)).sum()
    }

    fn image() -> Vec<u8> {
        png_bytes(64, 48, [180, 120, 60])
    }

    #[tokio::test]
    async fn valid_request_produces_a_complete_result() {
        let (service, _) = service_with(vec![
            ScriptedAdapter::succeeding("vision-a", chair_result("vision-a", 0.91)),
            ScriptedAdapter::succeeding("vision-b", chair_result("vision-b", 0.93)),
        ]);

        let result = service.analyze(image(), AnalysisOptions::default()).await.unwrap();

        assert!(!result.error);
        assert!(!result.fallback);
        assert_eq!(result.summary.description, "A wooden chair in a bright room");
        assert_eq!(result.summary.top_objects, vec!["chair", "floor"]);
        assert_eq!(result.summary.scene_type, "living room");
        assert_eq!(result.metadata.providers_used, vec!["vision-a", "vision-b"]);
        assert_eq!(result.details.objects.iter().filter(|o| o.name == "chair").count(), 1);
        assert_eq!(result.semantics.context.setting, crate::pipeline::types::Setting::Indoor);
        let stages: Vec<_> = result.metadata.stage_timings_ms.keys().cloned().collect();
        assert_eq!(stages, vec!["orchestration", "fusion", "enrichment", "semantics"]);
    }

    #[tokio::test]
    async fn identical_requests_are_served_from_cache() {
        let (service, counters) = service_with(vec![ScriptedAdapter::succeeding(
            "vision-a",
            chair_result("vision-a", 0.8),
        )]);
        let options = AnalysisOptions::default()
            .with_domain("Real_Estate")
            .with_hint("locale", "en")
            .with_hint("camera", "phone");
        let reordered = AnalysisOptions::default()
            .with_hint("camera", "phone")
            .with_hint("locale", "en")
            .with_domain(" real_estate ");

        let first = service.analyze(image(), options).await.unwrap();
        let second = service.analyze(image(), reordered).await.unwrap();

        assert_eq!(total_calls(&counters), 1);
        assert!(!first.metadata.cache_hit);
        assert!(second.metadata.cache_hit);
        assert_ne!(first.id, second.id);
        assert_eq!(first.summary, second.summary);
        assert_eq!(first.details, second.details);

        let metrics = service.metrics();
        assert_eq!(metrics.total_requests, 2);
        assert_eq!(metrics.cache_hits, 1);
    }

    #[tokio::test]
    async fn different_options_miss_the_cache() {
        let (service, counters) = service_with(vec![ScriptedAdapter::succeeding(
            "vision-a",
            chair_result("vision-a", 0.8),
        )]);

        service.analyze(image(), AnalysisOptions::default()).await.unwrap();
        service
            .analyze(image(), AnalysisOptions::default().with_mode(AnalysisMode::Quick))
            .await
            .unwrap();

        assert_eq!(total_calls(&counters), 2);
        assert_eq!(service.cache_len(), 2);
    }

    #[tokio::test]
    async fn force_refresh_bypasses_lookup_but_refreshes_entry() {
        let (service, counters) = service_with(vec![ScriptedAdapter::succeeding(
            "vision-a",
            chair_result("vision-a", 0.8),
        )]);

        service.analyze(image(), AnalysisOptions::default()).await.unwrap();
        let refreshed = service
            .analyze(image(), AnalysisOptions::default().force_refresh(true))
            .await
            .unwrap();
        let cached = service.analyze(image(), AnalysisOptions::default()).await.unwrap();

        assert!(!refreshed.metadata.cache_hit);
        assert!(cached.metadata.cache_hit);
        assert_eq!(total_calls(&counters), 2);
        assert_eq!(service.cache_len(), 1);
    }

    #[tokio::test]
    async fn oversized_payload_is_rejected_without_provider_calls() {
        let adapter = ScriptedAdapter::succeeding("vision-a", chair_result("vision-a", 0.8));
        let counter = adapter.call_counter();
        let service = ImageAnalysisService::builder(Configuration::default().max_image_size(32))
            .provider(adapter)
            .build()
            .unwrap();
        let mut events = service.subscribe();
        let payload = image();
        let size = payload.len();

        let err = service.analyze(payload, AnalysisOptions::default()).await.unwrap_err();

        assert_eq!(err, ValidationError::PayloadTooLarge { size, max: 32 });
        assert_eq!(counter.load(Ordering::SeqCst), 0);
        assert_eq!(service.cache_len(), 0);
        assert_eq!(service.metrics().rejected_requests, 1);
        assert!(matches!(events.try_recv(), Ok(PipelineEvent::Rejected { .. })));
    }

    #[tokio::test]
    async fn unsupported_format_is_rejected() {
        let (service, counters) = service_with(vec![ScriptedAdapter::succeeding(
            "vision-a",
            chair_result("vision-a", 0.8),
        )]);

        let err = service
            .analyze(b"plain text, not an image".to_vec(), AnalysisOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, ValidationError::UnsupportedFormat(_)));
        assert_eq!(total_calls(&counters), 0);
    }

    #[tokio::test]
    async fn total_provider_failure_returns_uncached_fallback() {
        let (service, _) = service_with(vec![
            ScriptedAdapter::failing("vision-a"),
            ScriptedAdapter::new(
                "vision-b",
                Behavior::Sleep(Duration::from_secs(5), chair_result("vision-b", 0.9)),
            ),
            ScriptedAdapter::new("vision-c", Behavior::Panic),
        ]);
        let mut events = service.subscribe();

        let result = service.analyze(image(), AnalysisOptions::default()).await.unwrap();

        assert!(!result.error);
        assert!(result.fallback);
        assert!(!result.summary.description.is_empty());
        assert!(result.summary.confidence <= 0.1 + f32::EPSILON);
        assert_eq!(result.metadata.providers_used, vec![FALLBACK_PROVIDER]);
        assert_eq!(result.metadata.provider_outcomes.len(), 3);
        assert!(result.semantics.insights.contains(&"degraded-analysis".to_string()));
        assert_eq!(service.cache_len(), 0);
        assert_eq!(service.metrics().fallbacks, 1);

        let mut failed = 0;
        let mut fallback_seen = false;
        while let Ok(event) = events.try_recv() {
            match event {
                PipelineEvent::ProviderFailed { .. } => failed += 1,
                PipelineEvent::FallbackUsed { .. } => fallback_seen = true,
                _ => {}
            }
        }
        assert_eq!(failed, 3);
        assert!(fallback_seen);
    }

    #[tokio::test]
    async fn partial_failure_uses_surviving_providers() {
        let (service, _) = service_with(vec![
            ScriptedAdapter::failing("vision-a"),
            ScriptedAdapter::succeeding(
                "vision-b",
                ProviderResult::new("vision-b", "Two people smiling")
                    .with_face(Face::new(0.9).with_emotion("happy"))
                    .with_face(Face::new(0.8).with_emotion("happy")),
            ),
        ]);

        let result = service
            .analyze(image(), AnalysisOptions::default().with_domain("social"))
            .await
            .unwrap();

        assert!(!result.fallback);
        assert_eq!(result.metadata.providers_used, vec!["vision-b"]);
        assert_eq!(result.summary.mood, "happy");
        assert_eq!(result.semantics.domain, "social");
        assert!(result.semantics.insights.contains(&"people-present".to_string()));
        assert_eq!(service.cache_len(), 1);
    }

    #[tokio::test]
    async fn low_detail_limits_summary_objects() {
        let mut result = ProviderResult::new("vision-a", "A cluttered desk").with_confidence(0.7);
        for (i, name) in ["laptop", "mug", "pen", "lamp", "book"].iter().enumerate() {
            result = result.with_object(DetectedObject::new(*name, 0.9 - i as f32 * 0.1));
        }
        let (service, _) = service_with(vec![ScriptedAdapter::succeeding("vision-a", result)]);

        let low = service
            .analyze(image(), AnalysisOptions::default().with_detail(DetailLevel::Low))
            .await
            .unwrap();
        let high = service.analyze(image(), AnalysisOptions::default()).await.unwrap();

        assert_eq!(low.summary.top_objects, vec!["laptop", "mug", "pen"]);
        assert_eq!(high.summary.top_objects.len(), 5);
    }

    #[tokio::test]
    async fn low_detail_keeps_highest_confidence_detail_objects() {
        let mut result = ProviderResult::new("vision-a", "An office").with_confidence(0.7);
        for i in 0..11 {
            result = result.with_object(DetectedObject::new(format!("clutter{}", i), 0.2));
        }
        result = result.with_object(DetectedObject::new("laptop", 0.99));
        let (service, _) = service_with(vec![ScriptedAdapter::succeeding("vision-a", result)]);

        let low = service
            .analyze(image(), AnalysisOptions::default().with_detail(DetailLevel::Low))
            .await
            .unwrap();

        assert_eq!(low.summary.top_objects[0], "laptop");
        assert_eq!(low.details.objects.len(), 10);
        assert_eq!(low.details.objects[0].name, "laptop");
    }

    #[tokio::test]
    async fn shutdown_during_analysis_leaves_cache_empty() {
        let (service, _) = service_with(vec![ScriptedAdapter::new(
            "vision-a",
            Behavior::Sleep(Duration::from_millis(150), chair_result("vision-a", 0.8)),
        )]);

        let in_flight = {
            let service = service.clone();
            tokio::spawn(async move { service.analyze(image(), AnalysisOptions::default()).await })
        };
        tokio::time::sleep(Duration::from_millis(30)).await;
        service.shutdown().await;

        let result = in_flight.await.unwrap().unwrap();

        assert!(result.error);
        assert_eq!(result.metadata.provider_outcomes.len(), 1);
        assert_eq!(service.cache_len(), 0);
    }

    #[tokio::test]
    async fn shutdown_stops_analysis_and_clears_cache() {
        let adapter = ScriptedAdapter::succeeding("vision-a", chair_result("vision-a", 0.8));
        let (service, counters) = service_with(vec![adapter]);
        service.initialize().await.unwrap();
        service.analyze(image(), AnalysisOptions::default()).await.unwrap();
        assert_eq!(service.cache_len(), 1);

        let mut events = service.subscribe();
        service.shutdown().await;
        let result = service.analyze(image(), AnalysisOptions::default()).await.unwrap();

        assert!(result.error);
        assert!(result.error_message.is_some());
        assert_eq!(result.summary.mood, "neutral");
        assert_eq!(service.cache_len(), 0);
        assert_eq!(total_calls(&counters), 1);
        assert!(matches!(events.try_recv(), Ok(PipelineEvent::ShutDown)));
        assert_eq!(service.metrics().failed_requests, 1);
    }

    #[tokio::test]
    async fn concurrent_requests_each_get_one_result() {
        let (service, _) = service_with(vec![ScriptedAdapter::new(
            "vision-a",
            Behavior::Sleep(Duration::from_millis(20), chair_result("vision-a", 0.8)),
        )]);

        let handles: Vec<_> = (0..8u8)
            .map(|i| {
                let service = service.clone();
                tokio::spawn(async move {
                    service
                        .analyze(png_bytes(16, 16, [i * 20, 0, 0]), AnalysisOptions::default())
                        .await
                })
            })
            .collect();

        for handle in handles {
            let result = handle.await.unwrap().unwrap();
            assert!(!result.error);
        }
        assert_eq!(service.metrics().successful_requests, 8);
        assert_eq!(service.cache_len(), 8);
    }

    #[tokio::test]
    async fn tower_service_wraps_analyze() {
        let (service, _) = service_with(vec![ScriptedAdapter::succeeding(
            "vision-a",
            chair_result("vision-a", 0.8),
        )]);

        let result = service
            .clone()
            .oneshot(ImageSubmission::new(image(), AnalysisOptions::default()))
            .await
            .unwrap();

        assert!(!result.error);
        assert_eq!(service.cache_len(), 1);
    }

    #[test]
    fn duplicate_provider_names_are_rejected() {
        let result = ImageAnalysisService::builder(Configuration::default())
            .provider(ScriptedAdapter::failing("vision-a"))
            .provider(ScriptedAdapter::failing("vision-a"))
            .build();
        assert!(matches!(result, Err(AnalysisError::Configuration(_))));
    }

    #[test]
    fn invalid_configuration_is_rejected() {
        let result = ImageAnalysisService::builder(Configuration::default().max_fused_objects(0)).build();
        assert!(matches!(result, Err(AnalysisError::Configuration(_))));
    }
}
