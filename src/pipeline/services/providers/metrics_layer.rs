use crate::pipeline::services::metrics::{MetricsCollector, ProviderCallOutcome};
use crate::pipeline::types::{AnalysisRequest, ProviderResult};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;
use tower::timeout::error::Elapsed;
use tower::{BoxError, Service};
use tower_layer::Layer;
use tracing::debug;

/// Records latency and outcome of every call made through the wrapped provider service
#[derive(Clone)]
pub struct ProviderMetricsLayer {
    provider: Arc<str>,
    metrics: Arc<MetricsCollector>,
}

impl ProviderMetricsLayer {
    pub fn new(provider: impl Into<Arc<str>>, metrics: Arc<MetricsCollector>) -> Self {
        Self {
            provider: provider.into(),
            metrics,
        }
    }
}

impl<S> Layer<S> for ProviderMetricsLayer {
    type Service = ProviderMetrics<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ProviderMetrics {
            inner,
            provider: Arc::clone(&self.provider),
            metrics: Arc::clone(&self.metrics),
        }
    }
}

#[derive(Clone)]
pub struct ProviderMetrics<S> {
    inner: S,
    provider: Arc<str>,
    metrics: Arc<MetricsCollector>,
}

impl<S> Service<Arc<AnalysisRequest>> for ProviderMetrics<S>
where
    S: Service<Arc<AnalysisRequest>, Response = ProviderResult>,
    S::Error: Into<BoxError>,
    S::Future: Send + 'static,
{
    type Response = ProviderResult;
    type Error = BoxError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(Into::into)
    }

    fn call(&mut self, req: Arc<AnalysisRequest>) -> Self::Future {
        let start = Instant::now();
        let future = self.inner.call(req);
        let provider = Arc::clone(&self.provider);
        let metrics = Arc::clone(&self.metrics);

        Box::pin(async move {
            let result = future.await.map_err(Into::into);
            let outcome = match &result {
                Ok(_) => ProviderCallOutcome::Success,
                Err(e) if e.is::<Elapsed>() => ProviderCallOutcome::Timeout,
                Err(_) => ProviderCallOutcome::Failure,
            };
            let latency = start.elapsed();
            debug!(
                "Provider '{}' finished with {:?} in {}us",
                provider,
                outcome,
                latency.as_micros()
            );
            metrics.record_provider_call(&provider, latency, outcome);
            result
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ValidationConfig;
    use crate::pipeline::services::providers::ProviderService;
    use crate::pipeline::services::validation::ImageValidator;
    use crate::pipeline::test_support::{png_bytes, Behavior, ScriptedAdapter};
    use std::time::Duration;
    use tower::timeout::TimeoutLayer;
    use tower::{ServiceBuilder, ServiceExt};

    fn request() -> Arc<AnalysisRequest> {
        let validator = ImageValidator::new(ValidationConfig::default());
        Arc::new(
            validator
                .validate(png_bytes(8, 8, [0, 0, 0]).into(), Default::default())
                .unwrap(),
        )
    }

    #[tokio::test]
    async fn records_success_failure_and_timeout() {
        let metrics = Arc::new(MetricsCollector::default());

        let ok = ServiceBuilder::new()
            .layer(ProviderMetricsLayer::new("ok", Arc::clone(&metrics)))
            .service(ProviderService::new(Arc::new(ScriptedAdapter::succeeding(
                "ok",
                ProviderResult::new("ok", "fine"),
            ))));
        let failing = ServiceBuilder::new()
            .layer(ProviderMetricsLayer::new("failing", Arc::clone(&metrics)))
            .service(ProviderService::new(Arc::new(ScriptedAdapter::failing("failing"))));
        let slow = ServiceBuilder::new()
            .layer(ProviderMetricsLayer::new("slow", Arc::clone(&metrics)))
            .layer(TimeoutLayer::new(Duration::from_millis(10)))
            .service(ProviderService::new(Arc::new(ScriptedAdapter::new(
                "slow",
                Behavior::Sleep(Duration::from_secs(5), ProviderResult::new("slow", "late")),
            ))));

        assert!(ok.oneshot(request()).await.is_ok());
        assert!(failing.oneshot(request()).await.is_err());
        assert!(slow.oneshot(request()).await.is_err());

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.providers["ok"].calls, 1);
        assert_eq!(snapshot.providers["failing"].failures, 1);
        assert_eq!(snapshot.providers["slow"].timeouts, 1);
        assert_eq!(snapshot.providers["slow"].failures, 0);
    }
}
