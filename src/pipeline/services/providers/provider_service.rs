use super::adapter::ProviderAdapter;
use crate::pipeline::types::{AnalysisRequest, ProviderResult};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{BoxError, Service};

/// Tower service around a provider adapter so it can be layered with timeouts
#[derive(Clone)]
pub struct ProviderService {
    inner: Arc<dyn ProviderAdapter>,
}

impl ProviderService {
    pub fn new(inner: Arc<dyn ProviderAdapter>) -> Self {
        Self { inner }
    }
}

impl Service<Arc<AnalysisRequest>> for ProviderService {
    type Response = ProviderResult;
    type Error = BoxError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Arc<AnalysisRequest>) -> Self::Future {
        let inner = self.inner.clone();

        Box::pin(async move { inner.analyze(&req).await.map_err(Into::into) })
    }
}
