//! The validation middleware.
//!
//! [`ValidatorLayer`] is built once from a [`ValidatorConfig`] and installs a
//! fresh [`Validation`] on every request it sees. It can be driven directly
//! with [`ValidatorLayer::call`] or stacked as a Tower layer.

use crate::collector::ErrorFormatter;
use crate::config::{ValidatorConfig, ValidatorOptions};
use crate::context::RequestContext;
use crate::registry::PredicateRegistry;
use crate::validation::Validation;
use std::future::Future;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};

/// Middleware factory installing the validation API on each request.
#[derive(Clone)]
pub struct ValidatorLayer {
    registry: Arc<PredicateRegistry>,
    formatter: ErrorFormatter,
    options: ValidatorOptions,
}

impl ValidatorLayer {
    pub fn new(config: ValidatorConfig) -> Self {
        let registry = config.registry();
        trace_info!(
            validators = registry.validator_count(),
            sanitizers = registry.sanitizer_count(),
            fail_fast = config.options().skip_validation_on_first_error,
            "validator layer configured"
        );
        Self {
            registry: Arc::new(registry),
            formatter: Arc::clone(config.formatter()),
            options: config.options().clone(),
        }
    }

    pub fn registry(&self) -> &PredicateRegistry {
        &self.registry
    }

    /// Put a fresh [`Validation`] into the request's extensions.
    ///
    /// Any previously installed one is replaced along with its errors.
    pub fn install(&self, ctx: &mut RequestContext) {
        let validation = Validation::new(
            Arc::clone(&self.registry),
            Arc::clone(&self.formatter),
            ctx.sections().clone(),
            self.options.skip_validation_on_first_error,
        );
        ctx.extensions_mut().insert(validation);
    }

    /// Install, then hand the request to `next`.
    pub async fn call<F, Fut, T>(&self, mut ctx: RequestContext, next: F) -> T
    where
        F: FnOnce(RequestContext) -> Fut,
        Fut: Future<Output = T>,
    {
        self.install(&mut ctx);
        next(ctx).await
    }
}

impl Default for ValidatorLayer {
    fn default() -> Self {
        Self::new(ValidatorConfig::default())
    }
}

impl std::fmt::Debug for ValidatorLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidatorLayer")
            .field("registry", &self.registry)
            .field("options", &self.options)
            .finish()
    }
}

impl<S> Layer<S> for ValidatorLayer {
    type Service = ValidatorService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ValidatorService {
            layer: self.clone(),
            inner,
        }
    }
}

/// Tower service produced by [`ValidatorLayer`].
#[derive(Clone, Debug)]
pub struct ValidatorService<S> {
    layer: ValidatorLayer,
    inner: S,
}

impl<S> Service<RequestContext> for ValidatorService<S>
where
    S: Service<RequestContext>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut ctx: RequestContext) -> Self::Future {
        self.layer.install(&mut ctx);
        self.inner.call(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::convert::Infallible;
    use tower::{service_fn, ServiceExt};

    #[tokio::test]
    async fn call_installs_before_next() {
        let layer = ValidatorLayer::default();
        let ctx = RequestContext::new().with_query(json!({"page": "x"}));

        let errors = layer
            .call(ctx, |ctx| async move {
                let validation = ctx.validation().unwrap();
                validation.check_query("page").is_int();
                validation.errors().await.unwrap()
            })
            .await;
        assert_eq!(errors.len(), 1);
    }

    #[tokio::test]
    async fn install_replaces_previous_collector() {
        let layer = ValidatorLayer::default();
        let mut ctx = RequestContext::new().with_body(json!({"n": "x"}));
        layer.install(&mut ctx);
        ctx.validation().unwrap().check("n").is_int();

        layer.install(&mut ctx);
        assert!(ctx.validation().unwrap().errors().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn tower_service_sees_a_fresh_validation_per_request() {
        let service = ValidatorLayer::default().layer(service_fn(|ctx: RequestContext| async move {
            let validation = ctx.validation().unwrap().clone();
            validation.check_body("n").is_int();
            Ok::<_, Infallible>(validation.errors().await.unwrap().len())
        }));

        for _ in 0..2 {
            let ctx = RequestContext::new().with_body(json!({"n": "x"}));
            let count = service.clone().oneshot(ctx).await.unwrap();
            assert_eq!(count, 1);
        }
    }
}
