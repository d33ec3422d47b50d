//! The per-request validation API.

use crate::chain::{ChainEnv, ValidationChain};
use crate::collector::{ErrorCollector, ErrorFormatter, ErrorRecord, ValidationErrors};
use crate::context::{Location, Sections};
use crate::error::Result;
use crate::locator::locate;
use crate::path::FieldPath;
use crate::registry::PredicateRegistry;
use crate::sanitizer::SanitizerChain;
use crate::schema::Schema;
use std::sync::Arc;

const REFERRER: &str = "referrer";
const REFERER: &str = "referer";

/// Validation entry points bound to one request.
///
/// Installed into the request's extensions by
/// [`ValidatorLayer`](crate::ValidatorLayer); every clone shares the same
/// error collector.
///
/// ```rust
/// use fieldguard_core::{RequestContext, ValidatorLayer};
/// use serde_json::json;
///
/// # block_on(async {
/// let layer = ValidatorLayer::default();
/// let mut ctx = RequestContext::new().with_body(json!({"age": "ten"}));
/// layer.install(&mut ctx);
///
/// let validation = ctx.validation().unwrap();
/// validation.check("age").fail_message("age must be a number").is_int();
///
/// let errors = validation.validation_errors(false).await.unwrap().unwrap();
/// assert_eq!(errors.len(), 1);
/// # });
/// # fn block_on<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
/// # }
/// ```
#[derive(Clone)]
pub struct Validation {
    env: ChainEnv,
    formatter: ErrorFormatter,
}

impl Validation {
    pub(crate) fn new(
        registry: Arc<PredicateRegistry>,
        formatter: ErrorFormatter,
        sections: Sections,
        fail_fast: bool,
    ) -> Self {
        Self {
            env: ChainEnv {
                registry,
                collector: ErrorCollector::new(),
                sections,
                fail_fast,
            },
            formatter,
        }
    }

    fn chain(&self, path: FieldPath, location: Option<Location>) -> ValidationChain {
        ValidationChain::new(path, location, self.env.clone())
    }

    fn sanitizer(&self, path: FieldPath, locations: &[Location]) -> SanitizerChain {
        SanitizerChain::new(
            path,
            locations,
            Arc::clone(&self.env.registry),
            self.env.collector.clone(),
            self.env.sections.clone(),
        )
    }

    /// Validate a field wherever it is found: truthy params, then query,
    /// then body.
    pub fn check(&self, field: impl Into<FieldPath>) -> ValidationChain {
        let path = field.into();
        let location = locate(&self.env.sections, &path);
        self.chain(path, location)
    }

    /// Alias of [`check`](Self::check).
    pub fn assert(&self, field: impl Into<FieldPath>) -> ValidationChain {
        self.check(field)
    }

    /// Alias of [`check`](Self::check).
    pub fn validate(&self, field: impl Into<FieldPath>) -> ValidationChain {
        self.check(field)
    }

    pub fn check_body(&self, field: impl Into<FieldPath>) -> ValidationChain {
        self.chain(field.into(), Some(Location::Body))
    }

    pub fn check_params(&self, field: impl Into<FieldPath>) -> ValidationChain {
        self.chain(field.into(), Some(Location::Params))
    }

    pub fn check_query(&self, field: impl Into<FieldPath>) -> ValidationChain {
        self.chain(field.into(), Some(Location::Query))
    }

    /// Validate a header; `referrer` reads the `referer` header.
    pub fn check_headers(&self, field: impl Into<FieldPath>) -> ValidationChain {
        let path = field.into().aliased(REFERRER, REFERER);
        self.chain(path, Some(Location::Headers))
    }

    pub fn check_files(&self, field: impl Into<FieldPath>) -> ValidationChain {
        self.chain(field.into(), Some(Location::Files))
    }

    /// Validate with a schema; each field is located like [`check`](Self::check)
    /// unless it declares `in`.
    pub fn check_schema(&self, schema: &Schema) {
        schema.validate(None, &self.env);
    }

    pub fn check_body_schema(&self, schema: &Schema) {
        schema.validate(Some(Location::Body), &self.env);
    }

    pub fn check_params_schema(&self, schema: &Schema) {
        schema.validate(Some(Location::Params), &self.env);
    }

    pub fn check_query_schema(&self, schema: &Schema) {
        schema.validate(Some(Location::Query), &self.env);
    }

    /// Sanitize a field in body, params and query at once.
    pub fn sanitize(&self, field: impl Into<FieldPath>) -> SanitizerChain {
        self.sanitizer(field.into(), &Location::INPUTS)
    }

    /// Alias of [`sanitize`](Self::sanitize).
    pub fn filter(&self, field: impl Into<FieldPath>) -> SanitizerChain {
        self.sanitize(field)
    }

    pub fn sanitize_body(&self, field: impl Into<FieldPath>) -> SanitizerChain {
        self.sanitizer(field.into(), &[Location::Body])
    }

    pub fn sanitize_params(&self, field: impl Into<FieldPath>) -> SanitizerChain {
        self.sanitizer(field.into(), &[Location::Params])
    }

    pub fn sanitize_query(&self, field: impl Into<FieldPath>) -> SanitizerChain {
        self.sanitizer(field.into(), &[Location::Query])
    }

    /// Sanitize a header; `referrer` targets the `referer` header.
    pub fn sanitize_headers(&self, field: impl Into<FieldPath>) -> SanitizerChain {
        let path = field.into().aliased(REFERRER, REFERER);
        self.sanitizer(path, &[Location::Headers])
    }

    /// Every failure so far, as typed records.
    ///
    /// Awaits pending asynchronous checks first.
    pub async fn errors(&self) -> Result<Vec<ErrorRecord>> {
        self.env.collector.resolve().await
    }

    /// Every failure so far, formatted; `None` when there are none.
    ///
    /// With `mapped`, errors are keyed by param and a later failure of the
    /// same field replaces the earlier one.
    pub async fn validation_errors(&self, mapped: bool) -> Result<Option<ValidationErrors>> {
        let records = self.errors().await?;
        if records.is_empty() {
            return Ok(None);
        }
        Ok(Some(ValidationErrors::build(&records, mapped, &self.formatter)))
    }

    pub fn registry(&self) -> &PredicateRegistry {
        &self.env.registry
    }

    pub fn sections(&self) -> &Sections {
        &self.env.sections
    }
}

impl std::fmt::Debug for Validation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Validation")
            .field("collector", &self.env.collector)
            .field("fail_fast", &self.env.fail_fast)
            .finish()
    }
}
