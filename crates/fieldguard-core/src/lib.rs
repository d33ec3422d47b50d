//! # fieldguard-core
//!
//! Chainable per-field validation and sanitization bound to an in-flight
//! HTTP request.
//!
//! A [`ValidatorLayer`] is configured once. For every request it installs a
//! [`Validation`] into the request's extensions; handlers use it to build
//! [`ValidationChain`]s and [`SanitizerChain`]s over fields of the params,
//! query, body, headers or files, then await
//! [`Validation::validation_errors`] to collect every failure, including the
//! ones decided by asynchronous validators.
//!
//! ```rust
//! use fieldguard_core::{RequestContext, ValidatorConfig, ValidatorLayer};
//! use serde_json::json;
//!
//! # fn block_on<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! let layer = ValidatorLayer::new(ValidatorConfig::default());
//! let ctx = RequestContext::new()
//!     .with_params(json!({"testparam": "42"}))
//!     .with_body(json!({"email": "  ADA@Example.com "}));
//!
//! block_on(layer.call(ctx, |ctx| async move {
//!     let validation = ctx.validation().unwrap();
//!     validation.sanitize_body("email").trim().normalize_email();
//!     validation.check("email").is_email();
//!     validation.check("testparam").fail_message("not an int").not_empty().is_int();
//!
//!     assert_eq!(validation.validation_errors(false).await.unwrap(), None);
//! }));
//! ```
//!
//! ## Feature Flags
//!
//! - `tracing` (default): emit `tracing` events for layer setup, chain
//!   construction, predicate calls and faults

#[macro_use]
mod tracing_macros;

pub mod chain;
pub mod collector;
pub mod config;
pub mod context;
pub mod error;
pub mod layer;
pub mod locator;
pub mod path;
pub mod registry;
pub mod sanitizer;
pub mod schema;
pub mod validation;

pub use chain::{OptionalOptions, ValidationChain, DEFAULT_MESSAGE};
pub use collector::{
    default_formatter, ErrorCollector, ErrorFormatter, ErrorRecord, ValidationErrors,
};
pub use config::{ValidatorConfig, ValidatorConfigBuilder, ValidatorOptions};
pub use context::{Location, RequestContext, Section, Sections};
pub use error::{BoxError, Result, ValidatorError};
pub use layer::{ValidatorLayer, ValidatorService};
pub use locator::locate;
pub use path::{format_param_output, FieldPath, Segment};
pub use registry::{
    AsyncValidator, BoxFuture, Input, PredicateRegistry, SanitizerFn, ValidatorFn, Verdict,
};
pub use sanitizer::SanitizerChain;
pub use schema::{FieldSchema, RuleSpec, Schema, SCHEMA_DEFAULT_MESSAGE};
pub use validation::Validation;

// Re-exported for custom validator implementations
pub use async_trait::async_trait;
