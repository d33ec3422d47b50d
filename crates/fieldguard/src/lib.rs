//! # fieldguard
//!
//! Request validation and sanitization middleware.
//!
//! Configure a [`ValidatorLayer`] once, stack it in front of your handlers,
//! and every request gets a fresh [`Validation`] in its extensions. Handlers
//! describe each field as a chain of named checks, optionally rewrite inputs
//! with sanitizers, then await one aggregated error list.
//!
//! ## Quick Start
//!
//! ```rust
//! use fieldguard::prelude::*;
//! use serde_json::json;
//!
//! # fn block_on<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! let layer = ValidatorLayer::new(
//!     ValidatorConfig::builder()
//!         .custom_validator("is_even", |input| {
//!             input.text().parse::<i64>().map_or(false, |n| n % 2 == 0)
//!         })
//!         .build(),
//! );
//!
//! let ctx = RequestContext::new().with_query(json!({"page": "3"}));
//! let errors = block_on(layer.call(ctx, |ctx| async move {
//!     let validation = ctx.validation().unwrap();
//!     validation
//!         .check_query("page")
//!         .is_int()
//!         .apply("is_even", &[])
//!         .with_message("page must be even");
//!     validation.validation_errors(false).await.unwrap()
//! }));
//!
//! assert_eq!(
//!     errors.unwrap().into_value(),
//!     json!([{"param": "page", "msg": "page must be even", "value": "3"}])
//! );
//! ```
//!
//! ## Schemas
//!
//! The same rules can be declared as data, e.g. loaded from JSON:
//!
//! ```rust
//! use fieldguard::Schema;
//! use serde_json::json;
//!
//! let schema = Schema::from_value(json!({
//!     "email": { "in": "body", "isEmail": { "errorMessage": "bad email" } },
//!     "page": { "optional": true, "isInt": { "options": [{ "min": 1 }] } }
//! }))
//! .unwrap();
//! assert_eq!(schema.len(), 2);
//! ```
//!
//! ## Optional Features
//!
//! - `tracing` (default): structured `tracing` events from the engine

pub use fieldguard_core::*;

/// The built-in check and transform library
pub use fieldguard_predicates as predicates;

// JSON values for handlers and schemas
pub use serde_json;

/// Prelude module - import everything you need with `use fieldguard::prelude::*`
pub mod prelude {
    pub use fieldguard_core::{
        async_trait,
        format_param_output,
        AsyncValidator,
        BoxError,
        // Errors
        ErrorRecord,
        FieldPath,
        FieldSchema,
        Input,
        Location,
        OptionalOptions,
        // Request context
        RequestContext,
        Result,
        RuleSpec,
        SanitizerChain,
        Schema,
        Sections,
        // Validation API
        Validation,
        ValidationChain,
        ValidationErrors,
        // Configuration
        ValidatorConfig,
        ValidatorError,
        // Middleware
        ValidatorLayer,
        ValidatorOptions,
        Verdict,
    };

    // Re-export commonly used external types
    pub use serde_json::{json, Value};
    #[cfg(feature = "tracing")]
    pub use tracing::{debug, error, info, trace, warn};
}

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn prelude_imports_work() {
        let _: fn() -> Result<()> = || Ok(());
        let _ = ValidatorLayer::new(ValidatorConfig::default());
    }

    #[test]
    fn prelude_reexports_json() {
        let value: Value = json!({"page": "3"});
        assert_eq!(value, super::serde_json::json!({"page": "3"}));
    }

    #[cfg(feature = "tracing")]
    #[test]
    fn prelude_reexports_tracing_macros() {
        info!(layer = ?ValidatorLayer::default(), "layer built");
        debug!("debug event");
    }

    #[test]
    fn predicates_are_reachable() {
        assert!(super::predicates::checks::is_alpha("abc", &[]));
    }
}
