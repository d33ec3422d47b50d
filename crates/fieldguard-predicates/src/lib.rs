//! # fieldguard predicates
//!
//! The built-in predicate library used by `fieldguard` validation and
//! sanitizer chains.
//!
//! Every entry is a plain function looked up by name:
//!
//! - checks (`is_int`, `is_email`, `contains`, ...) take the string-coerced
//!   field value plus positional JSON arguments and return `bool`;
//! - transforms (`to_int`, `trim`, `escape`, ...) take the raw JSON value plus
//!   positional arguments and return the replacement value.
//!
//! ## Example
//!
//! ```rust
//! use fieldguard_predicates::{checks, transforms};
//! use serde_json::json;
//!
//! assert!(checks::is_int("42", &[]));
//! assert!(!checks::is_int("12a", &[]));
//! assert!(checks::is_length("abc", &[json!(3), json!(3)]));
//!
//! assert_eq!(transforms::trim(&json!("  hi  "), &[]), json!("hi"));
//! ```

pub mod checks;
pub mod coerce;
pub mod transforms;

use serde_json::Value;

pub use coerce::{is_truthy, to_text};

/// Signature of a check: coerced value, positional arguments.
pub type CheckFn = fn(&str, &[Value]) -> bool;

/// Signature of a transform: raw value, positional arguments.
pub type TransformFn = fn(&Value, &[Value]) -> Value;

/// A named entry of the library.
#[derive(Debug, Clone, Copy)]
pub enum Entry {
    /// A boolean predicate over the coerced string value
    Check(CheckFn),
    /// A value transform
    Transform(TransformFn),
}

/// Every function the library exports, by name.
///
/// Consumers decide which names become validators and which become
/// sanitizers; the library itself does not classify them.
pub fn catalog() -> Vec<(&'static str, Entry)> {
    vec![
        // checks
        ("is_int", Entry::Check(checks::is_int)),
        ("is_float", Entry::Check(checks::is_float)),
        ("is_numeric", Entry::Check(checks::is_numeric)),
        ("is_alpha", Entry::Check(checks::is_alpha)),
        ("is_alphanumeric", Entry::Check(checks::is_alphanumeric)),
        ("is_ascii", Entry::Check(checks::is_ascii)),
        ("is_email", Entry::Check(checks::is_email)),
        ("is_url", Entry::Check(checks::is_url)),
        ("is_ip", Entry::Check(checks::is_ip)),
        ("is_length", Entry::Check(checks::is_length)),
        ("is_empty", Entry::Check(checks::is_empty)),
        ("is_boolean", Entry::Check(checks::is_boolean)),
        ("is_uppercase", Entry::Check(checks::is_uppercase)),
        ("is_lowercase", Entry::Check(checks::is_lowercase)),
        ("is_hexadecimal", Entry::Check(checks::is_hexadecimal)),
        ("is_uuid", Entry::Check(checks::is_uuid)),
        ("is_json", Entry::Check(checks::is_json)),
        ("is_in", Entry::Check(checks::is_in)),
        ("contains", Entry::Check(checks::contains)),
        ("equals", Entry::Check(checks::equals)),
        ("matches", Entry::Check(checks::matches)),
        // transforms
        ("to_string", Entry::Transform(transforms::to_string)),
        ("to_int", Entry::Transform(transforms::to_int)),
        ("to_float", Entry::Transform(transforms::to_float)),
        ("to_boolean", Entry::Transform(transforms::to_boolean)),
        ("trim", Entry::Transform(transforms::trim)),
        ("ltrim", Entry::Transform(transforms::ltrim)),
        ("rtrim", Entry::Transform(transforms::rtrim)),
        ("escape", Entry::Transform(transforms::escape)),
        ("unescape", Entry::Transform(transforms::unescape)),
        ("strip_low", Entry::Transform(transforms::strip_low)),
        ("whitelist", Entry::Transform(transforms::whitelist)),
        ("blacklist", Entry::Transform(transforms::blacklist)),
        ("normalize_email", Entry::Transform(transforms::normalize_email)),
    ]
}
