//! Boolean checks over the string-coerced field value.
//!
//! Arguments follow the positional convention of the chain call: options
//! objects such as `{"min": 2, "max": 10}` come first where a check accepts
//! them.

use crate::coerce::to_text;
use regex::{Regex, RegexBuilder};
use serde_json::Value;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::OnceLock;
use validator::{ValidateEmail, ValidateUrl};

static INT_REGEX: OnceLock<Regex> = OnceLock::new();
static INT_LEADING_ZEROES_REGEX: OnceLock<Regex> = OnceLock::new();
static FLOAT_REGEX: OnceLock<Regex> = OnceLock::new();
static NUMERIC_REGEX: OnceLock<Regex> = OnceLock::new();
static ALPHA_REGEX: OnceLock<Regex> = OnceLock::new();
static ALPHANUMERIC_REGEX: OnceLock<Regex> = OnceLock::new();
static HEX_REGEX: OnceLock<Regex> = OnceLock::new();
static UUID_REGEX: OnceLock<Regex> = OnceLock::new();

fn cached(lock: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    lock.get_or_init(|| Regex::new(pattern).expect("built-in pattern compiles"))
}

fn options(args: &[Value]) -> Option<&serde_json::Map<String, Value>> {
    args.first().and_then(Value::as_object)
}

fn option_f64(args: &[Value], key: &str) -> Option<f64> {
    options(args)?.get(key).and_then(number_like)
}

fn option_bool(args: &[Value], key: &str, default: bool) -> bool {
    options(args)
        .and_then(|o| o.get(key))
        .and_then(Value::as_bool)
        .unwrap_or(default)
}

fn number_like(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn arg_text(args: &[Value], index: usize) -> String {
    to_text(args.get(index))
}

fn within_bounds(n: f64, args: &[Value]) -> bool {
    option_f64(args, "min").map_or(true, |min| n >= min)
        && option_f64(args, "max").map_or(true, |max| n <= max)
        && option_f64(args, "lt").map_or(true, |lt| n < lt)
        && option_f64(args, "gt").map_or(true, |gt| n > gt)
}

/// Integer, optionally bounded by `min`/`max`/`lt`/`gt`.
///
/// Leading zeroes are accepted unless `{"allow_leading_zeroes": false}`.
pub fn is_int(value: &str, args: &[Value]) -> bool {
    let pattern = if option_bool(args, "allow_leading_zeroes", true) {
        cached(&INT_LEADING_ZEROES_REGEX, r"^[-+]?[0-9]+$")
    } else {
        cached(&INT_REGEX, r"^[-+]?(?:0|[1-9][0-9]*)$")
    };
    if !pattern.is_match(value) {
        return false;
    }
    value.parse::<f64>().map_or(false, |n| within_bounds(n, args))
}

/// Decimal or exponent notation, optionally bounded.
pub fn is_float(value: &str, args: &[Value]) -> bool {
    if matches!(value, "" | "." | "-" | "+") {
        return false;
    }
    let pattern = cached(
        &FLOAT_REGEX,
        r"^[-+]?(?:[0-9]+)?(?:\.[0-9]*)?(?:[eE][-+]?[0-9]+)?$",
    );
    if !pattern.is_match(value) {
        return false;
    }
    value.parse::<f64>().map_or(false, |n| within_bounds(n, args))
}

pub fn is_numeric(value: &str, _args: &[Value]) -> bool {
    cached(&NUMERIC_REGEX, r"^[-+]?(?:[0-9]*\.)?[0-9]+$").is_match(value)
}

pub fn is_alpha(value: &str, _args: &[Value]) -> bool {
    cached(&ALPHA_REGEX, r"^[A-Za-z]+$").is_match(value)
}

pub fn is_alphanumeric(value: &str, _args: &[Value]) -> bool {
    cached(&ALPHANUMERIC_REGEX, r"^[0-9A-Za-z]+$").is_match(value)
}

pub fn is_ascii(value: &str, _args: &[Value]) -> bool {
    value.is_ascii()
}

pub fn is_email(value: &str, _args: &[Value]) -> bool {
    value.to_string().validate_email()
}

pub fn is_url(value: &str, _args: &[Value]) -> bool {
    value.to_string().validate_url()
}

/// IP address; an optional first argument of `4` or `6` pins the version.
pub fn is_ip(value: &str, args: &[Value]) -> bool {
    match arg_text(args, 0).as_str() {
        "4" => value.parse::<Ipv4Addr>().is_ok(),
        "6" => value.parse::<Ipv6Addr>().is_ok(),
        _ => value.parse::<IpAddr>().is_ok(),
    }
}

/// Character count within bounds.
///
/// Accepts either an options object (`{"min": 1, "max": 5}`) or the
/// positional form `min, max`.
pub fn is_length(value: &str, args: &[Value]) -> bool {
    let (min, max) = match args.first() {
        Some(Value::Object(_)) => (option_f64(args, "min"), option_f64(args, "max")),
        _ => (
            args.first().and_then(number_like),
            args.get(1).and_then(number_like),
        ),
    };
    let len = value.chars().count() as f64;
    min.map_or(true, |min| len >= min) && max.map_or(true, |max| len <= max)
}

/// Empty string; `{"ignore_whitespace": true}` trims first.
pub fn is_empty(value: &str, args: &[Value]) -> bool {
    if option_bool(args, "ignore_whitespace", false) {
        value.trim().is_empty()
    } else {
        value.is_empty()
    }
}

pub fn is_boolean(value: &str, _args: &[Value]) -> bool {
    matches!(value, "true" | "false" | "1" | "0")
}

pub fn is_uppercase(value: &str, _args: &[Value]) -> bool {
    value == value.to_uppercase()
}

pub fn is_lowercase(value: &str, _args: &[Value]) -> bool {
    value == value.to_lowercase()
}

pub fn is_hexadecimal(value: &str, _args: &[Value]) -> bool {
    cached(&HEX_REGEX, r"^(?:0[xXhH])?[0-9A-Fa-f]+$").is_match(value)
}

pub fn is_uuid(value: &str, _args: &[Value]) -> bool {
    cached(
        &UUID_REGEX,
        r"^[0-9A-Fa-f]{8}-[0-9A-Fa-f]{4}-[0-9A-Fa-f]{4}-[0-9A-Fa-f]{4}-[0-9A-Fa-f]{12}$",
    )
    .is_match(value)
}

/// JSON document whose top level is an object or an array.
pub fn is_json(value: &str, _args: &[Value]) -> bool {
    serde_json::from_str::<Value>(value)
        .map(|parsed| parsed.is_object() || parsed.is_array())
        .unwrap_or(false)
}

/// Membership in the first argument: an array of allowed values, the keys of
/// an object, or a substring of a string.
pub fn is_in(value: &str, args: &[Value]) -> bool {
    match args.first() {
        Some(Value::Array(allowed)) => allowed.iter().any(|a| to_text(Some(a)) == value),
        Some(Value::Object(map)) => map.contains_key(value),
        Some(Value::String(s)) => s.contains(value),
        _ => false,
    }
}

pub fn contains(value: &str, args: &[Value]) -> bool {
    value.contains(&arg_text(args, 0))
}

pub fn equals(value: &str, args: &[Value]) -> bool {
    value == arg_text(args, 0)
}

/// Regex match; the optional second argument carries modifiers (`"i"`).
///
/// A pattern that fails to compile never matches.
pub fn matches(value: &str, args: &[Value]) -> bool {
    let pattern = arg_text(args, 0);
    let modifiers = arg_text(args, 1);
    RegexBuilder::new(&pattern)
        .case_insensitive(modifiers.contains('i'))
        .multi_line(modifiers.contains('m'))
        .build()
        .map(|re| re.is_match(value))
        .unwrap_or(false)
}
