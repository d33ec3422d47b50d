//! Value transforms used by sanitizer chains.
//!
//! Each transform coerces its input with [`to_text`] first, so numbers,
//! booleans and arrays are handled the same way as strings.

use crate::checks;
use crate::coerce::to_text;
use regex::Regex;
use serde_json::{Number, Value};
use std::sync::OnceLock;

static FLOAT_PREFIX_REGEX: OnceLock<Regex> = OnceLock::new();

fn text(value: &Value) -> String {
    to_text(Some(value))
}

fn arg(args: &[Value], index: usize) -> Option<String> {
    args.get(index).filter(|v| !v.is_null()).map(|v| to_text(Some(v)))
}

fn option_bool(args: &[Value], key: &str, default: bool) -> bool {
    args.first()
        .and_then(Value::as_object)
        .and_then(|o| o.get(key))
        .and_then(Value::as_bool)
        .unwrap_or(default)
}

fn float_value(f: f64) -> Value {
    Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
}

pub fn to_string(value: &Value, _args: &[Value]) -> Value {
    Value::String(text(value))
}

/// Leading-integer parse in the given radix (default 10); `null` when no
/// digits are found.
pub fn to_int(value: &Value, args: &[Value]) -> Value {
    let radix = args
        .first()
        .and_then(Value::as_u64)
        .filter(|r| (2..=36).contains(r))
        .unwrap_or(10) as u32;
    let input = text(value);
    let mut rest = input.trim_start();
    let negative = rest.starts_with('-');
    if negative || rest.starts_with('+') {
        rest = &rest[1..];
    }
    if radix == 16 {
        rest = rest
            .strip_prefix("0x")
            .or_else(|| rest.strip_prefix("0X"))
            .unwrap_or(rest);
    }

    let digits: String = rest.chars().take_while(|c| c.is_digit(radix)).collect();
    if digits.is_empty() {
        return Value::Null;
    }
    match i64::from_str_radix(&digits, radix) {
        Ok(n) => Value::from(if negative { -n } else { n }),
        Err(_) => Value::Null,
    }
}

/// Leading-float parse; `null` when no number prefix is found.
pub fn to_float(value: &Value, _args: &[Value]) -> Value {
    let input = text(value);
    let pattern = FLOAT_PREFIX_REGEX.get_or_init(|| {
        Regex::new(r"^[-+]?(?:[0-9]+\.?[0-9]*|\.[0-9]+)(?:[eE][-+]?[0-9]+)?")
            .expect("built-in pattern compiles")
    });
    pattern
        .find(input.trim_start())
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .map(float_value)
        .unwrap_or(Value::Null)
}

/// Truthy unless `"0"`, `"false"` or `""`; with a truthy first argument only
/// `"1"` and `"true"` are true.
pub fn to_boolean(value: &Value, args: &[Value]) -> Value {
    let input = text(value);
    let strict = args.first().map_or(false, |a| crate::is_truthy(Some(a)));
    if strict {
        Value::Bool(input == "1" || input == "true")
    } else {
        Value::Bool(input != "0" && input != "false" && !input.is_empty())
    }
}

fn strip_set(chars: &Option<String>) -> impl Fn(char) -> bool + '_ {
    move |c: char| match chars {
        Some(set) => set.contains(c),
        None => c.is_whitespace(),
    }
}

/// Strip both ends; the optional argument lists the characters to strip.
pub fn trim(value: &Value, args: &[Value]) -> Value {
    let chars = arg(args, 0);
    Value::String(text(value).trim_matches(strip_set(&chars)).to_string())
}

pub fn ltrim(value: &Value, args: &[Value]) -> Value {
    let chars = arg(args, 0);
    Value::String(text(value).trim_start_matches(strip_set(&chars)).to_string())
}

pub fn rtrim(value: &Value, args: &[Value]) -> Value {
    let chars = arg(args, 0);
    Value::String(text(value).trim_end_matches(strip_set(&chars)).to_string())
}

/// HTML-escape `& " ' < > / \` and the backtick.
pub fn escape(value: &Value, _args: &[Value]) -> Value {
    let input = text(value);
    let mut output = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => output.push_str("&amp;"),
            '"' => output.push_str("&quot;"),
            '\'' => output.push_str("&#x27;"),
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            '/' => output.push_str("&#x2F;"),
            '\\' => output.push_str("&#x5C;"),
            '`' => output.push_str("&#96;"),
            _ => output.push(c),
        }
    }
    Value::String(output)
}

pub fn unescape(value: &Value, _args: &[Value]) -> Value {
    let output = text(value)
        .replace("&quot;", "\"")
        .replace("&#x27;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&#x2F;", "/")
        .replace("&#x5C;", "\\")
        .replace("&#96;", "`")
        .replace("&amp;", "&");
    Value::String(output)
}

/// Remove ASCII control characters; a truthy argument keeps `\n` and `\r`.
pub fn strip_low(value: &Value, args: &[Value]) -> Value {
    let keep_new_lines = args.first().map_or(false, |a| crate::is_truthy(Some(a)));
    let output = text(value)
        .chars()
        .filter(|&c| {
            let low = c < '\u{20}' || c == '\u{7f}';
            !low || (keep_new_lines && (c == '\n' || c == '\r'))
        })
        .collect();
    Value::String(output)
}

/// Keep only the characters listed in the first argument.
pub fn whitelist(value: &Value, args: &[Value]) -> Value {
    let allowed = arg(args, 0).unwrap_or_default();
    Value::String(text(value).chars().filter(|c| allowed.contains(*c)).collect())
}

/// Drop the characters listed in the first argument.
pub fn blacklist(value: &Value, args: &[Value]) -> Value {
    let denied = arg(args, 0).unwrap_or_default();
    Value::String(text(value).chars().filter(|c| !denied.contains(*c)).collect())
}

/// Canonical form of an email address, or `false` when the input is not one.
///
/// Domains are lower-cased; local parts too unless
/// `{"all_lowercase": false}`. Gmail addresses lose dots and `+tags` and map
/// `googlemail.com` onto `gmail.com`.
pub fn normalize_email(value: &Value, args: &[Value]) -> Value {
    let input = text(value);
    if !checks::is_email(&input, &[]) {
        return Value::Bool(false);
    }
    let Some((local, domain)) = input.rsplit_once('@') else {
        return Value::Bool(false);
    };
    let mut domain = domain.to_lowercase();
    let mut local = local.to_string();

    if domain == "gmail.com" || domain == "googlemail.com" {
        local = local
            .split('+')
            .next()
            .unwrap_or_default()
            .replace('.', "")
            .to_lowercase();
        domain = "gmail.com".to_string();
    } else if option_bool(args, "all_lowercase", true) {
        local = local.to_lowercase();
    }

    Value::String(format!("{local}@{domain}"))
}
