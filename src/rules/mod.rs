//! Built-in rule library.
//!
//! Every rule is a pure function of `(value, parameter, field name, row)`
//! returning `Ok(None)` for valid input or `Ok(Some(message))` for a
//! failure. Malformed rule *parameters* (not data) raise [`SchemaError`].
//!
//! Rules are dispatched through an explicit name→function registry built
//! once at startup; a name that is missing from both the registry and the
//! custom provider is a configuration error, never a silent skip.
//!
//! Two conventions hold across the catalog:
//!
//! - every rule except `required` treats an absent or blank value as
//!   vacuously valid, so optional fields only fail when they carry data
//! - rules whose parameter is a simple on/off flag do nothing when the
//!   flag is off, so `{"email": false}` can disable an inherited rule
//!
//! Cross-field rules (`equalTo`, `require_from_group`) receive the entire
//! current row through [`RowContext`] and never consult ambient state.

use std::collections::HashMap;
use std::net::Ipv4Addr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::error::{SchemaError, SchemaResult};
use crate::value::{as_f64, as_string, is_blank, loose_eq, parse_datetime, truthy};

/// The full row being validated, passed to every rule invocation so
/// cross-field comparisons are pure functions of explicit input.
#[derive(Debug, Clone, Copy)]
pub struct RowContext<'a> {
    pub row: &'a serde_json::Map<String, Value>,
}

/// Signature shared by all built-in rules.
pub type RuleFn =
    fn(&Value, &Value, &str, &RowContext<'_>) -> SchemaResult<Option<String>>;

/// Look up a built-in rule by name.
pub(crate) fn lookup(name: &str) -> Option<RuleFn> {
    REGISTRY.get(name).copied()
}

static REGISTRY: Lazy<HashMap<&'static str, RuleFn>> = Lazy::new(|| {
    let mut m: HashMap<&'static str, RuleFn> = HashMap::new();
    m.insert("required", required);
    m.insert("minlength", minlength);
    m.insert("maxlength", maxlength);
    m.insert("rangelength", rangelength);
    m.insert("min", min);
    m.insert("max", max);
    m.insert("range", range);
    m.insert("array_range", array_range);
    m.insert("step", step);
    m.insert("email", email);
    m.insert("url", url);
    m.insert("date", date);
    m.insert("dateISO", date_iso);
    m.insert("number", number);
    m.insert("digits", digits);
    m.insert("equalTo", equal_to);
    m.insert("creditcard", creditcard);
    m.insert("phoneUS", phone_us);
    m.insert("require_from_group", require_from_group);
    m.insert("string", string);
    m.insert("bool", bool_rule);
    m.insert("exactlength", exactlength);
    m.insert("longitude", longitude);
    m.insert("latitude", latitude);
    m.insert("loginRegex", login_regex);
    m.insert("noInvalid", no_invalid);
    m.insert("domain", domain);
    m.insert("filename", filename);
    m.insert("validIP", valid_ip);
    m.insert("validIPList", valid_ip_list);
    m.insert("isUSstate", is_us_state);
    m.insert("timezone", timezone);
    m.insert("inArray", in_array);
    m.insert("isObject", is_object);
    m.insert("isArray", is_array);
    m.insert("isSequentialArray", is_sequential_array);
    m.insert("isSequentialIntArray", is_sequential_int_array);
    m.insert("isSequentialDigitArray", is_sequential_digit_array);
    m.insert("noServer", no_op);
    m.insert("remote", no_op);
    m
});

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9-]+(\.[A-Za-z0-9-]+)*\.[A-Za-z]{2,}$").expect("static regex"));
static DATE_ISO_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}[/-](0?[1-9]|1[012])[/-](0?[1-9]|[12]\d|3[01])$").expect("static regex"));
static LOGIN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^[a-z0-9._]+$").expect("static regex"));
static NO_INVALID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^[a-z0-9.,\-_()& ]+$").expect("static regex"));
static DOMAIN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^[a-z0-9_-]+$").expect("static regex"));
static SELECTOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:#(.+)|\[name=(.+)\])$").expect("static regex"));
static CREDITCARD_RES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"^4[0-9]{12}(?:[0-9]{3})?$",        // visa
        r"^5[1-5][0-9]{14}$",                // mastercard
        r"^3[47][0-9]{13}$",                 // amex
        r"^6(?:011|5[0-9]{2})[0-9]{12}$",    // discover
    ]
    .iter()
    .map(|p| Regex::new(p).expect("static regex"))
    .collect()
});

/// Postal abbreviations accepted by `isUSstate`, including territories and
/// armed-forces codes.
static US_STATES: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "AA", "AE", "AL", "AK", "AS", "AP", "AZ", "AR", "CA", "CO", "CT", "DE", "DC", "FM", "FL",
        "GA", "GU", "HI", "ID", "IL", "IN", "IA", "KS", "KY", "LA", "ME", "MH", "MD", "MA", "MI",
        "MN", "MS", "MO", "MT", "NE", "NV", "NH", "NJ", "NM", "NY", "NC", "ND", "MP", "OH", "OK",
        "OR", "PW", "PA", "PR", "RI", "SC", "SD", "TN", "TX", "UT", "VT", "VI", "VA", "WA", "WV",
        "WI", "WY",
    ]
});

// =============================================================================
// Parameter helpers
// =============================================================================

fn numeric_param(rule: &str, param: &Value) -> SchemaResult<f64> {
    as_f64(param).ok_or_else(|| SchemaError::BadRuleParameter {
        rule: rule.to_string(),
        message: format!("expected a number, got {param}"),
    })
}

fn length_param(rule: &str, param: &Value) -> SchemaResult<usize> {
    let n = numeric_param(rule, param)?;
    if n < 0.0 {
        return Err(SchemaError::BadRuleParameter {
            rule: rule.to_string(),
            message: "length must not be negative".into(),
        });
    }
    Ok(n as usize)
}

fn pair_param(rule: &str, param: &Value) -> SchemaResult<(f64, f64)> {
    let items = param.as_array().ok_or_else(|| SchemaError::BadRuleParameter {
        rule: rule.to_string(),
        message: "must be a two-element array".into(),
    })?;
    if items.len() != 2 {
        return Err(SchemaError::BadRuleParameter {
            rule: rule.to_string(),
            message: "must be a two-element array".into(),
        });
    }
    match (as_f64(&items[0]), as_f64(&items[1])) {
        (Some(lo), Some(hi)) => Ok((lo, hi)),
        _ => Err(SchemaError::BadRuleParameter {
            rule: rule.to_string(),
            message: "must contain numbers".into(),
        }),
    }
}

/// Resolve a `#name` / `[name=name]` selector to the bare field name.
fn selector_target(selector: &str) -> Option<String> {
    SELECTOR_RE.captures(selector.trim()).map(|caps| {
        caps.get(1)
            .or_else(|| caps.get(2))
            .map(|m| m.as_str().to_string())
            .unwrap_or_default()
    })
}

fn trimmed_len(value: &Value) -> Option<usize> {
    as_string(value).map(|s| s.trim().chars().count())
}

// =============================================================================
// Rules
// =============================================================================

fn required(value: &Value, param: &Value, name: &str, _ctx: &RowContext) -> SchemaResult<Option<String>> {
    if truthy(param) && is_blank(value) {
        return Ok(Some(format!("{name} is required")));
    }
    Ok(None)
}

fn minlength(value: &Value, param: &Value, name: &str, _ctx: &RowContext) -> SchemaResult<Option<String>> {
    let length = length_param("minlength", param)?;
    if is_blank(value) {
        return Ok(None);
    }
    match trimmed_len(value) {
        Some(len) if len < length => Ok(Some(format!("{name} requires {length} characters"))),
        _ => Ok(None),
    }
}

fn maxlength(value: &Value, param: &Value, name: &str, _ctx: &RowContext) -> SchemaResult<Option<String>> {
    let length = length_param("maxlength", param)?;
    if is_blank(value) {
        return Ok(None);
    }
    match trimmed_len(value) {
        Some(len) if len > length => Ok(Some(format!(
            "{name} allows no more than {length} characters"
        ))),
        _ => Ok(None),
    }
}

fn rangelength(value: &Value, param: &Value, name: &str, _ctx: &RowContext) -> SchemaResult<Option<String>> {
    let (lo, hi) = pair_param("rangelength", param)?;
    if is_blank(value) {
        return Ok(None);
    }
    match trimmed_len(value) {
        Some(len) if (len as f64) < lo || (len as f64) > hi => Ok(Some(format!(
            "{name} must be between {lo} and {hi} characters"
        ))),
        _ => Ok(None),
    }
}

fn min(value: &Value, param: &Value, name: &str, _ctx: &RowContext) -> SchemaResult<Option<String>> {
    let bound = numeric_param("min", param)?;
    if is_blank(value) {
        return Ok(None);
    }
    match as_f64(value) {
        Some(v) if v < bound => Ok(Some(format!("{name} must be greater or equal to {bound}"))),
        _ => Ok(None),
    }
}

fn max(value: &Value, param: &Value, name: &str, _ctx: &RowContext) -> SchemaResult<Option<String>> {
    let bound = numeric_param("max", param)?;
    if is_blank(value) {
        return Ok(None);
    }
    match as_f64(value) {
        Some(v) if v > bound => Ok(Some(format!("{name} must be less than or equal to {bound}"))),
        _ => Ok(None),
    }
}

fn range(value: &Value, param: &Value, name: &str, _ctx: &RowContext) -> SchemaResult<Option<String>> {
    let (lo, hi) = pair_param("range", param)?;
    if is_blank(value) {
        return Ok(None);
    }
    match as_f64(value) {
        Some(v) if v < lo || v > hi => Ok(Some(format!("{name} must be between {lo} and {hi}"))),
        _ => Ok(None),
    }
}

fn array_range(value: &Value, param: &Value, name: &str, _ctx: &RowContext) -> SchemaResult<Option<String>> {
    let (lo, hi) = pair_param("array_range", param)?;
    if is_blank(value) {
        return Ok(None);
    }
    let count = value.as_array().map(|a| a.len()).unwrap_or(0) as f64;
    if count < lo || count > hi {
        return Ok(Some(format!("{name} must have between {lo} and {hi} items")));
    }
    Ok(None)
}

fn step(value: &Value, param: &Value, name: &str, _ctx: &RowContext) -> SchemaResult<Option<String>> {
    let step = numeric_param("step", param)?;
    if step == 0.0 {
        return Err(SchemaError::BadRuleParameter {
            rule: "step".into(),
            message: "step must not be zero".into(),
        });
    }
    if is_blank(value) {
        return Ok(None);
    }
    if let Some(v) = as_f64(value) {
        let rem = (v % step).abs();
        if rem > 1e-9 && (step.abs() - rem) > 1e-9 {
            return Ok(Some(format!("{name} is not a step of {step}")));
        }
    }
    Ok(None)
}

fn email(value: &Value, param: &Value, _name: &str, _ctx: &RowContext) -> SchemaResult<Option<String>> {
    if !truthy(param) || is_blank(value) {
        return Ok(None);
    }
    match value.as_str() {
        Some(s) if EMAIL_RE.is_match(s.trim()) => Ok(None),
        _ => Ok(Some("Invalid email".into())),
    }
}

fn url(value: &Value, param: &Value, _name: &str, _ctx: &RowContext) -> SchemaResult<Option<String>> {
    if !truthy(param) || is_blank(value) {
        return Ok(None);
    }
    let ok = value
        .as_str()
        .and_then(|s| ::url::Url::parse(s.trim()).ok())
        .map(|u| u.has_host())
        .unwrap_or(false);
    if ok {
        Ok(None)
    } else {
        Ok(Some("Invalid URL".into()))
    }
}

fn date(value: &Value, param: &Value, name: &str, _ctx: &RowContext) -> SchemaResult<Option<String>> {
    if !truthy(param) || is_blank(value) {
        return Ok(None);
    }
    let ok = value.as_str().map(|s| parse_datetime(s).is_some()).unwrap_or(false);
    if ok {
        Ok(None)
    } else {
        Ok(Some(format!("Invalid date for {name}")))
    }
}

fn date_iso(value: &Value, param: &Value, name: &str, _ctx: &RowContext) -> SchemaResult<Option<String>> {
    if !truthy(param) || is_blank(value) {
        return Ok(None);
    }
    match value.as_str() {
        Some(s) if DATE_ISO_RE.is_match(s.trim()) => Ok(None),
        _ => Ok(Some(format!("{name} is not an ISO date"))),
    }
}

fn number(value: &Value, param: &Value, name: &str, _ctx: &RowContext) -> SchemaResult<Option<String>> {
    if !truthy(param) || is_blank(value) {
        return Ok(None);
    }
    if as_f64(value).is_some() {
        Ok(None)
    } else {
        Ok(Some(format!("{name} is not a number")))
    }
}

fn digits(value: &Value, param: &Value, name: &str, _ctx: &RowContext) -> SchemaResult<Option<String>> {
    if !truthy(param) || is_blank(value) {
        return Ok(None);
    }
    let ok = match value {
        Value::Number(n) => n.as_u64().is_some(),
        Value::String(s) => !s.trim().is_empty() && s.trim().chars().all(|c| c.is_ascii_digit()),
        _ => false,
    };
    if ok {
        Ok(None)
    } else {
        Ok(Some(format!("{name} is not a digit")))
    }
}

fn equal_to(value: &Value, param: &Value, name: &str, ctx: &RowContext) -> SchemaResult<Option<String>> {
    if is_blank(value) {
        return Ok(None);
    }
    // A selector parameter compares against the named sibling in the same
    // row; anything else is compared literally.
    let (other, label) = match param.as_str().and_then(selector_target) {
        Some(target) => (
            ctx.row.get(&target).cloned().unwrap_or(Value::Null),
            target,
        ),
        None => (param.clone(), as_string(param).unwrap_or_else(|| param.to_string())),
    };
    if loose_eq(value, &other) {
        Ok(None)
    } else {
        Ok(Some(format!("{name} is not equal to {label}")))
    }
}

fn creditcard(value: &Value, param: &Value, name: &str, _ctx: &RowContext) -> SchemaResult<Option<String>> {
    if !truthy(param) || is_blank(value) {
        return Ok(None);
    }
    let digits: String = as_string(value)
        .unwrap_or_default()
        .chars()
        .filter(|c| c.is_ascii_digit())
        .collect();
    if CREDITCARD_RES.iter().any(|re| re.is_match(&digits)) {
        Ok(None)
    } else {
        Ok(Some(format!("{name} is not a valid credit card.")))
    }
}

fn phone_us(value: &Value, param: &Value, _name: &str, _ctx: &RowContext) -> SchemaResult<Option<String>> {
    if !truthy(param) || is_blank(value) {
        return Ok(None);
    }
    let mut digits: String = as_string(value)
        .unwrap_or_default()
        .chars()
        .filter(|c| c.is_ascii_digit())
        .collect();
    if digits.len() == 11 && digits.starts_with('1') {
        digits.remove(0);
    }
    if digits.len() == 10 {
        Ok(None)
    } else {
        Ok(Some("Invalid phone number".into()))
    }
}

fn require_from_group(value: &Value, param: &Value, _name: &str, ctx: &RowContext) -> SchemaResult<Option<String>> {
    let items = param.as_array().ok_or_else(|| SchemaError::BadRuleParameter {
        rule: "require_from_group".into(),
        message: "expected [requiredCount, \"selector list\"]".into(),
    })?;
    let needed = items
        .first()
        .and_then(|v| v.as_u64())
        .ok_or_else(|| SchemaError::BadRuleParameter {
            rule: "require_from_group".into(),
            message: "required count must be a number".into(),
        })? as usize;
    let selectors = items
        .get(1)
        .and_then(|v| v.as_str())
        .ok_or_else(|| SchemaError::BadRuleParameter {
            rule: "require_from_group".into(),
            message: "selector list must be a string".into(),
        })?;
    if is_blank(value) {
        return Ok(None);
    }

    let mut names = Vec::new();
    let mut filled = 0;
    for selector in selectors.split(',') {
        let selector = selector.trim();
        let target = selector_target(selector).ok_or_else(|| SchemaError::BadRuleParameter {
            rule: "require_from_group".into(),
            message: format!("Invalid name target {selector}"),
        })?;
        if ctx
            .row
            .get(&target)
            .map(|v| !is_blank(v))
            .unwrap_or(false)
        {
            filled += 1;
        }
        names.push(target);
    }
    if filled >= needed {
        Ok(None)
    } else {
        Ok(Some(format!(
            "At least {needed} of {} are required",
            names.join(", ")
        )))
    }
}

fn string(value: &Value, param: &Value, name: &str, _ctx: &RowContext) -> SchemaResult<Option<String>> {
    if !truthy(param) || is_blank(value) {
        return Ok(None);
    }
    if value.is_string() {
        Ok(None)
    } else {
        Ok(Some(format!("{name} is not a string")))
    }
}

fn bool_rule(value: &Value, param: &Value, name: &str, _ctx: &RowContext) -> SchemaResult<Option<String>> {
    if !truthy(param) || is_blank(value) {
        return Ok(None);
    }
    if value.is_boolean() {
        Ok(None)
    } else {
        Ok(Some(format!("{name} is not boolean")))
    }
}

fn exactlength(value: &Value, param: &Value, name: &str, _ctx: &RowContext) -> SchemaResult<Option<String>> {
    let length = length_param("exactlength", param)?;
    if is_blank(value) {
        return Ok(None);
    }
    match trimmed_len(value) {
        Some(len) if len != length => Ok(Some(format!(
            "{name} requires exactly {length} characters"
        ))),
        _ => Ok(None),
    }
}

fn longitude(value: &Value, param: &Value, _name: &str, _ctx: &RowContext) -> SchemaResult<Option<String>> {
    if !truthy(param) || is_blank(value) {
        return Ok(None);
    }
    match as_f64(value) {
        Some(v) if (-180.0..=180.0).contains(&v) => Ok(None),
        _ => Ok(Some("Invalid longitude".into())),
    }
}

fn latitude(value: &Value, param: &Value, _name: &str, _ctx: &RowContext) -> SchemaResult<Option<String>> {
    if !truthy(param) || is_blank(value) {
        return Ok(None);
    }
    match as_f64(value) {
        Some(v) if (-90.0..=90.0).contains(&v) => Ok(None),
        _ => Ok(Some("Invalid latitude".into())),
    }
}

fn login_regex(value: &Value, param: &Value, _name: &str, _ctx: &RowContext) -> SchemaResult<Option<String>> {
    if !truthy(param) || is_blank(value) {
        return Ok(None);
    }
    match value.as_str() {
        Some(s) if LOGIN_RE.is_match(s) => Ok(None),
        _ => Ok(Some(
            "Username must contain only letters, numbers, underscore, or period".into(),
        )),
    }
}

fn no_invalid(value: &Value, param: &Value, _name: &str, _ctx: &RowContext) -> SchemaResult<Option<String>> {
    if !truthy(param) || is_blank(value) {
        return Ok(None);
    }
    match value.as_str() {
        Some(s) if NO_INVALID_RE.is_match(s) => Ok(None),
        _ => Ok(Some("Invalid characters".into())),
    }
}

fn domain(value: &Value, param: &Value, _name: &str, _ctx: &RowContext) -> SchemaResult<Option<String>> {
    if !truthy(param) || is_blank(value) {
        return Ok(None);
    }
    match value.as_str() {
        Some(s) if DOMAIN_RE.is_match(s) => Ok(None),
        _ => Ok(Some("Alphanumerical, underscore, and hyphens only".into())),
    }
}

fn filename(value: &Value, param: &Value, _name: &str, _ctx: &RowContext) -> SchemaResult<Option<String>> {
    if !truthy(param) || is_blank(value) {
        return Ok(None);
    }
    let ok = value
        .as_str()
        .map(|s| !s.contains(['\\', '/', '%', '*', ':', '|', '"', '<', '>']))
        .unwrap_or(false);
    if ok {
        Ok(None)
    } else {
        Ok(Some("Invalid file name".into()))
    }
}

fn ipv4_ok(s: &str) -> bool {
    s.trim().parse::<Ipv4Addr>().is_ok()
}

fn valid_ip(value: &Value, param: &Value, _name: &str, _ctx: &RowContext) -> SchemaResult<Option<String>> {
    if !truthy(param) || is_blank(value) {
        return Ok(None);
    }
    if value.as_str().map(ipv4_ok).unwrap_or(false) {
        Ok(None)
    } else {
        Ok(Some("IP Addresses must have format xxx.xxx.xxx.xxx".into()))
    }
}

fn valid_ip_list(value: &Value, param: &Value, _name: &str, _ctx: &RowContext) -> SchemaResult<Option<String>> {
    if !truthy(param) || is_blank(value) {
        return Ok(None);
    }
    let ok = value
        .as_str()
        .map(|s| s.split(',').all(ipv4_ok))
        .unwrap_or(false);
    if ok {
        Ok(None)
    } else {
        Ok(Some("IP Addresses must have format xxx.xxx.xxx.xxx".into()))
    }
}

fn is_us_state(value: &Value, param: &Value, _name: &str, _ctx: &RowContext) -> SchemaResult<Option<String>> {
    if !truthy(param) || is_blank(value) {
        return Ok(None);
    }
    let ok = value
        .as_str()
        .map(|s| US_STATES.contains(&s.trim()))
        .unwrap_or(false);
    if ok {
        Ok(None)
    } else {
        Ok(Some("Must be a US State".into()))
    }
}

fn timezone(value: &Value, param: &Value, _name: &str, _ctx: &RowContext) -> SchemaResult<Option<String>> {
    if !truthy(param) || is_blank(value) {
        return Ok(None);
    }
    match value.as_str() {
        Some(s) if s.trim().parse::<chrono_tz::Tz>().is_ok() => Ok(None),
        _ => Ok(Some(format!(
            "Invalid timezone ID '{}'",
            value.as_str().unwrap_or_default()
        ))),
    }
}

fn in_array(value: &Value, param: &Value, name: &str, _ctx: &RowContext) -> SchemaResult<Option<String>> {
    let allowed = param.as_array().ok_or_else(|| SchemaError::BadRuleParameter {
        rule: "inArray".into(),
        message: "expected an array of allowed values".into(),
    })?;
    if is_blank(value) {
        return Ok(None);
    }
    if allowed.iter().any(|candidate| loose_eq(value, candidate)) {
        Ok(None)
    } else {
        let list: Vec<String> = allowed
            .iter()
            .map(|v| as_string(v).unwrap_or_else(|| v.to_string()))
            .collect();
        Ok(Some(format!("{name} must be one of: {}", list.join(", "))))
    }
}

fn is_object(value: &Value, param: &Value, name: &str, _ctx: &RowContext) -> SchemaResult<Option<String>> {
    if !truthy(param) || is_blank(value) {
        return Ok(None);
    }
    if value.is_object() {
        Ok(None)
    } else {
        Ok(Some(format!("{name} is not an object")))
    }
}

fn is_array(value: &Value, param: &Value, name: &str, _ctx: &RowContext) -> SchemaResult<Option<String>> {
    if !truthy(param) || is_blank(value) {
        return Ok(None);
    }
    if value.is_array() {
        Ok(None)
    } else {
        Ok(Some(format!("{name} is not an array")))
    }
}

fn is_sequential_array(value: &Value, param: &Value, name: &str, _ctx: &RowContext) -> SchemaResult<Option<String>> {
    if !truthy(param) || is_blank(value) {
        return Ok(None);
    }
    if value.is_array() {
        Ok(None)
    } else {
        Ok(Some(format!("{name} is not a sequential array")))
    }
}

fn offending_indexes(value: &Value, elem_ok: fn(&Value) -> bool) -> Option<Vec<usize>> {
    value.as_array().map(|items| {
        items
            .iter()
            .enumerate()
            .filter(|(_, v)| !elem_ok(v))
            .map(|(i, _)| i)
            .collect()
    })
}

fn is_sequential_int_array(value: &Value, param: &Value, name: &str, ctx: &RowContext) -> SchemaResult<Option<String>> {
    if let Some(err) = is_sequential_array(value, param, name, ctx)? {
        return Ok(Some(err));
    }
    if !truthy(param) || is_blank(value) {
        return Ok(None);
    }
    let bad = offending_indexes(value, |v| v.as_i64().is_some()).unwrap_or_default();
    if bad.is_empty() {
        Ok(None)
    } else {
        let list: Vec<String> = bad.iter().map(|i| i.to_string()).collect();
        Ok(Some(format!(
            "{name} indexes {} must only contain integers",
            list.join(", ")
        )))
    }
}

fn is_sequential_digit_array(value: &Value, param: &Value, name: &str, ctx: &RowContext) -> SchemaResult<Option<String>> {
    if let Some(err) = is_sequential_array(value, param, name, ctx)? {
        return Ok(Some(err));
    }
    if !truthy(param) || is_blank(value) {
        return Ok(None);
    }
    let bad = offending_indexes(value, |v| match v {
        Value::Number(n) => n.as_u64().is_some(),
        Value::String(s) => !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()),
        _ => false,
    })
    .unwrap_or_default();
    if bad.is_empty() {
        Ok(None)
    } else {
        let list: Vec<String> = bad.iter().map(|i| i.to_string()).collect();
        Ok(Some(format!(
            "{name} indexes {} must only contain digits",
            list.join(", ")
        )))
    }
}

/// `noServer` and `remote` are evaluated client-side only.
fn no_op(_value: &Value, _param: &Value, _name: &str, _ctx: &RowContext) -> SchemaResult<Option<String>> {
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn run(name: &str, value: Value, param: Value) -> SchemaResult<Option<String>> {
        let row = serde_json::Map::new();
        let ctx = RowContext { row: &row };
        lookup(name).expect("rule registered")(&value, &param, "field", &ctx)
    }

    #[test]
    fn test_required() {
        assert_eq!(
            run("required", Value::Null, json!(true)).unwrap(),
            Some("field is required".into())
        );
        assert_eq!(run("required", json!("  "), json!(true)).unwrap().is_some(), true);
        assert_eq!(run("required", json!("x"), json!(true)).unwrap(), None);
        // Disabled flag never fires.
        assert_eq!(run("required", Value::Null, json!(false)).unwrap(), None);
    }

    #[test]
    fn test_blank_values_skip_every_other_rule() {
        for name in [
            "minlength", "maxlength", "email", "url", "date", "dateISO", "number", "digits",
            "creditcard", "phoneUS", "string", "bool", "exactlength", "longitude", "latitude",
            "loginRegex", "noInvalid", "domain", "filename", "validIP", "validIPList",
            "isUSstate", "timezone", "isObject", "isArray", "isSequentialArray",
        ] {
            assert_eq!(run(name, Value::Null, json!(5)).unwrap(), None, "rule {name}");
            assert_eq!(run(name, json!(""), json!(5)).unwrap(), None, "rule {name}");
        }
        assert_eq!(run("range", json!(""), json!([1, 2])).unwrap(), None);
        assert_eq!(run("inArray", Value::Null, json!(["a"])).unwrap(), None);
    }

    #[test]
    fn test_lengths() {
        assert!(run("minlength", json!("ab"), json!(3)).unwrap().is_some());
        assert_eq!(run("minlength", json!("abc"), json!(3)).unwrap(), None);
        assert!(run("maxlength", json!("abcd"), json!(3)).unwrap().is_some());
        assert!(run("exactlength", json!("abcd"), json!(3)).unwrap().is_some());
        assert_eq!(run("exactlength", json!(" abc "), json!(3)).unwrap(), None);
        assert!(run("rangelength", json!("a"), json!([2, 4])).unwrap().is_some());
        assert_eq!(run("rangelength", json!("abc"), json!([2, 4])).unwrap(), None);
    }

    #[test]
    fn test_numeric_bounds_use_declared_parameter() {
        assert!(run("min", json!(3), json!(5)).unwrap().is_some());
        assert_eq!(run("min", json!(5), json!(5)).unwrap(), None);
        assert!(run("max", json!("9"), json!(5)).unwrap().is_some());
        assert!(run("range", json!(11), json!([1, 10])).unwrap().is_some());
        assert_eq!(run("range", json!("10"), json!([1, 10])).unwrap(), None);
        assert!(run("array_range", json!([1]), json!([2, 3])).unwrap().is_some());
        assert_eq!(run("array_range", json!([1, 2]), json!([2, 3])).unwrap(), None);
    }

    #[test]
    fn test_bad_range_parameters_are_config_errors() {
        assert!(matches!(
            run("range", json!(5), json!([1])),
            Err(SchemaError::BadRuleParameter { .. })
        ));
        assert!(matches!(
            run("rangelength", json!("x"), json!(["a", "b"])),
            Err(SchemaError::BadRuleParameter { .. })
        ));
        assert!(matches!(
            run("min", json!(5), json!("not a number")),
            Err(SchemaError::BadRuleParameter { .. })
        ));
    }

    #[test]
    fn test_step() {
        assert_eq!(run("step", json!(15), json!(5)).unwrap(), None);
        assert!(run("step", json!(7), json!(5)).unwrap().is_some());
    }

    #[test]
    fn test_email_and_url() {
        assert_eq!(run("email", json!("a@b.com"), json!(true)).unwrap(), None);
        assert_eq!(
            run("email", json!("not-an-email"), json!(true)).unwrap(),
            Some("Invalid email".into())
        );
        assert_eq!(run("email", json!("not-an-email"), json!(false)).unwrap(), None);
        assert_eq!(run("url", json!("https://example.com/x"), json!(true)).unwrap(), None);
        assert!(run("url", json!("notaurl"), json!(true)).unwrap().is_some());
    }

    #[test]
    fn test_dates() {
        assert_eq!(run("date", json!("2024-03-15"), json!(true)).unwrap(), None);
        assert!(run("date", json!("bogus"), json!(true)).unwrap().is_some());
        assert_eq!(run("dateISO", json!("2024-03-15"), json!(true)).unwrap(), None);
        assert!(run("dateISO", json!("03/15/2024"), json!(true)).unwrap().is_some());
    }

    #[test]
    fn test_number_and_digits() {
        assert_eq!(run("number", json!("12.5"), json!(true)).unwrap(), None);
        assert!(run("number", json!("12x"), json!(true)).unwrap().is_some());
        assert_eq!(run("digits", json!("0123"), json!(true)).unwrap(), None);
        assert!(run("digits", json!("-3"), json!(true)).unwrap().is_some());
        assert!(run("digits", json!(1.5), json!(true)).unwrap().is_some());
    }

    #[test]
    fn test_equal_to_sibling_and_literal() {
        let mut row = serde_json::Map::new();
        row.insert("password".into(), json!("hunter2"));
        let ctx = RowContext { row: &row };
        let rule = lookup("equalTo").unwrap();

        assert_eq!(
            rule(&json!("hunter2"), &json!("#password"), "confirm", &ctx).unwrap(),
            None
        );
        assert_eq!(
            rule(&json!("other"), &json!("[name=password]"), "confirm", &ctx).unwrap(),
            Some("confirm is not equal to password".into())
        );
        assert_eq!(rule(&json!("abc"), &json!("abc"), "confirm", &ctx).unwrap(), None);
    }

    #[test]
    fn test_require_from_group() {
        let mut row = serde_json::Map::new();
        row.insert("seriesName".into(), json!("s1"));
        row.insert("seriesId".into(), json!(""));
        let ctx = RowContext { row: &row };
        let rule = lookup("require_from_group").unwrap();

        let param = json!([1, "#seriesName, #seriesId"]);
        assert_eq!(rule(&json!("s1"), &param, "seriesName", &ctx).unwrap(), None);

        let param = json!([2, "[name=seriesName], [name=seriesId]"]);
        let err = rule(&json!("s1"), &param, "seriesName", &ctx).unwrap().unwrap();
        assert!(err.contains("At least 2 of seriesName, seriesId"));

        let bad = json!([1, "seriesName"]);
        assert!(matches!(
            rule(&json!("s1"), &bad, "seriesName", &ctx),
            Err(SchemaError::BadRuleParameter { .. })
        ));
    }

    #[test]
    fn test_credit_card_and_phone() {
        assert_eq!(run("creditcard", json!("4111 1111 1111 1111"), json!(true)).unwrap(), None);
        assert!(run("creditcard", json!("1234"), json!(true)).unwrap().is_some());
        assert_eq!(run("phoneUS", json!("212-555-1234"), json!(true)).unwrap(), None);
        assert_eq!(run("phoneUS", json!("1 (212) 555-1234"), json!(true)).unwrap(), None);
        assert!(run("phoneUS", json!("555-1234"), json!(true)).unwrap().is_some());
    }

    #[test]
    fn test_geo_and_formats() {
        assert_eq!(run("longitude", json!(-73.9), json!(true)).unwrap(), None);
        assert!(run("longitude", json!(181), json!(true)).unwrap().is_some());
        assert!(run("latitude", json!(-91), json!(true)).unwrap().is_some());
        assert_eq!(run("loginRegex", json!("user.name_1"), json!(true)).unwrap(), None);
        assert!(run("loginRegex", json!("bad name"), json!(true)).unwrap().is_some());
        assert!(run("filename", json!("a/b.txt"), json!(true)).unwrap().is_some());
        assert_eq!(run("filename", json!("report.txt"), json!(true)).unwrap(), None);
    }

    #[test]
    fn test_ips_states_timezones() {
        assert_eq!(run("validIP", json!("10.0.0.1"), json!(true)).unwrap(), None);
        assert!(run("validIP", json!("300.1.1.1"), json!(true)).unwrap().is_some());
        assert_eq!(run("validIPList", json!("10.0.0.1, 192.168.0.1"), json!(true)).unwrap(), None);
        assert!(run("validIPList", json!("10.0.0.1, nope"), json!(true)).unwrap().is_some());
        assert_eq!(run("isUSstate", json!("NY"), json!(true)).unwrap(), None);
        assert!(run("isUSstate", json!("ZZ"), json!(true)).unwrap().is_some());
        assert_eq!(run("timezone", json!("America/New_York"), json!(true)).unwrap(), None);
        assert!(run("timezone", json!("Mars/Olympus"), json!(true)).unwrap().is_some());
    }

    #[test]
    fn test_containers() {
        assert_eq!(run("inArray", json!("csv"), json!(["csv", "json"])).unwrap(), None);
        let err = run("inArray", json!("xml"), json!(["csv", "json"])).unwrap().unwrap();
        assert_eq!(err, "field must be one of: csv, json");
        assert_eq!(run("isObject", json!({"a": 1}), json!(true)).unwrap(), None);
        assert!(run("isObject", json!([1]), json!(true)).unwrap().is_some());
        assert_eq!(run("isArray", json!([1]), json!(true)).unwrap(), None);
        assert!(run("isSequentialArray", json!({"a": 1}), json!(true)).unwrap().is_some());
    }

    #[test]
    fn test_typed_arrays() {
        assert_eq!(run("isSequentialIntArray", json!([1, 2]), json!(true)).unwrap(), None);
        let err = run("isSequentialIntArray", json!([1, "x", 2.5]), json!(true)).unwrap().unwrap();
        assert!(err.contains("indexes 1, 2"));
        assert_eq!(run("isSequentialDigitArray", json!(["12", 3]), json!(true)).unwrap(), None);
        assert!(run("isSequentialDigitArray", json!(["-1"]), json!(true)).unwrap().is_some());
    }

    #[test]
    fn test_no_ops() {
        assert_eq!(run("noServer", json!("anything"), json!(true)).unwrap(), None);
        assert_eq!(run("remote", json!("anything"), json!({"data": {}})).unwrap(), None);
    }
}
