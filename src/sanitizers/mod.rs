//! Built-in sanitizer library.
//!
//! Every sanitizer is a pure function of `(value, parameter)` returning
//! the transformed value. Sanitizers never fail on malformed *data* - they
//! coerce or produce null instead - and raise [`SchemaError`] only for
//! malformed *configuration* (for example `arrayDeliminated` without a
//! delimiter).
//!
//! Array-typed sanitizers carry a library-wide fallback for absent fields:
//! a missing multi-select sanitizes to an empty list rather than null. See
//! [`absent_fallback`].

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde_json::{json, Value};

use crate::error::{SchemaError, SchemaResult};
use crate::value::{as_f64, as_string, int_prefix, parse_datetime, truthy};

/// Signature shared by all built-in sanitizers.
pub type SanitizerFn = fn(Value, &Value) -> SchemaResult<Value>;

/// Look up a built-in sanitizer by name.
pub(crate) fn lookup(name: &str) -> Option<SanitizerFn> {
    REGISTRY.get(name).copied()
}

/// Library-wide substitute used when a field is absent from input, has no
/// field-level default, but is configured with this sanitizer.
pub(crate) fn absent_fallback(name: &str) -> Option<Value> {
    const ARRAY_TYPED: [&str; 7] = [
        "array",
        "arrayInt",
        "arrayMult",
        "arrayNum",
        "arrayIntNotZero",
        "arrayNotEmpty",
        "arrayDeliminated",
    ];
    if ARRAY_TYPED.contains(&name) {
        Some(json!([]))
    } else {
        None
    }
}

static REGISTRY: Lazy<HashMap<&'static str, SanitizerFn>> = Lazy::new(|| {
    let mut m: HashMap<&'static str, SanitizerFn> = HashMap::new();
    m.insert("none", none);
    m.insert("strtolower", strtolower);
    m.insert("strtoupper", strtoupper);
    m.insert("trim", trim);
    m.insert("string", string);
    m.insert("int", int);
    m.insert("bool", bool_san);
    m.insert("boolInt", bool_int);
    m.insert("yes_no", yes_no);
    m.insert("true_false", true_false);
    m.insert("intNULL", int_null);
    m.insert("array", array);
    m.insert("object", object);
    m.insert("arrayInt", array_int);
    m.insert("arrayMult", array_mult);
    m.insert("arrayNum", array_num);
    m.insert("trimNull", trim_null);
    m.insert("setNull", set_null);
    m.insert("removePeriods", remove_periods);
    m.insert("numbersOnly", numbers_only);
    m.insert("USstate", us_state);
    m.insert("url", url);
    m.insert("phoneNull", phone_null);
    m.insert("dollars", dollars);
    m.insert("float", float);
    m.insert("percent", percent);
    m.insert("max", max);
    m.insert("min", min);
    m.insert("phone", phone);
    m.insert("dateUnix", date_unix);
    m.insert("dateTimeUnix", date_time_unix);
    m.insert("dateStandard", date_standard);
    m.insert("dateStandard_w_time", date_standard_w_time);
    m.insert("dateUS", date_us);
    m.insert("dateUS_w_time", date_us_w_time);
    m.insert("numbersOnlyNull", numbers_only_null);
    m.insert("arrayIntNotZero", array_int_not_zero);
    m.insert("arrayNotEmpty", array_not_empty);
    m.insert("arrayDeliminated", array_deliminated);
    m
});

/// Full state name to postal code, used by `USstate` when the input is not
/// already a two-letter code.
static US_STATE_NAMES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("ALABAMA", "AL"), ("ALASKA", "AK"), ("AMERICANSAMOA", "AS"), ("ARIZONA", "AZ"),
        ("ARKANSAS", "AR"), ("CALIFORNIA", "CA"), ("COLORADO", "CO"), ("CONNECTICUT", "CT"),
        ("DELAWARE", "DE"), ("DISTRICTOFCOLUMBIA", "DC"), ("FEDERATEDSTATESOFMICRONESIA", "FM"),
        ("FLORIDA", "FL"), ("GEORGIA", "GA"), ("GUAM", "GU"), ("HAWAII", "HI"), ("IDAHO", "ID"),
        ("ILLINOIS", "IL"), ("INDIANA", "IN"), ("IOWA", "IA"), ("KANSAS", "KS"),
        ("KENTUCKY", "KY"), ("LOUISIANA", "LA"), ("MAINE", "ME"), ("MARSHALLISLANDS", "MH"),
        ("MARYLAND", "MD"), ("MASSACHUSETTS", "MA"), ("MICHIGAN", "MI"), ("MINNESOTA", "MN"),
        ("MISSISSIPPI", "MS"), ("MISSOURI", "MO"), ("MONTANA", "MT"), ("NEBRASKA", "NE"),
        ("NEVADA", "NV"), ("NEWHAMPSHIRE", "NH"), ("NEWJERSEY", "NJ"), ("NEWMEXICO", "NM"),
        ("NEWYORK", "NY"), ("NORTHCAROLINA", "NC"), ("NORTHDAKOTA", "ND"),
        ("NORTHERNMARIANAISLANDS", "MP"), ("OHIO", "OH"), ("OKLAHOMA", "OK"), ("OREGON", "OR"),
        ("PALAU", "PW"), ("PENNSYLVANIA", "PA"), ("PUERTORICO", "PR"), ("RHODEISLAND", "RI"),
        ("SOUTHCAROLINA", "SC"), ("SOUTHDAKOTA", "SD"), ("TENNESSEE", "TN"), ("TEXAS", "TX"),
        ("UTAH", "UT"), ("VERMONT", "VT"), ("VIRGINISLANDS", "VI"), ("VIRGINIA", "VA"),
        ("WASHINGTON", "WA"), ("WESTVIRGINIA", "WV"), ("WISCONSIN", "WI"), ("WYOMING", "WY"),
    ])
});

// =============================================================================
// Helpers
// =============================================================================

/// Apply a string transform to a scalar; containers and null pass through
/// unchanged.
fn map_string(value: Value, f: impl Fn(&str) -> Value) -> Value {
    match as_string(&value) {
        Some(s) => f(&s),
        None => value,
    }
}

/// Coerce to an array: arrays stay, null becomes empty, scalars and
/// objects wrap into a single element.
fn to_array(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        other => vec![other],
    }
}

/// Build a JSON number, keeping integers integral.
fn num(f: f64) -> Value {
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
        Value::Number((f as i64).into())
    } else {
        serde_json::Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
    }
}

fn digits_of(s: &str) -> String {
    s.chars().filter(|c| c.is_ascii_digit()).collect()
}

fn string_param(sanitizer: &str, param: &Value, message: &str) -> SchemaResult<String> {
    param
        .as_str()
        .map(|s| s.to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| SchemaError::BadSanitizerParameter {
            sanitizer: sanitizer.to_string(),
            message: message.to_string(),
        })
}

// =============================================================================
// Sanitizers
// =============================================================================

fn none(value: Value, _param: &Value) -> SchemaResult<Value> {
    Ok(value)
}

fn strtolower(value: Value, _param: &Value) -> SchemaResult<Value> {
    Ok(map_string(value, |s| Value::String(s.to_lowercase())))
}

fn strtoupper(value: Value, _param: &Value) -> SchemaResult<Value> {
    Ok(map_string(value, |s| Value::String(s.to_uppercase())))
}

fn trim(value: Value, _param: &Value) -> SchemaResult<Value> {
    Ok(map_string(value, |s| Value::String(s.trim().to_string())))
}

fn string(value: Value, _param: &Value) -> SchemaResult<Value> {
    Ok(match value {
        Value::Null => Value::String(String::new()),
        other => map_string(other, |s| Value::String(s.to_string())),
    })
}

/// Numeric-prefix coercion: `"7abc"` becomes 7, `"abc"` becomes 0.
fn int(value: Value, _param: &Value) -> SchemaResult<Value> {
    Ok(Value::Number(int_prefix(&value).into()))
}

fn bool_san(value: Value, _param: &Value) -> SchemaResult<Value> {
    Ok(Value::Bool(truthy(&value)))
}

/// 1/0 instead of true/false.
fn bool_int(value: Value, _param: &Value) -> SchemaResult<Value> {
    Ok(Value::Number(i64::from(truthy(&value)).into()))
}

fn yes_no(value: Value, _param: &Value) -> SchemaResult<Value> {
    let is_yes = as_string(&value).map(|s| s == "y").unwrap_or(false);
    Ok(Value::Number(i64::from(is_yes).into()))
}

fn true_false(value: Value, _param: &Value) -> SchemaResult<Value> {
    let is_true = as_string(&value).map(|s| s == "t").unwrap_or(false);
    Ok(Value::Number(i64::from(is_true).into()))
}

/// Keep the original value when it coerces to a non-zero integer,
/// otherwise null.
fn int_null(value: Value, _param: &Value) -> SchemaResult<Value> {
    if int_prefix(&value) != 0 {
        Ok(value)
    } else {
        Ok(Value::Null)
    }
}

fn array(value: Value, _param: &Value) -> SchemaResult<Value> {
    Ok(match value {
        Value::Object(_) => value,
        other => Value::Array(to_array(other)),
    })
}

fn object(value: Value, _param: &Value) -> SchemaResult<Value> {
    Ok(match value {
        Value::Object(_) => value,
        Value::Null => json!({}),
        Value::Array(items) => {
            let mut map = serde_json::Map::new();
            for (i, item) in items.into_iter().enumerate() {
                map.insert(i.to_string(), item);
            }
            Value::Object(map)
        }
        scalar => json!({ "scalar": scalar }),
    })
}

fn array_int(value: Value, _param: &Value) -> SchemaResult<Value> {
    let items = to_array(value)
        .into_iter()
        .map(|v| Value::Number(int_prefix(&v).into()))
        .collect();
    Ok(Value::Array(items))
}

/// Keep only the listed keys of each row, e.g. parameter `"id|sign"`.
fn array_mult(value: Value, param: &Value) -> SchemaResult<Value> {
    let spec = string_param(
        "arrayMult",
        param,
        "requires an array definition. i.e. \"id|sign\"",
    )?;
    let keys: Vec<&str> = spec.split('|').collect();
    let items = to_array(value)
        .into_iter()
        .map(|item| match item {
            Value::Object(map) => {
                let kept: serde_json::Map<String, Value> = map
                    .into_iter()
                    .filter(|(k, _)| keys.contains(&k.as_str()))
                    .collect();
                Value::Object(kept)
            }
            other => other,
        })
        .collect();
    Ok(Value::Array(items))
}

fn array_num(value: Value, _param: &Value) -> SchemaResult<Value> {
    let items = to_array(value)
        .into_iter()
        .map(|v| if as_f64(&v).is_some() { v } else { Value::Null })
        .collect();
    Ok(Value::Array(items))
}

fn trim_null(value: Value, _param: &Value) -> SchemaResult<Value> {
    Ok(map_string(value, |s| {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            Value::Null
        } else {
            Value::String(trimmed.to_string())
        }
    }))
}

fn set_null(_value: Value, _param: &Value) -> SchemaResult<Value> {
    Ok(Value::Null)
}

fn remove_periods(value: Value, _param: &Value) -> SchemaResult<Value> {
    Ok(map_string(value, |s| {
        let stripped = s.replace('.', "");
        if stripped.is_empty() {
            Value::Null
        } else {
            Value::String(stripped)
        }
    }))
}

/// Pass numeric values through, null anything else.
fn numbers_only(value: Value, _param: &Value) -> SchemaResult<Value> {
    if as_f64(&value).is_some() {
        Ok(value)
    } else {
        Ok(Value::Null)
    }
}

fn us_state(value: Value, _param: &Value) -> SchemaResult<Value> {
    Ok(map_string(value, |s| {
        let cleaned: String = s
            .trim()
            .chars()
            .filter(|c| c.is_ascii_alphabetic())
            .collect::<String>()
            .to_uppercase();
        if cleaned.len() == 2 {
            Value::String(cleaned)
        } else {
            US_STATE_NAMES
                .get(cleaned.as_str())
                .map(|code| Value::String((*code).to_string()))
                .unwrap_or(Value::Null)
        }
    }))
}

/// Prefix bare addresses with `http://`; blank becomes null.
fn url(value: Value, _param: &Value) -> SchemaResult<Value> {
    Ok(map_string(value, |s| {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Value::Null;
        }
        let lower = trimmed.to_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            Value::String(trimmed.to_string())
        } else {
            Value::String(format!("http://{trimmed}"))
        }
    }))
}

fn phone_null(value: Value, _param: &Value) -> SchemaResult<Value> {
    Ok(map_string(value, |s| {
        let digits = digits_of(s);
        if digits.is_empty() {
            Value::Null
        } else {
            Value::String(digits)
        }
    }))
}

/// `"$1,234.5"` becomes `"1234.50"`; non-monetary input becomes null.
fn dollars(value: Value, _param: &Value) -> SchemaResult<Value> {
    Ok(map_string(value, |s| {
        let cleaned = s.trim().trim_start_matches('$').replace(',', "");
        match cleaned.parse::<f64>() {
            Ok(v) => Value::String(format!("{v:.2}")),
            Err(_) => Value::Null,
        }
    }))
}

/// Format to the given number of decimals, as a string.
fn float(value: Value, param: &Value) -> SchemaResult<Value> {
    let digits = as_f64(param)
        .filter(|d| *d >= 0.0)
        .ok_or_else(|| SchemaError::BadSanitizerParameter {
            sanitizer: "float".into(),
            message: "requires the number of decimal digits".into(),
        })? as usize;
    Ok(match as_f64(&value) {
        Some(v) => Value::String(format!("{v:.digits$}")),
        None => Value::Null,
    })
}

/// `"45%"` becomes `"0.45"`.
fn percent(value: Value, _param: &Value) -> SchemaResult<Value> {
    Ok(map_string(value, |s| {
        let cleaned = s.trim().trim_end_matches('%');
        match cleaned.parse::<f64>() {
            Ok(v) => Value::String(format!("{:.2}", v / 100.0)),
            Err(_) => Value::Null,
        }
    }))
}

/// Clamp to at most the parameter.
fn max(value: Value, param: &Value) -> SchemaResult<Value> {
    let bound = as_f64(param).ok_or_else(|| SchemaError::BadSanitizerParameter {
        sanitizer: "max".into(),
        message: "requires a numeric bound".into(),
    })?;
    Ok(match as_f64(&value) {
        Some(v) if v > bound => num(bound),
        _ => value,
    })
}

/// Clamp to at least the parameter.
fn min(value: Value, param: &Value) -> SchemaResult<Value> {
    let bound = as_f64(param).ok_or_else(|| SchemaError::BadSanitizerParameter {
        sanitizer: "min".into(),
        message: "requires a numeric bound".into(),
    })?;
    Ok(match as_f64(&value) {
        Some(v) if v < bound => num(bound),
        _ => value,
    })
}

/// Digits only, dropping a leading country code 1.
fn phone(value: Value, _param: &Value) -> SchemaResult<Value> {
    Ok(map_string(value, |s| {
        let digits = digits_of(s);
        let national = digits.strip_prefix('1').unwrap_or(&digits);
        Value::String(national.to_string())
    }))
}

fn date_unix(value: Value, _param: &Value) -> SchemaResult<Value> {
    Ok(map_string(value, |s| {
        parse_datetime(s)
            .map(|dt| {
                let midnight = dt.date().and_hms_opt(0, 0, 0).unwrap_or(dt);
                Value::Number(midnight.and_utc().timestamp().into())
            })
            .unwrap_or(Value::Null)
    }))
}

fn date_time_unix(value: Value, _param: &Value) -> SchemaResult<Value> {
    Ok(map_string(value, |s| {
        parse_datetime(s)
            .map(|dt| Value::Number(dt.and_utc().timestamp().into()))
            .unwrap_or(Value::Null)
    }))
}

fn date_standard(value: Value, _param: &Value) -> SchemaResult<Value> {
    Ok(map_string(value, |s| {
        parse_datetime(s)
            .map(|dt| Value::String(dt.format("%Y-%m-%d").to_string()))
            .unwrap_or(Value::Null)
    }))
}

fn date_standard_w_time(value: Value, _param: &Value) -> SchemaResult<Value> {
    Ok(map_string(value, |s| {
        parse_datetime(s)
            .map(|dt| Value::String(dt.format("%Y-%m-%d %H:%M:%S").to_string()))
            .unwrap_or(Value::Null)
    }))
}

fn date_us(value: Value, _param: &Value) -> SchemaResult<Value> {
    Ok(map_string(value, |s| {
        parse_datetime(s)
            .map(|dt| Value::String(dt.format("%m/%d/%Y").to_string()))
            .unwrap_or(Value::Null)
    }))
}

/// US date, keeping the time only when it is not midnight.
fn date_us_w_time(value: Value, _param: &Value) -> SchemaResult<Value> {
    use chrono::Timelike;
    Ok(map_string(value, |s| {
        parse_datetime(s)
            .map(|dt| {
                let fmt = if dt.hour() == 0 && dt.minute() == 0 {
                    "%m/%d/%Y"
                } else {
                    "%m/%d/%Y %H:%M"
                };
                Value::String(dt.format(fmt).to_string())
            })
            .unwrap_or(Value::Null)
    }))
}

fn numbers_only_null(value: Value, _param: &Value) -> SchemaResult<Value> {
    Ok(map_string(value, |s| {
        let digits = digits_of(s);
        if digits.is_empty() {
            Value::Null
        } else {
            Value::String(digits)
        }
    }))
}

fn array_int_not_zero(value: Value, _param: &Value) -> SchemaResult<Value> {
    let items: Vec<Value> = to_array(value)
        .into_iter()
        .map(|v| int_prefix(&v))
        .filter(|n| *n != 0)
        .map(|n| Value::Number(n.into()))
        .collect();
    Ok(Value::Array(items))
}

fn array_not_empty(value: Value, _param: &Value) -> SchemaResult<Value> {
    let items: Vec<Value> = to_array(value).into_iter().filter(truthy).collect();
    Ok(Value::Array(items))
}

/// Split a delimited string into an array: `"a,b,c"` with `","` becomes
/// `["a", "b", "c"]`.
fn array_deliminated(value: Value, param: &Value) -> SchemaResult<Value> {
    let delimiter = string_param("arrayDeliminated", param, "requires a delimiter")?;
    Ok(match value {
        Value::Array(_) => value,
        other => match as_string(&other) {
            Some(s) if !s.is_empty() => Value::Array(
                s.split(delimiter.as_str())
                    .map(|part| Value::String(part.to_string()))
                    .collect(),
            ),
            _ => json!([]),
        },
    })
}
