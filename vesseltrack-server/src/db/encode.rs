//! Row to JSON record conversion
//!
//! Columns are discovered from the result metadata; every projected
//! column is emitted under its own name in projection order. Values are
//! decoded by PostgreSQL type name into a fixed JSON shape.
//!
//! A cell that cannot be represented never fails the row: it becomes
//! `null` and is logged.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::{Number, Value};
use sqlx::postgres::types::PgInterval;
use sqlx::postgres::{PgRow, PgValueFormat, PgValueRef};
use sqlx::{Column, Decode, Postgres, Row, Type, TypeInfo, ValueRef};
use uuid::Uuid;

use crate::models::PositionRecord;

/// Convert one row into a record, skipping any column named in `hidden`.
pub fn encode_row(row: &PgRow, hidden: &[&str]) -> PositionRecord {
    let mut record = PositionRecord::with_capacity(row.len());

    for column in row.columns() {
        if hidden.contains(&column.name()) {
            continue;
        }
        let value = decode_column(row, column.ordinal(), column.type_info().name())
            .unwrap_or_else(|e| unrepresentable(column.name(), column.type_info().name(), &e));
        record.insert(column.name().to_owned(), value);
    }

    record
}

fn unrepresentable(column: &str, pg_type: &str, error: &dyn std::fmt::Display) -> Value {
    tracing::warn!(column, pg_type, error = %error, "column value not representable, emitting null");
    Value::Null
}

fn decode_column(row: &PgRow, index: usize, type_name: &str) -> Result<Value, sqlx::Error> {
    let raw = row.try_get_raw(index)?;
    if raw.is_null() {
        return Ok(Value::Null);
    }

    let value = match type_name {
        "BOOL" => Value::Bool(row.try_get(index)?),
        "INT2" => Value::from(row.try_get::<i16, _>(index)?),
        "INT4" => Value::from(row.try_get::<i32, _>(index)?),
        "INT8" => Value::from(row.try_get::<i64, _>(index)?),
        "FLOAT4" => float4_value(row.try_get(index)?),
        "FLOAT8" => float8_value(row.try_get(index)?),
        "NUMERIC" => match row.try_get::<Decimal, _>(index) {
            Ok(d) => numeric_value(d),
            // NaN, infinities and values past 28 digits
            Err(_) => numeric_text_value(&numeric_text(raw)?),
        },
        "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" => Value::String(row.try_get(index)?),
        "\"CHAR\"" => char_value(row.try_get(index)?),
        "TIMESTAMP" => timestamp_value(row.try_get(index)?),
        "TIMESTAMPTZ" => timestamptz_value(row.try_get(index)?),
        "DATE" => date_value(row.try_get(index)?),
        "TIME" => time_value(row.try_get(index)?),
        "INTERVAL" => interval_value(row.try_get(index)?),
        "UUID" => Value::String(row.try_get::<Uuid, _>(index)?.to_string()),
        "JSON" | "JSONB" => row.try_get::<Value, _>(index)?,
        "BYTEA" => bytea_value(&row.try_get::<Vec<u8>, _>(index)?),
        "BOOL[]" => array_value(row, index, Value::Bool)?,
        "INT2[]" => array_value(row, index, |v: i16| Value::from(v))?,
        "INT4[]" => array_value(row, index, |v: i32| Value::from(v))?,
        "INT8[]" => array_value(row, index, |v: i64| Value::from(v))?,
        "FLOAT4[]" => array_value(row, index, float4_value)?,
        "FLOAT8[]" => array_value(row, index, float8_value)?,
        "TEXT[]" | "VARCHAR[]" | "BPCHAR[]" | "NAME[]" => array_value(row, index, Value::String)?,
        other => match raw.format() {
            PgValueFormat::Text => Value::String(row.try_get_unchecked(index)?),
            // Binary wire bytes are not text; never pass them off as a string
            PgValueFormat::Binary => {
                return Err(sqlx::Error::Decode(
                    format!("no JSON mapping for binary {other} values").into(),
                ))
            }
        },
    };

    Ok(value)
}

fn array_value<T, F>(row: &PgRow, index: usize, element: F) -> Result<Value, sqlx::Error>
where
    Vec<Option<T>>: for<'r> Decode<'r, Postgres> + Type<Postgres>,
    F: Fn(T) -> Value,
{
    let items: Vec<Option<T>> = row.try_get(index)?;
    Ok(Value::Array(
        items
            .into_iter()
            .map(|item| item.map(&element).unwrap_or(Value::Null))
            .collect(),
    ))
}

/// `real` goes through its shortest decimal form so `1.1` stays `1.1`.
pub fn float4_value(f: f32) -> Value {
    f.to_string()
        .parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

/// Non-finite floats have no JSON form and become `null`.
pub fn float8_value(f: f64) -> Value {
    Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
}

/// Integral numerics that fit i64 become JSON integers, others the
/// nearest JSON float to their decimal text.
pub fn numeric_value(d: Decimal) -> Value {
    if d.scale() == 0 {
        if let Some(i) = d.to_i64() {
            return Value::from(i);
        }
    }

    d.to_string()
        .parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(d.to_string()))
}

/// Same shape as [`numeric_value`] for numerics outside `Decimal`'s
/// range; `NaN` and the infinities stay strings.
pub fn numeric_text_value(text: &str) -> Value {
    if let Ok(i) = text.parse::<i64>() {
        return Value::from(i);
    }

    text.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(text.to_owned()))
}

fn numeric_text(raw: PgValueRef<'_>) -> Result<String, sqlx::Error> {
    match raw.format() {
        PgValueFormat::Text => raw.as_str().map(str::to_owned).map_err(sqlx::Error::Decode),
        PgValueFormat::Binary => {
            let bytes = raw.as_bytes().map_err(sqlx::Error::Decode)?;
            numeric_binary_text(bytes)
                .ok_or_else(|| sqlx::Error::Decode("malformed binary numeric".into()))
        }
    }
}

/// Render a binary `numeric` (base-10000 digit groups) as decimal text.
pub fn numeric_binary_text(buf: &[u8]) -> Option<String> {
    let word = |i: usize| {
        buf.get(i * 2..i * 2 + 2)
            .map(|b| u16::from_be_bytes([b[0], b[1]]))
    };

    let ndigits = usize::from(word(0)?);
    let weight = i32::from(word(1)? as i16);
    let sign = word(2)?;
    let dscale = usize::from(word(3)?);

    match sign {
        0x0000 | 0x4000 => {}
        0xC000 => return Some("NaN".to_owned()),
        0xD000 => return Some("Infinity".to_owned()),
        0xF000 => return Some("-Infinity".to_owned()),
        _ => return None,
    }

    let digits = (0..ndigits)
        .map(|i| word(4 + i))
        .collect::<Option<Vec<u16>>>()?;
    let digit = |i: i32| {
        usize::try_from(i)
            .ok()
            .and_then(|i| digits.get(i).copied())
            .unwrap_or(0)
    };

    let mut out = String::new();
    if sign == 0x4000 {
        out.push('-');
    }

    if weight < 0 {
        out.push('0');
    } else {
        out.push_str(&digit(0).to_string());
        for i in 1..=weight {
            out.push_str(&format!("{:04}", digit(i)));
        }
    }

    if dscale > 0 {
        let groups = dscale.div_ceil(4) as i32;
        let mut fraction: String = (1..=groups)
            .map(|k| format!("{:04}", digit(weight + k)))
            .collect();
        fraction.truncate(dscale);
        out.push('.');
        out.push_str(&fraction);
    }

    Some(out)
}

/// The single-byte `"char"` type.
pub fn char_value(c: i8) -> Value {
    Value::String(char::from(c as u8).to_string())
}

/// `YYYY-MM-DDTHH:MM:SS`, with a fraction only when non-zero.
pub fn timestamp_value(ts: NaiveDateTime) -> Value {
    Value::String(ts.format("%Y-%m-%dT%H:%M:%S%.f").to_string())
}

/// RFC 3339 in UTC with a `Z` suffix.
pub fn timestamptz_value(ts: DateTime<Utc>) -> Value {
    Value::String(ts.to_rfc3339_opts(SecondsFormat::AutoSi, true))
}

pub fn date_value(d: NaiveDate) -> Value {
    Value::String(d.format("%Y-%m-%d").to_string())
}

pub fn time_value(t: NaiveTime) -> Value {
    Value::String(t.format("%H:%M:%S%.f").to_string())
}

/// ISO 8601 duration, zero components omitted: `P1M2DT3600.5S`.
pub fn interval_value(iv: PgInterval) -> Value {
    let mut out = String::from("P");
    if iv.months != 0 {
        out.push_str(&format!("{}M", iv.months));
    }
    if iv.days != 0 {
        out.push_str(&format!("{}D", iv.days));
    }
    if iv.microseconds != 0 || out.len() == 1 {
        let sign = if iv.microseconds < 0 { "-" } else { "" };
        let micros = iv.microseconds.unsigned_abs();
        let (secs, frac) = (micros / 1_000_000, micros % 1_000_000);
        out.push_str(&format!("T{sign}{secs}"));
        if frac != 0 {
            let frac = format!("{frac:06}");
            out.push('.');
            out.push_str(frac.trim_end_matches('0'));
        }
        out.push('S');
    }
    Value::String(out)
}

/// PostgreSQL's own hex output form: `\xdeadbeef`.
pub fn bytea_value(bytes: &[u8]) -> Value {
    Value::String(format!("\\x{}", hex::encode(bytes)))
}
