//! Bindable parameter values.
//!
//! Payloads arrive loosely typed (JSON bodies, query strings), so a single
//! [`SqlValue`] carries whatever scalar the caller sent and converts it to the
//! parameter type Postgres inferred for its placeholder at bind time.

use bytes::BytesMut;
use rust_decimal::Decimal;
use serde_json::Value;
use std::error::Error;
use std::str::FromStr;
use tokio_postgres::types::{IsNull, ToSql, Type};

type BindResult = Result<IsNull, Box<dyn Error + Sync + Send>>;

/// A scalar bound to a `$n` placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// SQL `NULL`, valid for any parameter type.
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    /// Integers beyond `i64`, kept exact.
    Numeric(Decimal),
    Text(String),
    /// Arrays and objects, bound as `json`/`jsonb`.
    Json(Value),
}

impl SqlValue {
    /// Convert a JSON value, keeping integers exact where possible.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(*b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::Int(i)
                } else if let Some(u) = n.as_u64() {
                    Self::Numeric(Decimal::from(u))
                } else {
                    Self::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            Value::String(s) => Self::Text(s.clone()),
            Value::Array(_) | Value::Object(_) => Self::Json(value.clone()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Interpret the value as a boolean flag.
    ///
    /// Only `true`/`false` and the strings `"true"`/`"false"` qualify.
    pub fn as_flag(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::Text(s) if s == "true" => Some(true),
            Self::Text(s) if s == "false" => Some(false),
            _ => None,
        }
    }
}

fn is_text(ty: &Type) -> bool {
    matches!(
        *ty,
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME | Type::UNKNOWN
    )
}

fn is_json(ty: &Type) -> bool {
    matches!(*ty, Type::JSON | Type::JSONB)
}

fn mismatch(value: &SqlValue, ty: &Type) -> Box<dyn Error + Sync + Send> {
    format!("cannot bind {value:?} as a {ty} parameter").into()
}

fn bind_int(i: i64, ty: &Type, out: &mut BytesMut) -> Option<BindResult> {
    let res = match *ty {
        Type::INT2 => i16::try_from(i)
            .map_err(Into::into)
            .and_then(|v| v.to_sql(ty, out)),
        Type::INT4 => i32::try_from(i)
            .map_err(Into::into)
            .and_then(|v| v.to_sql(ty, out)),
        Type::INT8 => i.to_sql(ty, out),
        Type::FLOAT4 => (i as f32).to_sql(ty, out),
        Type::FLOAT8 => (i as f64).to_sql(ty, out),
        Type::NUMERIC => Decimal::from(i).to_sql(ty, out),
        _ => return None,
    };
    Some(res)
}

fn bind_float(f: f64, ty: &Type, out: &mut BytesMut) -> Option<BindResult> {
    let res = match *ty {
        Type::FLOAT4 => (f as f32).to_sql(ty, out),
        Type::FLOAT8 => f.to_sql(ty, out),
        Type::NUMERIC => Decimal::try_from(f)
            .map_err(Into::into)
            .and_then(|d| d.to_sql(ty, out)),
        _ => return None,
    };
    Some(res)
}

impl ToSql for SqlValue {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> BindResult {
        match self {
            Self::Null => Ok(IsNull::Yes),
            Self::Bool(b) if *ty == Type::BOOL => b.to_sql(ty, out),
            Self::Bool(b) if is_text(ty) => b.to_string().to_sql(ty, out),
            Self::Bool(b) if is_json(ty) => Value::Bool(*b).to_sql(ty, out),
            Self::Int(i) if is_text(ty) => i.to_string().to_sql(ty, out),
            Self::Int(i) if is_json(ty) => Value::from(*i).to_sql(ty, out),
            Self::Int(i) => bind_int(*i, ty, out).unwrap_or_else(|| Err(mismatch(self, ty))),
            Self::Float(f) if is_text(ty) => f.to_string().to_sql(ty, out),
            Self::Float(f) if is_json(ty) => Value::from(*f).to_sql(ty, out),
            Self::Float(f) => bind_float(*f, ty, out).unwrap_or_else(|| Err(mismatch(self, ty))),
            Self::Numeric(d) if *ty == Type::NUMERIC => d.to_sql(ty, out),
            Self::Numeric(d) if is_text(ty) => d.to_string().to_sql(ty, out),
            Self::Numeric(d) if is_json(ty) => d.to_string().parse::<Value>()?.to_sql(ty, out),
            Self::Numeric(d) => {
                let i = i64::try_from(*d)?;
                bind_int(i, ty, out).unwrap_or_else(|| Err(mismatch(self, ty)))
            }
            Self::Text(s) if is_text(ty) => s.to_sql(ty, out),
            Self::Text(s) if is_json(ty) => Value::String(s.clone()).to_sql(ty, out),
            // Query strings carry numbers and flags as text.
            Self::Text(s) => match *ty {
                Type::BOOL => s.trim().parse::<bool>()?.to_sql(ty, out),
                Type::NUMERIC => Decimal::from_str(s.trim())?.to_sql(ty, out),
                Type::INT2 | Type::INT4 | Type::INT8 => {
                    let i: i64 = s.trim().parse()?;
                    bind_int(i, ty, out).unwrap_or_else(|| Err(mismatch(self, ty)))
                }
                Type::FLOAT4 | Type::FLOAT8 => {
                    let f: f64 = s.trim().parse()?;
                    bind_float(f, ty, out).unwrap_or_else(|| Err(mismatch(self, ty)))
                }
                _ => Err(mismatch(self, ty)),
            },
            Self::Json(v) if is_json(ty) => v.to_sql(ty, out),
            Self::Json(v) if is_text(ty) => v.to_string().to_sql(ty, out),
            _ => Err(mismatch(self, ty)),
        }
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    fn to_sql_checked(&self, ty: &Type, out: &mut BytesMut) -> BindResult {
        self.to_sql(ty, out)
    }
}

impl From<&Value> for SqlValue {
    fn from(value: &Value) -> Self {
        Self::from_json(value)
    }
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for SqlValue {
    fn from(value: i32) -> Self {
        Self::Int(value.into())
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}
