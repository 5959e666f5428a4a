use crate::endpoint;
use crate::error::KpiError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Number of leading timestamp characters that form the UTC calendar date.
const DATE_PREFIX_LEN: usize = 10;

/// One access-log record, validated once at ingestion by
/// [`RawRecord::from_value`].
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    /// ISO-8601 date-time; only the `YYYY-MM-DD` prefix is used for grouping.
    pub timestamp_utc: String,
    pub endpoint: String,
    /// Any integer; codes outside the three buckets count as [`StatusClass::Other`].
    pub status_code: i64,
    pub elapsed_ms: f64,
    /// `"ok"`, or anything else for an upstream parse failure.
    pub parse_result: String,
}

/// Status bucket a record counts towards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    Success,
    ClientError,
    ServerError,
    /// 1xx, 3xx, ≥ 600, and anything negative. Counted by no bucket.
    Other,
}

impl StatusClass {
    pub fn of(status_code: i64) -> Self {
        match status_code {
            200..=299 => StatusClass::Success,
            400..=499 => StatusClass::ClientError,
            500..=599 => StatusClass::ServerError,
            _ => StatusClass::Other,
        }
    }
}

impl RawRecord {
    /// Validate a parsed JSON value against the record schema.
    ///
    /// `line` is the 1-based input line the value came from and is carried
    /// into the error. Extra fields are ignored.
    pub fn from_value(line: usize, value: &Value) -> Result<Self, KpiError> {
        let obj = value.as_object().ok_or_else(|| KpiError::Schema {
            line,
            field: "<record>",
            reason: "is not a JSON object".into(),
        })?;

        let status = required(obj, line, "status_code")?;
        let status_code = integer(status)
            .ok_or_else(|| schema(line, "status_code", "must be an integer", status))?;

        let elapsed = required(obj, line, "elapsed_ms")?;
        let elapsed_ms = elapsed
            .as_f64()
            .ok_or_else(|| schema(line, "elapsed_ms", "must be a number", elapsed))?;

        Ok(Self {
            timestamp_utc: required_str(obj, line, "timestamp_utc")?,
            endpoint: required_str(obj, line, "endpoint")?,
            status_code,
            elapsed_ms,
            parse_result: required_str(obj, line, "parse_result")?,
        })
    }

    /// Calendar date part of the timestamp (first 10 characters).
    pub fn date_utc(&self) -> &str {
        match self.timestamp_utc.char_indices().nth(DATE_PREFIX_LEN) {
            Some((idx, _)) => &self.timestamp_utc[..idx],
            None => &self.timestamp_utc,
        }
    }

    pub fn endpoint_base(&self) -> &str {
        endpoint::normalize(&self.endpoint)
    }

    pub fn status_class(&self) -> StatusClass {
        StatusClass::of(self.status_code)
    }

    pub fn is_parse_error(&self) -> bool {
        self.parse_result != "ok"
    }

    pub fn group_key(&self) -> GroupKey {
        GroupKey {
            date_utc: self.date_utc().to_string(),
            endpoint_base: self.endpoint_base().to_string(),
        }
    }
}

fn required<'a>(
    obj: &'a Map<String, Value>,
    line: usize,
    field: &'static str,
) -> Result<&'a Value, KpiError> {
    match obj.get(field) {
        Some(Value::Null) | None => Err(KpiError::Schema {
            line,
            field,
            reason: "is missing".into(),
        }),
        Some(v) => Ok(v),
    }
}

/// JSON integers, and floats with no fractional part (`403.0`).
/// Out-of-range values saturate, which keeps them out of every bucket.
fn integer(v: &Value) -> Option<i64> {
    if let Some(n) = v.as_i64() {
        return Some(n);
    }
    match v.as_f64() {
        Some(f) if f.fract() == 0.0 => Some(f as i64),
        _ => None,
    }
}

fn required_str(
    obj: &Map<String, Value>,
    line: usize,
    field: &'static str,
) -> Result<String, KpiError> {
    let v = required(obj, line, field)?;
    v.as_str()
        .map(str::to_string)
        .ok_or_else(|| schema(line, field, "must be a string", v))
}

fn schema(line: usize, field: &'static str, expected: &str, got: &Value) -> KpiError {
    KpiError::Schema {
        line,
        field,
        reason: format!("{expected}, got {got}"),
    }
}

/// Grouping key: `(date_utc, endpoint_base)`. Orders by date, then endpoint.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupKey {
    pub date_utc: String,
    pub endpoint_base: String,
}

/// One KPI row per group key. Field order is the output column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub date_utc: String,
    pub endpoint_base: String,
    pub requests_total: u64,
    pub success_2xx: u64,
    pub client_4xx: u64,
    pub server_5xx: u64,
    pub parse_errors: u64,
    pub avg_elapsed_ms: f64,
    pub p90_elapsed_ms: f64,
}

impl SummaryRow {
    /// Column names, in output order.
    pub const COLUMNS: [&'static str; 9] = [
        "date_utc",
        "endpoint_base",
        "requests_total",
        "success_2xx",
        "client_4xx",
        "server_5xx",
        "parse_errors",
        "avg_elapsed_ms",
        "p90_elapsed_ms",
    ];
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid() -> Value {
        json!({
            "timestamp_utc": "2024-01-01T10:00:00Z",
            "endpoint": "/status/403",
            "status_code": 403,
            "elapsed_ms": 120,
            "parse_result": "ok"
        })
    }

    #[test]
    fn from_value_accepts_valid_record() {
        let rec = RawRecord::from_value(1, &valid()).unwrap();
        assert_eq!(rec.status_code, 403);
        assert_eq!(rec.elapsed_ms, 120.0);
        assert_eq!(rec.date_utc(), "2024-01-01");
        assert_eq!(rec.endpoint_base(), "/status");
        assert!(!rec.is_parse_error());
    }

    #[test]
    fn from_value_ignores_extra_fields() {
        let mut v = valid();
        v["request_id"] = json!("abc");
        assert!(RawRecord::from_value(1, &v).is_ok());
    }

    #[test]
    fn missing_field_is_schema_error() {
        let mut v = valid();
        v.as_object_mut().unwrap().remove("elapsed_ms");
        match RawRecord::from_value(7, &v) {
            Err(KpiError::Schema { line, field, .. }) => {
                assert_eq!(line, 7);
                assert_eq!(field, "elapsed_ms");
            }
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn null_field_counts_as_missing() {
        let mut v = valid();
        v["endpoint"] = Value::Null;
        let err = RawRecord::from_value(1, &v).unwrap_err();
        assert!(matches!(err, KpiError::Schema { field: "endpoint", .. }));
    }

    #[test]
    fn wrong_typed_status_code_is_schema_error() {
        let mut v = valid();
        v["status_code"] = json!("403");
        let err = RawRecord::from_value(1, &v).unwrap_err();
        assert!(matches!(err, KpiError::Schema { field: "status_code", .. }));

        v["status_code"] = json!(403.5);
        assert!(RawRecord::from_value(1, &v).is_err());
    }

    #[test]
    fn integral_float_status_code_is_accepted() {
        let mut v = valid();
        v["status_code"] = json!(403.0);
        let rec = RawRecord::from_value(1, &v).unwrap();
        assert_eq!(rec.status_code, 403);
        assert_eq!(rec.status_class(), StatusClass::ClientError);
    }

    #[test]
    fn out_of_range_status_codes_are_other() {
        let mut v = valid();
        for code in [json!(-1), json!(70_000), json!(u64::MAX), json!(1e300)] {
            v["status_code"] = code;
            let rec = RawRecord::from_value(1, &v).unwrap();
            assert_eq!(rec.status_class(), StatusClass::Other);
        }
    }

    #[test]
    fn duplicate_key_keeps_last_value() {
        let v: Value = serde_json::from_str(
            r#"{"timestamp_utc":"2024-01-01T00:00:00Z","endpoint":"/get","status_code":200,"status_code":404,"elapsed_ms":1,"parse_result":"ok"}"#,
        )
        .unwrap();
        let rec = RawRecord::from_value(1, &v).unwrap();
        assert_eq!(rec.status_code, 404);
    }

    #[test]
    fn wrong_typed_elapsed_is_schema_error() {
        let mut v = valid();
        v["elapsed_ms"] = json!("fast");
        let err = RawRecord::from_value(1, &v).unwrap_err();
        assert!(matches!(err, KpiError::Schema { field: "elapsed_ms", .. }));
    }

    #[test]
    fn non_object_is_schema_error() {
        let err = RawRecord::from_value(3, &json!([1, 2])).unwrap_err();
        assert!(matches!(err, KpiError::Schema { line: 3, .. }));
    }

    #[test]
    fn short_timestamp_is_used_whole() {
        let mut v = valid();
        v["timestamp_utc"] = json!("2024-01");
        let rec = RawRecord::from_value(1, &v).unwrap();
        assert_eq!(rec.date_utc(), "2024-01");
    }

    #[test]
    fn status_classes() {
        assert_eq!(StatusClass::of(200), StatusClass::Success);
        assert_eq!(StatusClass::of(299), StatusClass::Success);
        assert_eq!(StatusClass::of(404), StatusClass::ClientError);
        assert_eq!(StatusClass::of(503), StatusClass::ServerError);
        assert_eq!(StatusClass::of(101), StatusClass::Other);
        assert_eq!(StatusClass::of(302), StatusClass::Other);
        assert_eq!(StatusClass::of(600), StatusClass::Other);
        assert_eq!(StatusClass::of(-200), StatusClass::Other);
    }

    #[test]
    fn any_non_ok_parse_result_is_an_error() {
        let mut v = valid();
        v["parse_result"] = json!("error");
        assert!(RawRecord::from_value(1, &v).unwrap().is_parse_error());
        v["parse_result"] = json!("OK");
        assert!(RawRecord::from_value(1, &v).unwrap().is_parse_error());
    }

    #[test]
    fn group_keys_order_by_date_then_endpoint() {
        let a = GroupKey { date_utc: "2024-01-01".into(), endpoint_base: "/status".into() };
        let b = GroupKey { date_utc: "2024-01-01".into(), endpoint_base: "/xml".into() };
        let c = GroupKey { date_utc: "2024-01-02".into(), endpoint_base: "/get".into() };
        assert!(a < b);
        assert!(b < c);
    }
}
