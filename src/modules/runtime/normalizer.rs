//! Response normalization
//!
//! Converts the JSON bodies returned by REST APIs into the canonical result
//! shapes: a sequence of records for `find`, a single record otherwise.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use restbridge_core::CollectionDefinition;
use restbridge_types::Record;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, warn};

/// Strings that look like an ISO-8601 date or date-time
static ISO_DATE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\d{4}-\d{2}-\d{2}(?:[T ]\d{2}:\d{2}(?::\d{2}(?:\.\d+)?)?(?:Z|[+-]\d{2}:?\d{2})?)?$",
    )
    .unwrap()
});

const NAIVE_DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Decoded shape of a response body, in priority order
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseShape {
    /// `{"objects": [...]}`
    Objects(Vec<Value>),
    /// `{"results": [...]}`
    Results(Vec<Value>),
    /// Bare array
    List(Vec<Value>),
    /// Bare object or scalar
    Single(Value),
    /// Empty or non-JSON body
    Empty,
}

impl ResponseShape {
    /// Decode a body: `objects` wins over `results`, which wins over the raw body
    pub fn decode(body: Value) -> Self {
        match body {
            Value::Null => ResponseShape::Empty,
            Value::Array(items) => ResponseShape::List(items),
            Value::Object(mut map) => {
                if map.get("objects").map_or(false, is_present) {
                    let objects = map.remove("objects").unwrap_or(Value::Null);
                    return ResponseShape::Objects(into_list(objects));
                }
                if map.get("results").map_or(false, is_present) {
                    let results = map.remove("results").unwrap_or(Value::Null);
                    return ResponseShape::Results(into_list(results));
                }
                ResponseShape::Single(Value::Object(map))
            }
            other => ResponseShape::Single(other),
        }
    }

    /// Every value of the shape as a sequence
    pub fn into_values(self) -> Vec<Value> {
        match self {
            ResponseShape::Objects(items)
            | ResponseShape::Results(items)
            | ResponseShape::List(items) => items,
            ResponseShape::Single(value) => vec![value],
            ResponseShape::Empty => Vec::new(),
        }
    }
}

/// JSON values that count as "set" when picking a wrapper field
fn is_present(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => false,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        _ => true,
    }
}

fn into_list(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        other => vec![other],
    }
}

fn into_records(values: Vec<Value>) -> Vec<Record> {
    values
        .into_iter()
        .filter_map(|value| match value {
            Value::Object(record) => Some(record),
            other => {
                warn!("Dropping non-object element from response: {}", other);
                None
            }
        })
        .collect()
}

/// Apply `f` to every record of a response body, following the same shape
/// priority as [`ResponseShape::decode`]
pub fn for_each_record(body: &mut Value, f: &mut dyn FnMut(&mut Record)) {
    match body {
        Value::Array(items) => items
            .iter_mut()
            .filter_map(Value::as_object_mut)
            .for_each(|record| f(record)),
        Value::Object(map) => {
            for wrapper in ["objects", "results"] {
                if map.get(wrapper).map_or(false, is_present) {
                    if let Some(inner) = map.get_mut(wrapper) {
                        for_each_record(inner, f);
                    }
                    return;
                }
            }
            f(map)
        }
        _ => {}
    }
}

/// Returns true if a string looks like an ISO-8601 date
pub fn looks_like_iso_date(value: &str) -> bool {
    ISO_DATE_PATTERN.is_match(value)
}

/// Canonical form of an ISO-looking date string, if it parses
pub fn normalize_iso_string(value: &str) -> Option<String> {
    if !looks_like_iso_date(value) {
        return None;
    }
    parse_date_str(value).map(|date| format_date(&date))
}

/// Parse a JSON value as a date
///
/// Accepts RFC 3339 strings, ISO dates and date-times without offset
/// (taken as UTC), and numbers as milliseconds since the epoch.
pub fn parse_date(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_date_str(s.trim()),
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .and_then(DateTime::from_timestamp_millis),
        _ => None,
    }
}

fn parse_date_str(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(dt.with_timezone(&Utc));
    }
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Canonical string form of a date: RFC 3339, millisecond precision, UTC
pub fn format_date(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Cast one date field value
///
/// Absent and empty values become the epoch; unparseable values are left as
/// they are (`None`).
pub fn cast_date(value: Option<&Value>) -> Option<Value> {
    match value {
        Some(v) if is_present(v) => parse_date(v).map(|date| Value::String(format_date(&date))),
        _ => Some(Value::String(format_date(&DateTime::<Utc>::UNIX_EPOCH))),
    }
}

/// Record formatter
pub type RecordFormatter = Arc<dyn Fn(Record) -> Record + Send + Sync>;

/// Record sequence formatter
pub type RecordsFormatter = Arc<dyn Fn(Vec<Record>) -> Vec<Record> + Send + Sync>;

/// Per-connection formatters applied around date casting
#[derive(Clone, Default)]
pub struct ResultFormatters {
    /// Runs on each raw record before date casting
    pub before_result: Option<RecordFormatter>,
    /// Runs on each record after date casting
    pub after_result: Option<RecordFormatter>,
    /// Runs on the raw sequence before per-record formatting
    pub before_results: Option<RecordsFormatter>,
    /// Runs on the formatted sequence
    pub after_results: Option<RecordsFormatter>,
}

impl ResultFormatters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn before_result(mut self, f: impl Fn(Record) -> Record + Send + Sync + 'static) -> Self {
        self.before_result = Some(Arc::new(f));
        self
    }

    pub fn after_result(mut self, f: impl Fn(Record) -> Record + Send + Sync + 'static) -> Self {
        self.after_result = Some(Arc::new(f));
        self
    }

    pub fn before_results(
        mut self,
        f: impl Fn(Vec<Record>) -> Vec<Record> + Send + Sync + 'static,
    ) -> Self {
        self.before_results = Some(Arc::new(f));
        self
    }

    pub fn after_results(
        mut self,
        f: impl Fn(Vec<Record>) -> Vec<Record> + Send + Sync + 'static,
    ) -> Self {
        self.after_results = Some(Arc::new(f));
        self
    }
}

impl std::fmt::Debug for ResultFormatters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultFormatters")
            .field("before_result", &self.before_result.is_some())
            .field("after_result", &self.after_result.is_some())
            .field("before_results", &self.before_results.is_some())
            .field("after_results", &self.after_results.is_some())
            .finish()
    }
}

/// Normalizes response bodies for one collection
pub struct Normalizer<'a> {
    definition: Option<&'a CollectionDefinition>,
    formatters: &'a ResultFormatters,
}

impl<'a> Normalizer<'a> {
    pub fn new(definition: Option<&'a CollectionDefinition>, formatters: &'a ResultFormatters) -> Self {
        Self {
            definition,
            formatters,
        }
    }

    /// Normalize a body into a sequence of records
    pub fn to_collection(&self, body: Value) -> Vec<Record> {
        let shape = ResponseShape::decode(body);
        debug!("Normalizing response shape {:?}", shape_name(&shape));

        let mut records = into_records(shape.into_values());
        if let Some(before) = &self.formatters.before_results {
            records = before(records);
        }

        let records: Vec<Record> = records.into_iter().map(|r| self.format(r)).collect();

        match &self.formatters.after_results {
            Some(after) => after(records),
            None => records,
        }
    }

    /// Normalize a body into a single record
    ///
    /// Wrapped or bare sequences yield their first record; empty bodies yield
    /// an empty record.
    pub fn to_record(&self, body: Value) -> Record {
        let record = match ResponseShape::decode(body) {
            ResponseShape::Single(Value::Object(record)) => record,
            ResponseShape::Empty => Map::new(),
            shape => into_records(shape.into_values())
                .into_iter()
                .next()
                .unwrap_or_default(),
        };
        self.format(record)
    }

    fn format(&self, mut record: Record) -> Record {
        if let Some(before) = &self.formatters.before_result {
            record = before(record);
        }

        if let Some(definition) = self.definition {
            for field in definition.date_fields() {
                if let Some(cast) = cast_date(record.get(field)) {
                    record.insert(field.to_string(), cast);
                }
            }
        }

        match &self.formatters.after_result {
            Some(after) => after(record),
            None => record,
        }
    }
}

fn shape_name(shape: &ResponseShape) -> &'static str {
    match shape {
        ResponseShape::Objects(_) => "objects",
        ResponseShape::Results(_) => "results",
        ResponseShape::List(_) => "list",
        ResponseShape::Single(_) => "single",
        ResponseShape::Empty => "empty",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn plain() -> ResultFormatters {
        ResultFormatters::new()
    }

    #[test]
    fn test_all_shapes_normalize_to_sequence() {
        let formatters = plain();
        let normalizer = Normalizer::new(None, &formatters);
        let expected = vec![json!({"id": 1}).as_object().cloned().unwrap()];

        for body in [
            json!([{"id": 1}]),
            json!({"objects": [{"id": 1}]}),
            json!({"results": [{"id": 1}]}),
            json!({"id": 1}),
        ] {
            assert_eq!(normalizer.to_collection(body), expected);
        }
    }

    #[test]
    fn test_objects_wins_over_results() {
        let shape = ResponseShape::decode(json!({"results": [{"id": 2}], "objects": [{"id": 1}]}));
        assert_eq!(shape, ResponseShape::Objects(vec![json!({"id": 1})]));
    }

    #[test]
    fn test_empty_wrapper_falls_through() {
        let shape = ResponseShape::decode(json!({"objects": null, "results": [{"id": 1}]}));
        assert_eq!(shape, ResponseShape::Results(vec![json!({"id": 1})]));

        // An empty array is still a present wrapper
        let shape = ResponseShape::decode(json!({"objects": [], "results": [{"id": 1}]}));
        assert_eq!(shape, ResponseShape::Objects(vec![]));
    }

    #[test]
    fn test_null_body_is_empty_sequence() {
        let formatters = plain();
        let normalizer = Normalizer::new(None, &formatters);
        assert!(normalizer.to_collection(Value::Null).is_empty());
        assert!(normalizer.to_record(Value::Null).is_empty());
    }

    #[test]
    fn test_non_object_elements_are_dropped() {
        let formatters = plain();
        let normalizer = Normalizer::new(None, &formatters);
        let records = normalizer.to_collection(json!([{"id": 1}, 7, "x"]));
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_to_record_takes_first_of_sequence() {
        let formatters = plain();
        let normalizer = Normalizer::new(None, &formatters);
        let record = normalizer.to_record(json!({"results": [{"id": 3}, {"id": 4}]}));
        assert_eq!(record["id"], json!(3));
    }

    #[test]
    fn test_date_casting() {
        let definition = CollectionDefinition::new()
            .with_attribute("createdAt", "date")
            .with_attribute("name", "string");
        let formatters = plain();
        let normalizer = Normalizer::new(Some(&definition), &formatters);

        let record = normalizer.to_record(json!({"createdAt": "2020-01-01T00:00:00Z", "name": "a"}));
        assert_eq!(record["createdAt"], json!("2020-01-01T00:00:00.000Z"));
        assert_eq!(
            parse_date(&record["createdAt"]).unwrap(),
            "2020-01-01T00:00:00Z".parse::<DateTime<Utc>>().unwrap()
        );
        assert_eq!(record["name"], json!("a"));

        let record = normalizer.to_record(json!({"createdAt": null}));
        assert_eq!(record["createdAt"], json!("1970-01-01T00:00:00.000Z"));

        let record = normalizer.to_record(json!({"name": "b"}));
        assert_eq!(record["createdAt"], json!("1970-01-01T00:00:00.000Z"));
    }

    #[test]
    fn test_unparseable_date_is_left_alone() {
        let definition = CollectionDefinition::new().with_attribute("createdAt", "datetime");
        let formatters = plain();
        let normalizer = Normalizer::new(Some(&definition), &formatters);

        let record = normalizer.to_record(json!({"createdAt": "yesterday"}));
        assert_eq!(record["createdAt"], json!("yesterday"));
    }

    #[test]
    fn test_parse_date_variants() {
        let expected = "2021-03-04T05:06:07Z".parse::<DateTime<Utc>>().unwrap();
        assert_eq!(parse_date(&json!("2021-03-04T05:06:07Z")), Some(expected));
        assert_eq!(parse_date(&json!("2021-03-04T07:06:07+02:00")), Some(expected));
        assert_eq!(parse_date(&json!("2021-03-04 05:06:07")), Some(expected));
        assert_eq!(parse_date(&json!(expected.timestamp_millis())), Some(expected));
        assert_eq!(
            parse_date(&json!("2021-03-04")),
            Some("2021-03-04T00:00:00Z".parse::<DateTime<Utc>>().unwrap())
        );
        assert_eq!(parse_date(&json!(true)), None);
    }

    #[test]
    fn test_iso_pattern() {
        assert!(looks_like_iso_date("2020-01-01"));
        assert!(looks_like_iso_date("2020-01-01T10:00:00.123Z"));
        assert!(looks_like_iso_date("2020-01-01 10:00"));
        assert!(looks_like_iso_date("2020-01-01T10:00:00+0200"));
        assert!(!looks_like_iso_date("20200101"));
        assert!(!looks_like_iso_date("hello 2020-01-01"));
    }

    #[test]
    fn test_formatters_run_around_casting() {
        let definition = CollectionDefinition::new().with_attribute("createdAt", "date");
        let formatters = ResultFormatters::new()
            .before_result(|mut record| {
                if let Some(created) = record.remove("created_at") {
                    record.insert("createdAt".to_string(), created);
                }
                record
            })
            .after_result(|mut record| {
                let created = record["createdAt"].clone();
                record.insert("seen".to_string(), created);
                record
            })
            .after_results(|mut records| {
                records.reverse();
                records
            });
        let normalizer = Normalizer::new(Some(&definition), &formatters);

        let records = normalizer.to_collection(json!([
            {"id": 1, "created_at": "2020-01-01"},
            {"id": 2}
        ]));
        assert_eq!(records[0]["id"], json!(2));
        assert_eq!(records[1]["createdAt"], json!("2020-01-01T00:00:00.000Z"));
        assert_eq!(records[1]["seen"], json!("2020-01-01T00:00:00.000Z"));
    }

    #[test]
    fn test_for_each_record_follows_wrappers() {
        let mut body = json!({"results": [{"a": 1}, {"a": 2}], "total": 2});
        let mut seen = 0;
        for_each_record(&mut body, &mut |record: &mut Record| {
            record.insert("seen".to_string(), json!(true));
            seen += 1;
        });
        assert_eq!(seen, 2);
        assert_eq!(body["results"][1]["seen"], json!(true));
        assert!(body.get("seen").is_none());
    }
}
