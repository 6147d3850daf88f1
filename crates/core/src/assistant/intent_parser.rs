//! Parse-and-validate boundary for intent classifier output
//!
//! Raw model text never reaches the dispatcher. It is reduced to the `{...}`
//! block, deserialized into a lenient shape, and then converted into a typed
//! [`IntentAction`]. Structural problems are errors (the degrading decorator
//! turns them into general conversation); bad field values become a
//! clarification question instead.

use aura_domain::constants::{MAX_IMPORTANCE, MIN_IMPORTANCE};
use aura_domain::{
    AuraError, EventDraft, EventPatch, EventSelector, Intent, IntentAction, IntentResult,
    QueryRequest, Result,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

static JSON_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\{.*\}").expect("JSON_BLOCK should compile - this is a bug"));

const DATETIME_FORMATS: [&str; 4] =
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"];

/// The outermost `{...}` span of `raw`, if any.
pub fn extract_json_block(raw: &str) -> Option<&str> {
    JSON_BLOCK.find(raw).map(|m| m.as_str())
}

#[derive(Debug, Default, Deserialize)]
struct RawIntentResponse {
    intent: Option<String>,
    #[serde(default)]
    confidence: Option<Value>,
    #[serde(default)]
    event_details: Option<RawEventDetails>,
    #[serde(default)]
    needs_clarification: Option<Value>,
    #[serde(default)]
    clarification_question: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawEventDetails {
    event_id: Option<Value>,
    title: Option<String>,
    description: Option<String>,
    start_time: Option<String>,
    end_time: Option<String>,
    date: Option<String>,
    location: Option<String>,
    importance: Option<Value>,
}

/// A timestamp as the model wrote it: with or without a time of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedTime {
    At(NaiveDateTime),
    Day(NaiveDate),
}

/// Parse ISO-like timestamps. Offsets are dropped and the wall-clock time
/// kept.
pub fn parse_timestamp(value: &str) -> Option<ParsedTime> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(ParsedTime::At(parsed.naive_local()));
    }
    for format in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, format) {
            return Some(ParsedTime::At(parsed));
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok().map(ParsedTime::Day)
}

/// Accept an integer `1..=5` or a level label.
pub fn parse_importance_value(value: &Value) -> Option<u8> {
    match value {
        Value::Number(number) => number
            .as_u64()
            .and_then(|n| u8::try_from(n).ok())
            .filter(|n| (MIN_IMPORTANCE..=MAX_IMPORTANCE).contains(n)),
        Value::String(text) => {
            let text = text.trim();
            text.parse::<u8>()
                .ok()
                .filter(|n| (MIN_IMPORTANCE..=MAX_IMPORTANCE).contains(n))
                .or_else(|| importance_from_level(text))
        }
        _ => None,
    }
}

/// `critical`=5, `high`=4, `medium`=3, `low`=2.
pub fn importance_from_level(level: &str) -> Option<u8> {
    match level.trim().to_lowercase().as_str() {
        "critical" => Some(5),
        "high" => Some(4),
        "medium" => Some(3),
        "low" => Some(2),
        _ => None,
    }
}

/// Parse raw classifier text into a validated [`IntentResult`].
pub fn parse_intent_response(raw: &str) -> Result<IntentResult> {
    let block = extract_json_block(raw)
        .ok_or_else(|| AuraError::External("classifier response contained no JSON object".into()))?;
    let parsed: RawIntentResponse = serde_json::from_str(block)
        .map_err(|e| AuraError::External(format!("classifier response is not valid JSON: {e}")))?;
    let label = parsed
        .intent
        .as_deref()
        .ok_or_else(|| AuraError::External("classifier response is missing `intent`".into()))?;

    let intent = Intent::from_label(label);
    let details = parsed.event_details.unwrap_or_default();
    let mut issues = Issues::default();
    let action = build_action(intent, details, &mut issues);

    let confidence = parsed.confidence.as_ref().map_or(1.0, confidence_value);
    let mut result = IntentResult::new(action).with_confidence(confidence);

    if let Some(question) = issues.question {
        result = result.with_clarification(question);
    } else if parsed.needs_clarification.as_ref().is_some_and(truthy) {
        result.needs_clarification = true;
        result.clarification_question =
            parsed.clarification_question.filter(|q| !q.trim().is_empty());
    }
    Ok(result)
}

#[derive(Default)]
struct Issues {
    question: Option<String>,
}

impl Issues {
    fn flag(&mut self, question: String) {
        self.question.get_or_insert(question);
    }

    fn event_id(&mut self, value: Option<&Value>) -> Option<i64> {
        let value = value.filter(|v| !v.is_null())?;
        let id = match value {
            Value::Number(number) => number
                .as_i64()
                .or_else(|| number.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
            Value::String(text) => text.trim().parse::<i64>().ok(),
            _ => None,
        };
        if id.is_none() {
            self.flag(format!("I couldn't tell which event you meant by {value}. Which one is it?"));
        }
        id
    }

    fn timestamp(&mut self, field: &str, value: Option<&str>) -> Option<ParsedTime> {
        let value = value.map(str::trim).filter(|v| !v.is_empty())?;
        let parsed = parse_timestamp(value);
        if parsed.is_none() {
            self.flag(format!(
                "I couldn't understand the {field} \"{value}\". Could you give it as a date and time?"
            ));
        }
        parsed
    }

    /// A timestamp that must carry a time of day.
    fn datetime(&mut self, field: &str, value: Option<&str>) -> Option<NaiveDateTime> {
        match self.timestamp(field, value)? {
            ParsedTime::At(at) => Some(at),
            ParsedTime::Day(day) => {
                self.flag(format!("What time on {day} should the {field} be?"));
                None
            }
        }
    }
}

fn build_action(intent: Intent, details: RawEventDetails, issues: &mut Issues) -> IntentAction {
    match intent {
        Intent::CreateEvent => IntentAction::CreateEvent(EventDraft {
            start_time: issues.datetime("start time", details.start_time.as_deref()),
            end_time: issues.datetime("end time", details.end_time.as_deref()),
            importance: details.importance.as_ref().and_then(parse_importance_value),
            title: details.title,
            description: details.description,
            location: details.location,
        }),
        Intent::UpdateEvent => IntentAction::UpdateEvent {
            event_id: issues.event_id(details.event_id.as_ref()),
            changes: EventPatch {
                start_time: issues.datetime("start time", details.start_time.as_deref()),
                end_time: issues.datetime("end time", details.end_time.as_deref()),
                importance: details.importance.as_ref().and_then(parse_importance_value),
                title: details.title.filter(|t| !t.trim().is_empty()),
                description: details.description,
                location: details.location,
                status: None,
            },
        },
        Intent::DeleteEvent => {
            let selector = match issues.event_id(details.event_id.as_ref()) {
                Some(id) => EventSelector::ById(id),
                None => details
                    .title
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty())
                    .map_or(EventSelector::Unspecified, EventSelector::ByTitle),
            };
            IntentAction::DeleteEvent(selector)
        }
        Intent::QueryEvent => IntentAction::QueryEvent(query_request(&details, issues)),
        Intent::CheckAvailability => {
            IntentAction::CheckAvailability(query_request(&details, issues))
        }
        Intent::RescheduleEvent => IntentAction::RescheduleEvent {
            event_id: issues.event_id(details.event_id.as_ref()),
            start_time: issues.datetime("start time", details.start_time.as_deref()),
            end_time: issues.datetime("end time", details.end_time.as_deref()),
        },
        Intent::GeneralConversation => IntentAction::GeneralConversation,
    }
}

fn query_request(details: &RawEventDetails, issues: &mut Issues) -> QueryRequest {
    let start = issues.timestamp("start time", details.start_time.as_deref());
    let end = issues.timestamp("end time", details.end_time.as_deref());
    let explicit_date = issues.timestamp("date", details.date.as_deref()).map(|parsed| match parsed {
        ParsedTime::At(at) => at.date(),
        ParsedTime::Day(day) => day,
    });

    let mut request = QueryRequest { date: explicit_date, ..QueryRequest::default() };
    match (start, end) {
        (Some(ParsedTime::Day(day)), None) => {
            request.date = request.date.or(Some(day));
        }
        (start, end) => {
            request.start_time = start.map(|s| match s {
                ParsedTime::At(at) => at,
                ParsedTime::Day(day) => day.and_time(NaiveTime::MIN),
            });
            request.end_time = end.map(|e| match e {
                ParsedTime::At(at) => at,
                ParsedTime::Day(day) => end_of_day(day),
            });
        }
    }
    request
}

fn end_of_day(day: NaiveDate) -> NaiveDateTime {
    day.and_time(NaiveTime::MIN) + chrono::Duration::days(1) - chrono::Duration::microseconds(1)
}

fn confidence_value(value: &Value) -> f32 {
    let raw = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    raw.map_or(1.0, |c| c as f32)
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(flag) => *flag,
        Value::String(text) => matches!(text.trim().to_lowercase().as_str(), "true" | "yes" | "1"),
        Value::Number(number) => number.as_i64().is_some_and(|n| n != 0),
        _ => false,
    }
}
