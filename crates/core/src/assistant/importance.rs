//! Importance classifier output
//!
//! The classifier answers with a breakdown (urgency, impact, emotional
//! weight, time sensitivity) plus an overall level. Only the level, or an
//! explicit numeric `importance`, feeds the score.

use aura_domain::{AuraError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::intent_parser::{extract_json_block, importance_from_level, parse_importance_value};

/// Parsed importance breakdown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportanceAssessment {
    pub urgency: Option<String>,
    pub impact: Option<String>,
    pub emotional_weight: Option<String>,
    pub time_sensitivity: Option<String>,
    pub detailed_importance_level: Option<String>,
    pub importance: Option<u8>,
}

impl ImportanceAssessment {
    /// Score in `1..=5`, if the response carried a usable level or number.
    pub fn score(&self) -> Option<u8> {
        self.importance
            .or_else(|| self.detailed_importance_level.as_deref().and_then(importance_from_level))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawAssessment {
    urgency: Option<Value>,
    impact: Option<Value>,
    emotional_weight: Option<Value>,
    time_sensitivity: Option<Value>,
    detailed_importance_level: Option<Value>,
    importance: Option<Value>,
}

fn text(value: Option<Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        other => Some(other.to_string()),
    }
}

/// Parse raw classifier text into an [`ImportanceAssessment`].
pub fn parse_importance_response(raw: &str) -> Result<ImportanceAssessment> {
    let block = extract_json_block(raw).ok_or_else(|| {
        AuraError::External("importance response contained no JSON object".into())
    })?;
    let parsed: RawAssessment = serde_json::from_str(block)
        .map_err(|e| AuraError::External(format!("importance response is not valid JSON: {e}")))?;

    Ok(ImportanceAssessment {
        importance: parsed.importance.as_ref().and_then(parse_importance_value),
        urgency: text(parsed.urgency),
        impact: text(parsed.impact),
        emotional_weight: text(parsed.emotional_weight),
        time_sensitivity: text(parsed.time_sensitivity),
        detailed_importance_level: text(parsed.detailed_importance_level),
    })
}
