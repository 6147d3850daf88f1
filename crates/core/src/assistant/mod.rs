//! Conversational assistant: classification, dispatch and history

pub mod dispatcher;
pub mod fallback;
pub mod importance;
pub mod intent_parser;
pub mod ledger;
pub mod ports;
pub mod response;
pub mod service;

pub use dispatcher::Dispatcher;
pub use fallback::{DegradingImportanceClassifier, DegradingIntentClassifier};
pub use importance::{parse_importance_response, ImportanceAssessment};
pub use intent_parser::{extract_json_block, parse_intent_response};
pub use ledger::ConversationLedger;
pub use response::{FallbackResponder, TemplateResponder};
pub use service::{AssistantPorts, AssistantService};
