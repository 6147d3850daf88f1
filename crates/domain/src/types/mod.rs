//! Domain types and models

pub mod conversation;
pub mod event;
pub mod intent;
pub mod memory;
pub mod outcome;

pub use conversation::{ConversationTurn, NewConversationTurn};
pub use event::{Event, EventDraft, EventPatch, EventStatus, NewEvent};
pub use intent::{EventSelector, Intent, IntentAction, IntentResult, QueryRequest};
pub use memory::{Memory, NewMemory};
pub use outcome::{ApiEvent, LookupKey, MessageReply, Outcome, OutcomeTag, QueryResult, UiAction};
