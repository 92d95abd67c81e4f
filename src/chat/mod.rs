pub mod detect;
pub mod session;
pub mod store;
pub mod translate;
pub mod types;

pub use detect::DetectionOrchestrator;
pub use session::{ChatSession, RequestError, SessionOptions, TranslationControl};
pub use store::{MessageStore, StoreError, StoreEvent};
pub use translate::{TranslationOrchestrator, PAIR_UNAVAILABLE};
pub use types::{
    AttemptOutcome, AttemptStatus, ChatMessage, DetectionStatus, MessageId, MessageStatus,
    TranslationAttempt,
};
