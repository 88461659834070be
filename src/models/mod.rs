pub mod attachment;
pub mod genie;
pub mod turn;

pub use attachment::Attachment;
pub use genie::{MessageStatus, MessageStatusResponse, PollResult};
pub use turn::{
    ConversationTurnResult, QuestionOutcome, QuestionState, RenderedContent, Role, Turn,
};
