pub mod coordinator;
pub mod request;
pub mod transcript;

pub use coordinator::ConversationCoordinator;
