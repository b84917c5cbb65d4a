pub mod connection;
pub mod endpoints;

pub use connection::{first_choice_content, strip_code_fence, ApiConnectionError};
pub use endpoints::{ChatCompletionRequest, ChatMessage, JsonSchema, Provider, ResponseFormat};
