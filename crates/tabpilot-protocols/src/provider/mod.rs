//! LLM Provider protocol definitions.
//!
//! Providers connect to a generation API and turn a conversation plus a tool
//! catalog into the model's next step.

mod request;
mod response;
mod traits;

pub use request::*;
pub use response::*;
pub use traits::*;
