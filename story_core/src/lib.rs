//! Story-text generation for the Moonstone bedtime story service.
//!
//! Turns a sanitized story request into a `{title, paragraphs[]}`
//! document from a generative text model, enforcing a per-tier length
//! contract with a best-effort correction loop and a trimming pass.

mod error;
mod generator;
mod hash;
mod model;
mod prompt;
mod request;
mod retry;

pub use error::StoryError;
pub use generator::{StoryGenerator, StoryText};
pub use hash::input_hash;
pub use model::{GenAiClient, ModelError, TextModel};
pub use request::{sanitize, LengthContract, SanitizedRequest, StoryLength, StoryRequest};
pub use retry::RetryPolicy;
