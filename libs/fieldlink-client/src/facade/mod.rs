//! Per-backend method tables.
//!
//! Each method binds a fixed verb, path template and body encoding. The
//! paths are a compatibility contract with independently deployed backends
//! and must not drift.

mod agent;
mod answer;
mod content;
mod forum;
mod user;

pub use agent::AgentApi;
pub use answer::AnswerApi;
pub use content::ContentApi;
pub use forum::ForumApi;
pub use user::{image_content_type, RegisterForm, UserApi};
