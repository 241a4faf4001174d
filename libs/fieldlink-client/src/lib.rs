//! # fieldlink-client
//!
//! API client for the fieldlink platform backends.
//!
//! ## Backends
//!
//! The platform is split into independently deployed HTTP services:
//! - User service (auth, profile, avatars, regions)
//! - Content service (carousel, news, agricultural information)
//! - Forum service (posts, comments)
//! - Answer service (quiz questions, points, leaderboard)
//! - Agent service (AI assistant chat)
//!
//! ## Call Pipeline
//!
//! Every facade call goes through the same steps:
//! 1. The request hooks mutate the outgoing [`RequestEnvelope`]
//!    (bearer token unless the endpoint is public, start time, log line)
//! 2. The service client sends it to the backend bound in the [`ClientPool`]
//! 3. The response hooks normalize the body and record an action
//! 4. The classifier turns failures into a single [`ApiError`] shape
//!
//! Callers only ever see an [`ApiResponse`] or an [`ApiError`].

mod envelope;
mod error;
mod gateway;
mod pool;
mod response;

pub mod env;
pub mod facade;
pub mod pipeline;
pub mod session;
pub mod telemetry;

pub use env::{EnvName, EnvironmentConfig, EnvironmentResolver};
pub use envelope::{
    Body, FailureKind, FilePart, Outcome, RawResponse, RequestEnvelope, RequestMetadata,
    TransportFailure,
};
pub use error::{ApiError, ClassifiedError, EnvError, StoreError};
pub use gateway::Gateway;
pub use pool::{ClientPool, PoolOptions, Service, ServiceClient};
pub use response::ApiResponse;
pub use session::{FileStore, MemoryStore, Session, SessionStore};
pub use telemetry::{ActionLog, ActionRecord};
