//! Entry point tying environment, session, pipeline and clients together.

use std::sync::Arc;

use tracing::debug;

use crate::env::{EnvironmentConfig, EnvironmentResolver};
use crate::error::ApiError;
use crate::facade::{AgentApi, AnswerApi, ContentApi, ForumApi, UserApi};
use crate::pipeline::Pipeline;
use crate::pool::{ClientPool, PoolOptions, Service, ServiceClient};
use crate::session::Session;
use crate::telemetry::ActionLog;

/// Clients for one environment and one session.
///
/// A gateway never re-points its clients. To switch environments, persist
/// the new override with [`EnvironmentResolver::set_env`] and build a new
/// gateway.
#[derive(Debug, Clone)]
pub struct Gateway {
    env: Arc<EnvironmentConfig>,
    session: Session,
    actions: ActionLog,
    pool: ClientPool,
}

impl Gateway {
    pub fn new(env: Arc<EnvironmentConfig>, session: Session) -> Result<Self, ApiError> {
        Self::with_options(env, session, PoolOptions::default())
    }

    pub fn with_options(
        env: Arc<EnvironmentConfig>,
        session: Session,
        options: PoolOptions,
    ) -> Result<Self, ApiError> {
        let actions = ActionLog::new();
        let pipeline = Arc::new(Pipeline::standard(session.clone(), actions.clone()));
        let pool = ClientPool::new(&env, pipeline, session.clone(), &options)?;

        debug!(env = %env.env_name, user_api = %env.user_api, "Gateway ready");

        Ok(Self {
            env,
            session,
            actions,
            pool,
        })
    }

    /// Build a gateway for whatever environment `resolver` selects.
    pub fn from_resolver(
        resolver: &EnvironmentResolver,
        session: Session,
    ) -> Result<Self, ApiError> {
        Self::new(resolver.resolve(), session)
    }

    pub fn environment(&self) -> &Arc<EnvironmentConfig> {
        &self.env
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn actions(&self) -> &ActionLog {
        &self.actions
    }

    pub fn client(&self, service: Service) -> &ServiceClient {
        self.pool.client(service)
    }

    pub fn user(&self) -> UserApi<'_> {
        UserApi::new(self.client(Service::User))
    }

    pub fn content(&self) -> ContentApi<'_> {
        ContentApi::new(self.client(Service::Content))
    }

    pub fn forum(&self) -> ForumApi<'_> {
        ForumApi::new(self.client(Service::Forum))
    }

    pub fn answer(&self) -> AnswerApi<'_> {
        AnswerApi::new(self.client(Service::Answer))
    }

    pub fn agent(&self) -> AgentApi<'_> {
        AgentApi::new(self.client(Service::Agent))
    }
}
