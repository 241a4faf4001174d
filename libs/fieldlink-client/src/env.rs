//! Backend environment selection.
//!
//! Three host sets exist: development (local machine), testing (LAN test
//! box) and production. The active one is picked from, in order:
//! 1. The build-time `FIELDLINK_APP_ENV` variable, or an explicit override
//! 2. The persisted `APP_ENV` override in the session store
//! 3. `development`

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::EnvError;
use crate::pool::Service;
use crate::session::Session;

/// Environment name captured at compile time.
pub const BUILD_ENV: Option<&str> = option_env!("FIELDLINK_APP_ENV");

/// Known environments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvName {
    Development,
    Testing,
    Production,
}

impl EnvName {
    pub const ALL: [EnvName; 3] = [EnvName::Development, EnvName::Testing, EnvName::Production];

    pub fn as_str(&self) -> &'static str {
        match self {
            EnvName::Development => "development",
            EnvName::Testing => "testing",
            EnvName::Production => "production",
        }
    }

    /// Parse a name, falling back to development for anything unknown.
    pub fn or_development(name: &str) -> Self {
        name.parse().unwrap_or(EnvName::Development)
    }
}

impl fmt::Display for EnvName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnvName {
    type Err = EnvError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "development" => Ok(EnvName::Development),
            "testing" => Ok(EnvName::Testing),
            "production" => Ok(EnvName::Production),
            other => Err(EnvError::Invalid(other.to_string())),
        }
    }
}

/// Base URLs and flags for one environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvironmentConfig {
    pub user_api: String,
    pub forum_api: String,
    pub content_api: String,
    pub answer_api: String,
    pub agent_api: String,
    pub env_name: EnvName,
    pub debug: bool,
}

impl EnvironmentConfig {
    /// The fixed host set of a known environment.
    pub fn for_env(env: EnvName) -> Self {
        let host = match env {
            EnvName::Development => "http://localhost",
            EnvName::Testing => "http://192.168.103.25",
            EnvName::Production => "http://8.141.102.201",
        };

        Self {
            user_api: format!("{host}:8081"),
            forum_api: format!("{host}:8083"),
            content_api: format!("{host}:8082"),
            answer_api: format!("{host}:8084"),
            agent_api: format!("{host}:8085"),
            env_name: env,
            debug: env == EnvName::Development,
        }
    }

    /// All services behind one base URL, e.g. a local gateway.
    pub fn single_host(env: EnvName, base_url: &str) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        Self {
            user_api: base_url.clone(),
            forum_api: base_url.clone(),
            content_api: base_url.clone(),
            answer_api: base_url.clone(),
            agent_api: base_url,
            env_name: env,
            debug: env == EnvName::Development,
        }
    }

    pub fn base_url(&self, service: Service) -> &str {
        match service {
            Service::User => &self.user_api,
            Service::Forum => &self.forum_api,
            Service::Content => &self.content_api,
            Service::Answer => &self.answer_api,
            Service::Agent => &self.agent_api,
        }
    }
}

/// Picks and caches the active [`EnvironmentConfig`].
#[derive(Debug)]
pub struct EnvironmentResolver {
    build_override: Option<String>,
    session: Session,
    cache: Mutex<Option<(String, Arc<EnvironmentConfig>)>>,
}

impl EnvironmentResolver {
    /// Resolver using the compile-time `FIELDLINK_APP_ENV`, if any.
    pub fn new(session: Session) -> Self {
        Self {
            build_override: BUILD_ENV.map(str::to_string),
            session,
            cache: Mutex::new(None),
        }
    }

    /// Replace the build-time override, e.g. with a command-line flag.
    pub fn with_override(mut self, name: Option<String>) -> Self {
        if name.is_some() {
            self.build_override = name;
        }
        self
    }

    fn current_name(&self, stored: Option<&str>) -> String {
        self.build_override
            .as_deref()
            .filter(|name| !name.is_empty())
            .or(stored)
            .unwrap_or(EnvName::Development.as_str())
            .to_string()
    }

    /// The active configuration.
    ///
    /// Returns the same `Arc` until the resolved name changes.
    pub fn resolve(&self) -> Arc<EnvironmentConfig> {
        let stored = self.session.env_override();
        let current = self.current_name(stored.as_deref());

        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some((cached_name, config)) = cache.as_ref() {
            if *cached_name == current {
                return Arc::clone(config);
            }
        }

        // A leftover local override must never steer production traffic.
        if current == EnvName::Production.as_str() {
            if let Some(stored) = stored.as_deref().filter(|s| *s != current) {
                warn!(current = %current, stored = %stored, "Purging stale environment override");
                if let Err(e) = self.session.clear_env_override() {
                    warn!(error = %e, "Failed to purge environment override");
                }
            }
        }

        let env = EnvName::or_development(&current);
        if env.as_str() != current {
            warn!(requested = %current, "Unknown environment, using development");
        }

        let config = Arc::new(EnvironmentConfig::for_env(env));
        if config.debug || self.build_override.is_some() {
            debug!(
                build_override = ?self.build_override,
                stored = ?stored,
                current = %current,
                env = %env,
                "Environment resolved"
            );
        }

        *cache = Some((current, Arc::clone(&config)));
        config
    }

    /// Persist `name` as the environment override.
    ///
    /// Existing gateways keep their clients; build a new one to switch.
    pub fn set_env(&self, name: &str) -> Result<EnvName, EnvError> {
        let env: EnvName = name.parse()?;
        self.session.set_env_override(env.as_str())?;
        info!(env = %env, "Environment override saved");
        Ok(env)
    }

    pub fn current_env(&self) -> EnvName {
        self.resolve().env_name
    }

    pub fn is_development(&self) -> bool {
        self.current_env() == EnvName::Development
    }

    pub fn is_testing(&self) -> bool {
        self.current_env() == EnvName::Testing
    }

    pub fn is_debug_mode(&self) -> bool {
        self.resolve().debug
    }
}
