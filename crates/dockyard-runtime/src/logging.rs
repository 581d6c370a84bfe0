//! Subscriber setup for hosts without their own `tracing` pipeline.
//!
//! Library code only emits events; nothing is printed until a host installs a
//! subscriber, either its own or the fmt subscriber from [`init`].

use tracing_subscriber::EnvFilter;

use crate::config::ConfigError;

/// Parse a filter directive such as `"info,dockyard.engine=debug"`.
pub fn filter(directive: &str) -> Result<EnvFilter, ConfigError> {
    EnvFilter::try_new(directive).map_err(|source| ConfigError::LogFilter {
        directive: directive.to_string(),
        source,
    })
}

/// Install a global fmt subscriber filtered by `directive`.
///
/// The filter comes from the argument, never from the environment.
pub fn init(directive: &str) -> Result<(), ConfigError> {
    tracing_subscriber::fmt()
        .with_env_filter(filter(directive)?)
        .with_target(true)
        .try_init()
        .map_err(|_| ConfigError::SubscriberInstalled)
}
