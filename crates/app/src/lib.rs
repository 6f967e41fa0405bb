//! `frontdesk-app`: composition root.
//!
//! Wires the session, auth service, domain store and API client into one
//! explicitly passed [`AppContext`].

pub mod config;
pub mod context;
pub mod notification;
pub mod provider;

pub use config::{AppConfig, ConfigError};
pub use context::{AppContext, Navigation, PreviousVisit, SessionTokens, UnauthorizedView};
pub use notification::Notification;
pub use provider::StaticTokenProvider;
