//! Client core for the webforge app generator.
//!
//! The centre of this crate is [`GenerationSession`], the state machine that
//! starts a generation through an [`ApiClient`], follows its progress channel
//! and keeps the ordered message log a UI renders. Around it sit the layered
//! [`ClientConfig`], the signed-in [`AuthState`] and the route guard.
//!
//! # Example
//!
//! ```ignore
//! let config = ClientConfig::load(None)?;
//! let api = HttpApiClient::new(config.clone())?;
//! let connector = config.connector(api.http_client().clone());
//!
//! let mut session = GenerationSession::new(Arc::new(api), Arc::new(connector));
//! session.set_description("A recipe sharing site");
//! session.start_generation().await?;
//! let status = session.run_until_settled().await;
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod session;
pub mod testing;

pub use api::{ApiClient, HttpApiClient};
pub use auth::{AuthState, UsageKind, UsageLimit, login_url};
pub use config::ClientConfig;
pub use error::{Error, Result};
pub use routes::{Navigation, Route, guard};
pub use session::{GenerationSession, GenerationStatus, MessageKind, SessionSnapshot, StatusMessage};

pub use webforge_protocol as protocol;
pub use webforge_runtime as runtime;
