//! ReSales session core.
//!
//! Reconciles the identity service's push notifications, three credential
//! exchange protocols (password, Google OAuth, Sign in with Apple), and the
//! observable session state the UI renders from.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use resales_auth::auth::http::HttpIdentityService;
//! use resales_auth::config::AuthConfig;
//! use resales_auth::lifecycle::{CoreDependencies, SessionCore};
//! # use resales_auth::auth::platform::{AppleSignInUi, GoogleSignInUi};
//!
//! # async fn example(
//! #     google_ui: Arc<dyn GoogleSignInUi>,
//! #     apple_ui: Arc<dyn AppleSignInUi>,
//! # ) -> resales_auth::error::Result<()> {
//! let config = Arc::new(AuthConfig::load()?);
//! let identity = Arc::new(HttpIdentityService::from_config(&config));
//! let core = SessionCore::start(CoreDependencies {
//!     identity,
//!     config,
//!     google_ui,
//!     apple_ui,
//! });
//!
//! core.orchestrator().sign_in("a@x.com", "pw1").await;
//! println!("logged in: {}", core.store().is_logged_in());
//! core.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod prelude;
pub mod session;
