//! Credential exchangers: one strategy per sign-in protocol.

pub mod apple;
pub mod google;
pub mod password;

pub use apple::{verify_nonce_binding, AppleAttempt, AppleExchange};
pub use google::GoogleExchange;
pub use password::PasswordExchange;
