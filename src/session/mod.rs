//! Observable session state.

pub mod model;
pub mod state;
pub mod store;

pub use model::Session;
pub use state::{AuthFailure, AuthOperationState};
pub use store::{SessionSnapshot, SessionStateStore};
