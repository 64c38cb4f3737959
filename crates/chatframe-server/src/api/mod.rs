pub mod chat;
pub mod error;
pub mod state;
pub mod upload;

pub use error::ApiError;
pub use state::AppState;
