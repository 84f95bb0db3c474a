pub mod auth;
pub mod credentials;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod middleware;
pub mod password;
pub mod routes;
pub mod state;
pub mod token;
pub mod uploads;

pub use error::ApiError;
pub use routes::router;
pub use state::{AppState, AppStateInner};
pub use token::TokenKeys;
