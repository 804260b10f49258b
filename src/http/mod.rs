//! HTTP API for viewers and operators
//!
//! - GET /health - Health check
//! - GET /status - Lifecycle state of the controller
//! - GET /get-details - Session id, token and API key for the newest active session

mod handlers;
mod routes;
mod state;

pub use handlers::SessionDetails;
pub use routes::create_router;
pub use state::AppState;
