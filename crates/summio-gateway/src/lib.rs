pub mod error;
pub mod frontend;
pub mod handlers;
pub mod response;
pub mod router;
pub mod server;
pub mod state;
pub mod upload;

pub use server::GatewayServer;
pub use state::{AppState, SharedState};
