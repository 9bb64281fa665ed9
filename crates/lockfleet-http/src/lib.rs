pub mod handlers;
pub mod server;

pub use server::{router, start_server, ApiState};
