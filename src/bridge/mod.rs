mod dispatch;
mod server;

pub use dispatch::{ArgMap, MethodChannel, MethodOutcome};
pub use server::run_bridge_server;
