//! WebSocket transport and HTTP instrumentation
//!
//! - `routes`: the dashboard endpoint, mountable into a host router
//! - `ws`: per-connection sender task bridging a subscriber queue to a socket
//! - `middleware`: request timing that feeds the monitor's HTTP events
//! - `server`: standalone server used when no host router is supplied
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;
pub mod ws;

pub use middleware::{instrument, track_http};
pub use routes::{dashboard_routes, dashboard_routes_at};
pub use server::{bind_listener, build_app, serve};
pub use state::AppState;
