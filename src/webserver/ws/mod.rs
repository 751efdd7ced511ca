/// WebSocket transport for dashboard subscribers
mod connection;

pub use connection::handle_connection;
