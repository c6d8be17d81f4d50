// handlers/protected/mod.rs - session JWT required (/api/connections*)
//
// Each request builds its own registry for the authenticated user.

pub mod connections;

pub use connections::{create_connection, delete_connection, list_connections, test_connection};
