// handlers/public/mod.rs - Public handlers (no authentication required)
//
// The test endpoints receive credentials in the request body and never
// persist them.

pub mod system;
pub mod test_connection;

pub use system::{health, root};
pub use test_connection::{
    test_dropbox_connection, test_google_drive_connection, test_s3_connection, test_snowflake_connection,
};
