pub mod connection;

pub use connection::{ConnectionRow, NewConnection};
