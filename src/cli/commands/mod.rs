pub mod envelope;
pub mod key;
pub mod sources;
pub mod token;
