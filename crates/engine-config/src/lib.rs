pub mod connection;
pub mod env;
pub mod error;
pub mod replication;
pub mod settings;
