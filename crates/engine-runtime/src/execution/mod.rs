pub mod executor;
pub mod factory;
