pub mod order;
pub mod query;
