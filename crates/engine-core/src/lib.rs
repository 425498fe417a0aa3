pub mod copier;
pub mod error;
pub mod report;
pub mod schema;
