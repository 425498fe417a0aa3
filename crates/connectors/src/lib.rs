pub mod deadline;
pub mod destination;
pub mod error;
pub mod memory;
pub mod probe;
pub mod source;
pub mod sql;
