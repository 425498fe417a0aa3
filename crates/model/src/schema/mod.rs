pub mod column;
pub mod foreign_key;
pub mod load_order;
pub mod snapshot;
pub mod table;
