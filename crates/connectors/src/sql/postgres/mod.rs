pub mod adapter;
pub mod metadata;
pub mod params;
pub mod row;
pub mod utils;
