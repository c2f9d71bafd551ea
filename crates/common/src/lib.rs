pub mod discount;
pub mod error;
pub mod types;
