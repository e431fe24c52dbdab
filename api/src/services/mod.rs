pub mod error;
pub mod trim;
pub mod upload;
