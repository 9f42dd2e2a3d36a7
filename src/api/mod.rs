//! API response types

pub mod response;

pub use response::{ApiResponse, Created, DataResponse, NoContent};
