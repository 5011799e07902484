pub mod expected_errors;
pub mod query;
pub mod table;
