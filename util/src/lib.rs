pub mod config;
pub mod execution_config;
pub mod paths;
pub mod test_helpers;
