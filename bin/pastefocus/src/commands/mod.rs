pub mod config_cmd;
pub mod patterns;
pub mod probe;
