pub mod db;
pub mod error;
pub mod http;
pub mod kv;
pub mod telemetry;
