pub mod config;
pub mod error;
pub mod harness;
pub mod language;
pub mod orchestrator;
pub mod problem;
pub mod protocol;
pub mod resolver;
pub mod routes;
pub mod sandbox;
pub mod verdict;
pub mod web_server;

pub fn create_timestamp() -> String {
    use chrono::{SecondsFormat, Utc};
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
