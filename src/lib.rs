pub mod authentication;
pub mod configuration;
pub mod domain;
pub mod routes;
pub mod session_state;
pub mod startup;
pub mod storage;
pub mod supabase_client;
pub mod telemetry;
