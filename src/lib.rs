pub mod config;
pub mod engine;
pub mod error;
pub mod features;
pub mod model_store;
pub mod models;
pub mod predictor;
pub mod routes;
pub mod sparse;
pub mod storage;
pub mod telemetry;
pub mod types;
pub mod vocabulary;
