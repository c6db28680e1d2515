pub mod batch;
pub mod config;
pub mod consts;
pub mod error;
pub mod events;
pub mod predictor;
pub mod progress;
pub mod report;
