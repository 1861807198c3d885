//! Batch driver around the `analysis` pipeline: loads recordings, writes
//! JSON and CSV reports and re-rates stored reports.

pub mod batch;
pub mod config;
pub mod export;
pub mod input;
