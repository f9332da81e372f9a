pub mod config;
pub mod engine;
pub mod errors;
pub mod forecast;
pub mod frame;
pub mod logging;
pub mod params;
pub mod rpc;
pub mod types;
pub mod web;
