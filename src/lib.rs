pub mod api;
pub mod app;
pub mod catalog;
pub mod config;
pub mod error;
pub mod middleware;
pub mod model;
pub mod recommend;
pub mod repo;
pub mod service;
pub mod telemetry;
pub mod util;
