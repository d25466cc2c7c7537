pub mod account;
pub mod auth;
pub mod category;
pub mod config;
pub mod errors;
pub mod extractors;
pub mod jobs;
pub mod openapi;
pub mod payment;
pub mod queue;
pub mod routes;
