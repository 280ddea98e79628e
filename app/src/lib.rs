// storefront_server/src/lib.rs

//! HTTP server for the storefront engine: Postgres-backed stores, the
//! Paystack client, account pipelines and the actix-web routes.

pub mod config;
pub mod db;
pub mod errors;
pub mod models;
pub mod pipelines;
pub mod services;
pub mod state;
pub mod web;
