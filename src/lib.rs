//! Food-ordering menu service
//!
//! A browsable dish catalog mirrored optimistically to a hosted backend, a
//! cart with order submission and notification, and the image pipeline
//! behind it: caching, lazy loading, compression and upload.

pub mod assets;
pub mod config;
pub mod errors;
pub mod models;
pub mod repositories;
pub mod services;
pub mod storage;
pub mod utils;
pub mod web;
