// src/lib.rs

//! deal-alert Library
//!
//! Crawls a paginated deals listing, works out which posts are new since the
//! previous run and emails them.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
