//! HTTP front end for the placement readiness service

pub mod api;
pub mod config;
pub mod error;
