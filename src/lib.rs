//! EduERP attendance backend
//!
//! Instructor dashboard records behind a key-value store, and a timed
//! attendance session simulator.

pub mod api;
pub mod config;
pub mod database;
pub mod error;
pub mod logging;
pub mod models;
pub mod services;
