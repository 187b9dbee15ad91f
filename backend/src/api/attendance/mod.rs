//! Module for attendance API endpoints.
//!
//! This module handles daily attendance marking and history retrieval.

pub mod handlers;
pub mod routes;
