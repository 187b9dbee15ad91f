//! Central module for organizing the application's main API endpoints.
//!
//! This module acts as a top-level container for different API domains,
//! such as task and attendance data, excluding core authentication routes
//! which are handled separately.

pub mod attendance;
pub mod common;
pub mod task;
