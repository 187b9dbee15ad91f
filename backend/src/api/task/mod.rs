//! Module for task management API endpoints.
//!
//! This module handles task creation, assignment, listing, and status
//! transitions for authenticated users.

pub mod handlers;
pub mod routes;
