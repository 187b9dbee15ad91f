//! Module for core business logic services.
//!
//! This module encapsulates services that perform specific business operations
//! and orchestrate interactions between different parts of the application.

pub mod attendance_service;
pub mod task_service;
pub mod user_service;
