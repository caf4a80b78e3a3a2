//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the renderer:
//! - Math types and operations
//! - Slot collections backing the entity stores
//! - Time measurement
//! - Logging utilities

pub mod math;
pub mod collections;
pub mod time;
pub mod logging;
