//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the crate:
//! - Math types and operations
//! - Bounding volumes
//! - Slot map handles
//! - Logging utilities

pub mod math;
pub mod bounds;
pub mod collections;
pub mod logging;
