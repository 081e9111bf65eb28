//! Nutriplan Tools module
//!
//! MCP tool implementations for Nutriplan.

pub mod advice;
pub mod profile;
pub mod status;
