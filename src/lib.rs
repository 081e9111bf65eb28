//! Nutriplan Library
//!
//! Nutrition calculations, user profiles and AI diet advice.

pub mod advice;
pub mod build_info;
pub mod config;
pub mod db;
pub mod mcp;
pub mod models;
pub mod nutrition;
pub mod tools;
