//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep request/CLI layers decoupled from storage details.

pub mod board_service;
pub mod reorder_service;
