//! Board domain model: projects, columns, tasks and comments.
//!
//! # Responsibility
//! - Define canonical records shared by repositories, services and callers.
//! - Describe which records take part in sibling ordering.
//!
//! # Invariants
//! - Every record is identified by a stable integer id assigned at creation.
//! - `priority` is an ordering key only and is never serialized to clients.

pub mod board;
