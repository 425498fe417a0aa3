//! An in-process database implementing both collaborator contracts.
//!
//! Tables are keyed by name, DDL and row writes are applied to a working copy
//! and swapped in only on success, so every call is all-or-nothing. Primary
//! keys, `NOT NULL` and foreign keys are enforced on insert and drop.

pub mod connection;
pub mod database;
