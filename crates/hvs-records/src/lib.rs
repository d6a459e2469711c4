//! Persistence for confirmed helmet violations.
//!
//! This crate provides:
//! - The [`ViolationRepository`] interface
//! - A JSON-lines file repository
//! - An in-memory repository

pub mod error;
pub mod jsonl;
pub mod memory;
pub mod repository;

pub use error::{RecordsError, RecordsResult};
pub use jsonl::JsonlViolationRepository;
pub use memory::InMemoryViolationRepository;
pub use repository::ViolationRepository;
