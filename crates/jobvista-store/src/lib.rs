//! Document store for JobVista.
//!
//! This crate provides:
//! - `JobStore` and `ApplicationStore` traits
//! - A Firestore REST backend (service account or emulator)
//! - An in-memory backend for tests and local runs

pub mod error;
pub mod firestore;
pub mod memory;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use firestore::{ApplicationRepository, FirestoreClient, FirestoreConfig, JobRepository};
pub use memory::MemoryStore;
pub use store::{ApplicationStore, JobStore, APPLICATIONS_COLLECTION, JOBS_COLLECTION};
