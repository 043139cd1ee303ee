//! # Repository Module
//!
//! SQLite repository implementations.
//!
//! ## Available Repositories
//!
//! - [`kv::SqliteKvStore`] - Key-value entries backing the pricing preferences

pub mod kv;
