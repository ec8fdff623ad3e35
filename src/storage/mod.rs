//! Storage layer module.
//!
//! This module provides trait-based storage abstraction allowing different backends
//! to be used without changing business logic.

pub mod factory;
pub mod file;
pub mod memory;
pub mod mysql;
pub mod postgres;
pub mod redis;
mod sql;
pub mod traits;

pub use self::factory::create_storage;
pub use self::file::FileStorage;
pub use self::memory::MemoryStorage;
pub use self::mysql::MySqlStorage;
pub use self::postgres::PostgresStorage;
pub use self::redis::RedisStorage;
pub use self::traits::{ConfigStorage, DynStorage, SequenceStorage, Storage};
pub use crate::error::{StorageError, StorageResult};
