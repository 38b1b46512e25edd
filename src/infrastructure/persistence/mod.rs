//! 持久化实现

pub mod memory;
pub mod sqlite;
