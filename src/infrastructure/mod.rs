pub mod memory_repo;
pub mod sqlite_repo;
pub mod storage;
