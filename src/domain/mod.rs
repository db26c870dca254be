pub mod error;
pub mod repository;
pub mod storage;
pub mod todo;
