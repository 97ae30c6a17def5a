pub mod codec;
pub mod repository;
pub mod store;
pub mod todo;
