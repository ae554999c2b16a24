//! Transactional persistence: connection handling, schema and the
//! insert-vs-update reconciler.

pub mod db;
pub mod reconciler;
pub mod schema;

pub use db::Db;
