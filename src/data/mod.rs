//! Data layer for reading the reporting views.
//!
//! A [`Warehouse`] is the single connection shared by every query; the
//! Snowflake and SQLite backends implement it.

mod models;
mod snowflake;
mod sqlite;
mod warehouse;

pub use models::{Column, ColumnKind, Table, Value};
pub use snowflake::{SnowflakeConfig, SnowflakeWarehouse};
pub use sqlite::SqliteWarehouse;
#[cfg(test)]
pub use sqlite::fixtures;
pub use warehouse::{load_table, Warehouse};
