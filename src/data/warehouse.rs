//! The connection seam between the dashboard and a warehouse backend.

use std::time::Instant;

use crate::error::DashboardResult;

use super::models::Table;

/// A live, read-only connection to the reporting layer.
///
/// Built once at process start and passed by reference to every query.
pub trait Warehouse {
    /// Execute a literal SQL statement and return its full result
    fn query(&self, sql: &str) -> DashboardResult<Table>;

    /// Human-readable origin of the data, shown in the page footer
    fn source_label(&self) -> String;
}

/// Run a statement through the shared connection, logging its cost
pub fn load_table(warehouse: &dyn Warehouse, sql: &str) -> DashboardResult<Table> {
    let started = Instant::now();
    match warehouse.query(sql) {
        Ok(table) => {
            let statement = sql.split_whitespace().collect::<Vec<_>>().join(" ");
            tracing::debug!(
                rows = table.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                sql = %statement,
                "query finished"
            );
            Ok(table)
        }
        Err(e) => {
            tracing::warn!(error = %e, "query failed");
            Err(e)
        }
    }
}
