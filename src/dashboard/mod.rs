//! One render pass of the sales dashboard.
//!
//! Sections are loaded strictly in page order on the shared connection. The
//! first failure aborts the pass; no partial dashboard is ever produced.

pub mod format;
pub mod sections;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::data::Warehouse;
use crate::error::DashboardResult;

pub use sections::{ChartKind, ExecSummary, Section, SectionId, Series};

pub const DASHBOARD_TITLE: &str = "Enterprise Sales Analytics Dashboard";
pub const EXEC_SUMMARY_TITLE: &str = "Executive Summary";

/// Everything shown on the page, in page order
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub title: &'static str,
    pub summary: ExecSummary,
    pub sections: Vec<Section>,
    pub footer: String,
    pub loaded_at: DateTime<Utc>,
}

impl Dashboard {
    /// Run every section against `warehouse`
    pub fn load(warehouse: &dyn Warehouse) -> DashboardResult<Self> {
        let span = tracing::info_span!("render_pass");
        let _guard = span.enter();

        let summary = sections::load_exec_summary(warehouse)?;
        let sections = vec![
            sections::load_revenue_by_region(warehouse)?,
            sections::load_revenue_by_category(warehouse)?,
            sections::load_top_customers(warehouse)?,
            sections::load_monthly_trend(warehouse)?,
            sections::load_monthly_growth(warehouse)?,
        ];
        let footer = format!("Source: {}", warehouse.source_label());

        tracing::info!(sections = sections.len() + 1, "render pass complete");
        Ok(Dashboard {
            title: DASHBOARD_TITLE,
            summary,
            sections,
            footer,
            loaded_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::data::{fixtures, SqliteWarehouse, Table};
    use crate::error::DashboardError;

    /// Records the statements it sees before delegating
    struct RecordingWarehouse {
        inner: SqliteWarehouse,
        seen: RefCell<Vec<String>>,
    }

    impl Warehouse for RecordingWarehouse {
        fn query(&self, sql: &str) -> DashboardResult<Table> {
            self.seen.borrow_mut().push(sql.split_whitespace().collect::<Vec<_>>().join(" "));
            self.inner.query(sql)
        }

        fn source_label(&self) -> String {
            "Recorder".to_string()
        }
    }

    #[test]
    fn test_sections_in_page_order() {
        let warehouse = fixtures::sample_warehouse();
        let dashboard = Dashboard::load(&warehouse).unwrap();
        let ids: Vec<SectionId> = dashboard.sections.iter().map(|s| s.id).collect();
        assert_eq!(ids, SectionId::ALL.to_vec());
        assert_eq!(dashboard.footer, "Source: SQLite fixture");
        assert_eq!(dashboard.summary.total_products, 9);
    }

    #[test]
    fn test_queries_issued_once_each_in_order() {
        let warehouse = RecordingWarehouse {
            inner: fixtures::sample_warehouse(),
            seen: RefCell::new(Vec::new()),
        };
        Dashboard::load(&warehouse).unwrap();
        let seen = warehouse.seen.borrow();
        let views: Vec<&str> = seen
            .iter()
            .map(|sql| sql.split(" FROM ").nth(1).unwrap().split(' ').next().unwrap())
            .collect();
        assert_eq!(
            views,
            vec![
                "VW_EXEC_SUMMARY",
                "VW_REVENUE_BY_REGION",
                "VW_REVENUE_BY_CATEGORY",
                "VW_TOP_CUSTOMERS",
                "VW_MONTHLY_TREND",
                "VW_MONTHLY_REVENUE_GROWTH",
            ]
        );
    }

    #[test]
    fn test_empty_summary_aborts_pass() {
        let warehouse = SqliteWarehouse::from_connection(fixtures::empty_connection(), "empty");
        let err = Dashboard::load(&warehouse).unwrap_err();
        assert!(matches!(err, DashboardError::DataShape(_)));
        assert!(err.to_string().contains("VW_EXEC_SUMMARY"));
    }

    #[test]
    fn test_failure_stops_later_queries() {
        let conn = fixtures::sample_connection();
        conn.execute_batch("DROP VIEW VW_REVENUE_BY_CATEGORY").unwrap();
        let warehouse = RecordingWarehouse {
            inner: SqliteWarehouse::from_connection(conn, "broken"),
            seen: RefCell::new(Vec::new()),
        };
        let err = Dashboard::load(&warehouse).unwrap_err();
        assert!(matches!(err, DashboardError::Query { .. }));
        assert_eq!(warehouse.seen.borrow().len(), 3);
    }

    #[test]
    fn test_empty_later_view_aborts_pass() {
        let conn = fixtures::sample_connection();
        conn.execute_batch("DELETE FROM monthly_trend").unwrap();
        let warehouse = SqliteWarehouse::from_connection(conn, "partial");
        let err = Dashboard::load(&warehouse).unwrap_err();
        assert!(err.to_string().contains("VW_MONTHLY_TREND returned no rows"));
    }
}
