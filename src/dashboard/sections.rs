//! The six report sections: one query each, an optional transform, and the
//! series handed to a chart.

use serde::Serialize;

use crate::data::{load_table, Column, ColumnKind, Table, Value, Warehouse};
use crate::error::{DashboardError, DashboardResult};

use super::format::{format_count, format_currency, year_month};

pub const EXEC_SUMMARY_SQL: &str = "SELECT * FROM VW_EXEC_SUMMARY";
pub const REVENUE_BY_REGION_SQL: &str = "SELECT * FROM VW_REVENUE_BY_REGION";
pub const REVENUE_BY_CATEGORY_SQL: &str = "SELECT * FROM VW_REVENUE_BY_CATEGORY";
pub const TOP_CUSTOMERS_SQL: &str = "
    SELECT
        NAME,
        TOTAL_REVENUE
    FROM VW_TOP_CUSTOMERS
    ORDER BY TOTAL_REVENUE DESC
    LIMIT 5
";
pub const MONTHLY_TREND_SQL: &str = "SELECT * FROM VW_MONTHLY_TREND";
pub const MONTHLY_GROWTH_SQL: &str = "SELECT * FROM VW_MONTHLY_REVENUE_GROWTH";

/// Rows shown for top customers regardless of what the backend returns
pub const TOP_CUSTOMERS_LIMIT: usize = 5;

pub const YEAR_MONTH: &str = "YEAR_MONTH";

/// Identity of each chart section, in page order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionId {
    RevenueByRegion,
    RevenueByCategory,
    TopCustomers,
    MonthlyTrend,
    MonthlyGrowth,
}

impl SectionId {
    pub const ALL: [SectionId; 5] = [
        SectionId::RevenueByRegion,
        SectionId::RevenueByCategory,
        SectionId::TopCustomers,
        SectionId::MonthlyTrend,
        SectionId::MonthlyGrowth,
    ];

    pub fn title(self) -> &'static str {
        match self {
            SectionId::RevenueByRegion => "Revenue by Region",
            SectionId::RevenueByCategory => "Revenue by Category",
            SectionId::TopCustomers => "Top 5 Customers",
            SectionId::MonthlyTrend => "Monthly Revenue Trend",
            SectionId::MonthlyGrowth => "Monthly Revenue Growth (%)",
        }
    }

    pub fn view(self) -> &'static str {
        match self {
            SectionId::RevenueByRegion => "VW_REVENUE_BY_REGION",
            SectionId::RevenueByCategory => "VW_REVENUE_BY_CATEGORY",
            SectionId::TopCustomers => "VW_TOP_CUSTOMERS",
            SectionId::MonthlyTrend => "VW_MONTHLY_TREND",
            SectionId::MonthlyGrowth => "VW_MONTHLY_REVENUE_GROWTH",
        }
    }
}

/// One labelled metric in the executive summary row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metric {
    pub label: &'static str,
    pub value: String,
}

/// The single row of `VW_EXEC_SUMMARY`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecSummary {
    pub total_orders: i64,
    pub total_revenue: f64,
    pub avg_order_value: f64,
    pub total_customers: i64,
    pub total_products: i64,
}

impl ExecSummary {
    /// The five metrics in display order
    pub fn metrics(&self) -> [Metric; 5] {
        [
            Metric {
                label: "Total Orders",
                value: format_count(self.total_orders),
            },
            Metric {
                label: "Total Revenue",
                value: format_currency(self.total_revenue),
            },
            Metric {
                label: "Avg Order Value",
                value: format_currency(self.avg_order_value),
            },
            Metric {
                label: "Total Customers",
                value: format_count(self.total_customers),
            },
            Metric {
                label: "Total Products",
                value: format_count(self.total_products),
            },
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Bar,
    Line,
}

/// Keyed values for a chart, in display order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub kind: ChartKind,
    pub value_column: String,
    pub points: Vec<(String, f64)>,
}

/// A loaded chart section: series plus the table shown with it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Section {
    pub id: SectionId,
    pub title: &'static str,
    pub chart: Series,
    pub table: Table,
    /// Top customers shows its table above the chart
    pub table_first: bool,
}

pub fn load_exec_summary(warehouse: &dyn Warehouse) -> DashboardResult<ExecSummary> {
    let view = "VW_EXEC_SUMMARY";
    let table = load_table(warehouse, EXEC_SUMMARY_SQL)?;
    table.first_row(view)?;

    let int = |name: &str| -> DashboardResult<i64> { table.i64_at(0, table.column_index(name)?) };
    let num = |name: &str| -> DashboardResult<f64> { table.f64_at(0, table.column_index(name)?) };

    Ok(ExecSummary {
        total_orders: int("TOTAL_ORDERS")?,
        total_revenue: num("TOTAL_REVENUE")?,
        avg_order_value: num("AVG_ORDER_VALUE")?,
        total_customers: int("TOTAL_CUSTOMERS")?,
        total_products: int("TOTAL_PRODUCTS")?,
    })
}

pub fn load_revenue_by_region(warehouse: &dyn Warehouse) -> DashboardResult<Section> {
    load_keyed_revenue(warehouse, SectionId::RevenueByRegion, REVENUE_BY_REGION_SQL, "REGION")
}

pub fn load_revenue_by_category(warehouse: &dyn Warehouse) -> DashboardResult<Section> {
    load_keyed_revenue(
        warehouse,
        SectionId::RevenueByCategory,
        REVENUE_BY_CATEGORY_SQL,
        "CATEGORY",
    )
}

fn load_keyed_revenue(
    warehouse: &dyn Warehouse,
    id: SectionId,
    sql: &str,
    key: &str,
) -> DashboardResult<Section> {
    let table = load_table(warehouse, sql)?;
    table.require_rows(id.view())?;
    let points = keyed_points(&table, key, "TOTAL_REVENUE")?;
    Ok(Section {
        id,
        title: id.title(),
        chart: Series {
            kind: ChartKind::Bar,
            value_column: "TOTAL_REVENUE".to_string(),
            points,
        },
        table,
        table_first: false,
    })
}

pub fn load_top_customers(warehouse: &dyn Warehouse) -> DashboardResult<Section> {
    let id = SectionId::TopCustomers;
    let mut table = load_table(warehouse, TOP_CUSTOMERS_SQL)?;
    table.require_rows(id.view())?;
    if table.len() > TOP_CUSTOMERS_LIMIT {
        tracing::warn!(
            rows = table.len(),
            "top customers query returned more than {TOP_CUSTOMERS_LIMIT} rows; truncating"
        );
        table.rows.truncate(TOP_CUSTOMERS_LIMIT);
    }
    let points = keyed_points(&table, "NAME", "TOTAL_REVENUE")?;
    Ok(Section {
        id,
        title: id.title(),
        chart: Series {
            kind: ChartKind::Bar,
            value_column: "TOTAL_REVENUE".to_string(),
            points,
        },
        table,
        table_first: true,
    })
}

pub fn load_monthly_trend(warehouse: &dyn Warehouse) -> DashboardResult<Section> {
    let id = SectionId::MonthlyTrend;
    let mut table = load_table(warehouse, MONTHLY_TREND_SQL)?;
    table.require_rows(id.view())?;
    add_year_month(&mut table)?;
    let points = keyed_points(&table, YEAR_MONTH, "TOTAL_REVENUE")?;
    Ok(Section {
        id,
        title: id.title(),
        chart: Series {
            kind: ChartKind::Line,
            value_column: "TOTAL_REVENUE".to_string(),
            points,
        },
        table,
        table_first: false,
    })
}

pub fn load_monthly_growth(warehouse: &dyn Warehouse) -> DashboardResult<Section> {
    let id = SectionId::MonthlyGrowth;
    let mut table = load_table(warehouse, MONTHLY_GROWTH_SQL)?;
    table.require_rows(id.view())?;
    let dropped = drop_null_rows(&mut table, "GROWTH_PERCENT")?;
    if dropped > 0 {
        tracing::debug!(dropped, "skipped months without a growth percentage");
    }
    add_year_month(&mut table)?;
    let points = keyed_points(&table, YEAR_MONTH, "GROWTH_PERCENT")?;
    Ok(Section {
        id,
        title: id.title(),
        chart: Series {
            kind: ChartKind::Line,
            value_column: "GROWTH_PERCENT".to_string(),
            points,
        },
        table,
        table_first: false,
    })
}

/// Remove rows whose `column` is null or NaN; returns how many were removed
pub fn drop_null_rows(table: &mut Table, column: &str) -> DashboardResult<usize> {
    let idx = table.column_index(column)?;
    let before = table.rows.len();
    table.rows.retain(|row| match &row[idx] {
        Value::Null => false,
        Value::Float(v) => v.is_finite(),
        _ => true,
    });
    Ok(before - table.rows.len())
}

/// Append `YEAR_MONTH` built from `YEAR` and `MONTH`, then sort by it
pub fn add_year_month(table: &mut Table) -> DashboardResult<()> {
    let year = table.column_index("YEAR")?;
    let month = table.column_index("MONTH")?;
    table.push_column(Column::new(YEAR_MONTH, ColumnKind::Text), |row| {
        let y = row[year]
            .as_i64()
            .ok_or_else(|| DashboardError::DataShape(format!("invalid YEAR value: {}", row[year])))?;
        let m = row[month]
            .as_i64()
            .ok_or_else(|| DashboardError::DataShape(format!("invalid MONTH value: {}", row[month])))?;
        Ok(Value::Text(year_month(y, m)))
    })?;

    let label = table.columns.len() - 1;
    table
        .rows
        .sort_by(|a, b| a[label].to_string().cmp(&b[label].to_string()));
    Ok(())
}

/// Pair each row's `key` with its numeric `value`, preserving row order
fn keyed_points(table: &Table, key: &str, value: &str) -> DashboardResult<Vec<(String, f64)>> {
    let key_idx = table.column_index(key)?;
    let value_idx = table.column_index(value)?;
    (0..table.len())
        .map(|row| Ok((table.cell(row, key_idx)?.to_string(), table.f64_at(row, value_idx)?)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{fixtures, SqliteWarehouse};

    /// Backend that ignores LIMIT clauses, to check the client-side cap
    struct NoLimitWarehouse(SqliteWarehouse);

    impl Warehouse for NoLimitWarehouse {
        fn query(&self, sql: &str) -> DashboardResult<Table> {
            self.0.query(&sql.replace("LIMIT 5", ""))
        }

        fn source_label(&self) -> String {
            self.0.source_label()
        }
    }

    fn labels(section: &Section) -> Vec<String> {
        section.chart.points.iter().map(|(k, _)| k.clone()).collect()
    }

    #[test]
    fn test_schema_contract_for_all_views() {
        let warehouse = fixtures::sample_warehouse();
        let cases: [(&str, &[&str]); 6] = [
            (
                EXEC_SUMMARY_SQL,
                &["TOTAL_ORDERS", "TOTAL_REVENUE", "AVG_ORDER_VALUE", "TOTAL_CUSTOMERS", "TOTAL_PRODUCTS"],
            ),
            (REVENUE_BY_REGION_SQL, &["REGION", "TOTAL_REVENUE"]),
            (REVENUE_BY_CATEGORY_SQL, &["CATEGORY", "TOTAL_REVENUE"]),
            (TOP_CUSTOMERS_SQL, &["NAME", "TOTAL_REVENUE"]),
            (MONTHLY_TREND_SQL, &["YEAR", "MONTH", "TOTAL_REVENUE"]),
            (
                MONTHLY_GROWTH_SQL,
                &["YEAR", "MONTH", "TOTAL_REVENUE", "PREV_REVENUE", "GROWTH_PERCENT"],
            ),
        ];
        for (sql, expected) in cases {
            let table = load_table(&warehouse, sql).unwrap();
            assert_eq!(table.column_names(), expected.to_vec(), "columns for {sql}");
        }
    }

    #[test]
    fn test_exec_summary_metrics() {
        let warehouse = fixtures::sample_warehouse();
        let summary = load_exec_summary(&warehouse).unwrap();
        assert_eq!(summary.total_orders, 42);
        let metrics = summary.metrics();
        assert_eq!(metrics[0].value, "42");
        assert_eq!(metrics[1].value, "1,234,567.50");
        assert_eq!(metrics[2].value, "29,394.46");
        assert_eq!(metrics[3].value, "17");
        assert_eq!(metrics[4].label, "Total Products");
    }

    #[test]
    fn test_region_keeps_warehouse_order() {
        let warehouse = fixtures::sample_warehouse();
        let section = load_revenue_by_region(&warehouse).unwrap();
        assert_eq!(section.chart.kind, ChartKind::Bar);
        assert_eq!(labels(&section), vec!["North", "South", "East", "West"]);
        assert_eq!(section.table.len(), 4);
        assert!(!section.table_first);
    }

    #[test]
    fn test_top_customers_ordered_and_limited() {
        let warehouse = fixtures::sample_warehouse();
        let section = load_top_customers(&warehouse).unwrap();
        assert!(section.table_first);
        assert_eq!(
            labels(&section),
            vec!["Hooli", "Globex", "Umbrella", "Wayne", "Acme Corp"]
        );
    }

    #[test]
    fn test_top_customers_caps_oversized_results() {
        let warehouse = NoLimitWarehouse(fixtures::sample_warehouse());
        assert_eq!(warehouse.query(TOP_CUSTOMERS_SQL).unwrap().len(), 7);
        let section = load_top_customers(&warehouse).unwrap();
        assert_eq!(section.table.len(), TOP_CUSTOMERS_LIMIT);
        assert_eq!(section.chart.points.len(), TOP_CUSTOMERS_LIMIT);
    }

    #[test]
    fn test_monthly_trend_sorted_chronologically() {
        let warehouse = fixtures::sample_warehouse();
        let section = load_monthly_trend(&warehouse).unwrap();
        assert_eq!(section.chart.kind, ChartKind::Line);
        assert_eq!(
            labels(&section),
            vec!["2023-12", "2024-01", "2024-02", "2024-03", "2024-10", "2024-11"]
        );
        assert_eq!(section.table.columns.last().unwrap().name, YEAR_MONTH);
        assert_eq!(section.table.rows[0][3], Value::Text("2023-12".into()));
    }

    #[test]
    fn test_monthly_growth_drops_null_rows() {
        let warehouse = fixtures::sample_warehouse();
        let raw = load_table(&warehouse, MONTHLY_GROWTH_SQL).unwrap();
        assert_eq!(raw.len(), 10);

        let section = load_monthly_growth(&warehouse).unwrap();
        assert_eq!(section.table.len(), 7);
        assert_eq!(section.chart.points.len(), 7);
        let growth = section.table.column_index("GROWTH_PERCENT").unwrap();
        assert!(section.table.rows.iter().all(|r| !r[growth].is_null()));

        let keys = labels(&section);
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
        assert_eq!(keys.first().map(String::as_str), Some("2024-02"));
        assert_eq!(section.chart.points[3], ("2024-06".to_string(), -5.0));
    }

    #[test]
    fn test_drop_null_rows_treats_nan_as_missing() {
        let mut table = Table::new(vec![
            Column::new("MONTH", ColumnKind::Integer),
            Column::new("GROWTH_PERCENT", ColumnKind::Float),
        ]);
        table.rows.push(vec![Value::Int(1), Value::Float(f64::NAN)]);
        table.rows.push(vec![Value::Int(2), Value::Float(4.5)]);
        table.rows.push(vec![Value::Int(3), Value::Null]);
        table.rows.push(vec![Value::Int(4), Value::Float(f64::INFINITY)]);

        assert_eq!(drop_null_rows(&mut table, "GROWTH_PERCENT").unwrap(), 3);
        assert_eq!(table.rows, vec![vec![Value::Int(2), Value::Float(4.5)]]);
    }

    #[test]
    fn test_empty_views_are_shape_errors() {
        let warehouse = SqliteWarehouse::from_connection(fixtures::empty_connection(), "empty");
        assert!(matches!(load_exec_summary(&warehouse), Err(DashboardError::DataShape(_))));
        assert!(matches!(load_revenue_by_region(&warehouse), Err(DashboardError::DataShape(_))));
        assert!(matches!(load_revenue_by_category(&warehouse), Err(DashboardError::DataShape(_))));
        assert!(matches!(load_top_customers(&warehouse), Err(DashboardError::DataShape(_))));
        assert!(matches!(load_monthly_trend(&warehouse), Err(DashboardError::DataShape(_))));
        assert!(matches!(load_monthly_growth(&warehouse), Err(DashboardError::DataShape(_))));
    }

    #[test]
    fn test_missing_column_is_shape_error() {
        let mut table = Table::new(vec![Column::new("YEAR", ColumnKind::Integer)]);
        table.rows.push(vec![Value::Int(2024)]);
        let err = add_year_month(&mut table).unwrap_err();
        assert!(err.to_string().contains("MONTH"));
    }

    #[test]
    fn test_add_year_month_from_text_cells() {
        let mut table = Table::new(vec![
            Column::new("YEAR", ColumnKind::Text),
            Column::new("MONTH", ColumnKind::Text),
        ]);
        table.rows.push(vec![Value::Text("2024".into()), Value::Text("11".into())]);
        table.rows.push(vec![Value::Text("2024".into()), Value::Text("3".into())]);
        add_year_month(&mut table).unwrap();
        assert_eq!(table.rows[0][2], Value::Text("2024-03".into()));
        assert_eq!(table.rows[1][2], Value::Text("2024-11".into()));
    }
}
