/// Tests for report rendering
#[cfg(test)]
mod tests {
    use crate::database::{Database, DbError};
    use crate::report::Report;
    use crate::types::{Cell, Row};
    use std::cell::Cell as Counter;

    fn name_count_report() -> Report {
        Report::builder("Counts")
            .query("SELECT name, count FROM things")
            .space("OPS")
            .parent_page("Stats")
            .table_headers(["Name", "Count"])
            .chart(|c| {
                c.chart_type("bar").columns(["x", "y"]);
            })
            .build()
    }

    fn name_count_rows() -> Vec<Row> {
        vec![
            Row::new().with("name", Cell::Text("foo".into())).with("count", Cell::Integer(3)),
            Row::new().with("name", Cell::Text("bar".into())).with("count", Cell::Integer(5)),
        ]
    }

    /// Serves canned rows and counts how often it was queried
    struct CannedDb {
        rows: Vec<Row>,
        queries: Counter<usize>,
    }

    impl Database for CannedDb {
        fn for_each_row(&self, _sql: &str, on_row: &mut dyn FnMut(Row)) -> Result<usize, DbError> {
            self.queries.set(self.queries.get() + 1);
            for row in &self.rows {
                on_row(row.clone());
            }
            Ok(self.rows.len())
        }
    }

    struct FailingDb;

    impl Database for FailingDb {
        fn for_each_row(&self, sql: &str, _on_row: &mut dyn FnMut(Row)) -> Result<usize, DbError> {
            Err(DbError::Query { sql: sql.to_string(), message: "no such table: things".to_string() })
        }
    }

    #[test]
    fn test_full_document() {
        let markup = name_count_report().render(name_count_rows());
        assert_eq!(
            markup,
            "{chart:type=bar|columns=x,y|width=800}\n\
             || Name || Count ||\n\
             | foo |3 |\n\
             | bar |5 |\n\
             {chart}\n"
        );
    }

    #[test]
    fn test_zero_rows_has_only_frame_lines() {
        let markup = name_count_report().render(Vec::new());
        assert_eq!(markup, "{chart:type=bar|columns=x,y|width=800}\n|| Name || Count ||\n{chart}\n");
        assert_eq!(markup.lines().count(), 3);
    }

    #[test]
    fn test_row_order_wins_over_header_order() {
        let report = Report::builder("r").table_headers(["Count", "Name"]).build();
        let rows = vec![Row::new().with("name", Cell::Text("foo".into())).with("count", Cell::Integer(1))];
        let markup = report.render(rows);
        assert!(markup.contains("|| Count || Name ||\n| foo |1 |\n"), "got: {}", markup);
    }

    #[test]
    fn test_header_count_need_not_match_columns() {
        let report = Report::builder("r").table_headers(["Only"]).build();
        let rows = vec![
            Row::new()
                .with("a", Cell::Integer(1))
                .with("b", Cell::Decimal(2.71828))
                .with("c", Cell::Null),
        ];
        let markup = report.render(rows);
        assert!(markup.contains("|| Only ||\n| 1 |2.718 | |\n"), "got: {}", markup);
    }

    #[test]
    fn test_rendering_is_idempotent() {
        let report = name_count_report();
        assert_eq!(report.render(name_count_rows()), report.render(name_count_rows()));
    }

    #[test]
    fn test_render_from_streams_database_rows() {
        let db = CannedDb { rows: name_count_rows(), queries: Counter::new(0) };
        let rendered = name_count_report().render_from(&db).unwrap();

        assert_eq!(rendered.rows, 2);
        assert_eq!(rendered.markup, name_count_report().render(name_count_rows()));
        assert_eq!(db.queries.get(), 1, "query should run exactly once");
    }

    #[test]
    fn test_render_from_propagates_query_failure() {
        let err = name_count_report().render_from(&FailingDb).unwrap_err();
        assert!(err.to_string().contains("no such table"), "unexpected error: {}", err);
    }
}
