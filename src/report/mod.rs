//! Report model and markup rendering.
//!
//! A [`Report`] knows where its page lives (space, parent, title), which
//! query feeds it, and how its table and chart are laid out. Rendering
//! streams rows into a [`MarkupWriter`] so a result set is consumed once
//! and never held in memory.
//!
//! # Module Organization
//!
//! - `chart` - `{chart:...}` directive encoding
//! - `table` - header/row lines and per-cell formatting

mod chart;
mod table;

pub use chart::{CHART_CLOSE, format_chart_open};
pub use table::{format_header_line, format_row_line};

use crate::database::{Database, DbError};
use crate::types::{ChartConfig, Row};
use log::debug;

/// A single report definition
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Report {
    pub title: String,
    /// Title of the page the report is created under
    pub parent: String,
    pub space: String,
    pub query: String,
    pub headers: Vec<String>,
    pub chart: ChartConfig,
}

/// Markup produced for one report
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedReport {
    pub markup: String,
    pub rows: usize,
}

impl Report {
    pub fn builder(title: impl Into<String>) -> ReportBuilder {
        ReportBuilder { report: Report { title: title.into(), ..Default::default() } }
    }

    /// Render markup from an already materialized row sequence
    #[cfg(test)]
    pub fn render<I>(&self, rows: I) -> String
    where
        I: IntoIterator<Item = Row>,
    {
        let mut writer = MarkupWriter::begin(&self.chart, &self.headers);
        for row in rows {
            writer.push_row(&row);
        }
        writer.finish()
    }

    /// Run the report's query and render rows as the backend yields them
    pub fn render_from(&self, db: &dyn Database) -> Result<RenderedReport, DbError> {
        debug!("Rendering report '{}'", self.title);

        let mut writer = MarkupWriter::begin(&self.chart, &self.headers);
        let rows = db.for_each_row(&self.query, &mut |row: Row| writer.push_row(&row))?;

        debug!("Report '{}' rendered {} rows", self.title, rows);

        Ok(RenderedReport { markup: writer.finish(), rows })
    }
}

/// Fluent construction of a [`Report`]
#[derive(Debug, Clone)]
pub struct ReportBuilder {
    report: Report,
}

impl ReportBuilder {
    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.report.query = query.into();
        self
    }

    pub fn space(mut self, space: impl Into<String>) -> Self {
        self.report.space = space.into();
        self
    }

    pub fn parent_page(mut self, parent: impl Into<String>) -> Self {
        self.report.parent = parent.into();
        self
    }

    pub fn table_headers<I, S>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.report.headers = headers.into_iter().map(Into::into).collect();
        self
    }

    /// Configure chart directives; repeated calls add to the same config
    pub fn chart<F>(mut self, configure: F) -> Self
    where
        F: FnOnce(&mut ChartConfig),
    {
        configure(&mut self.report.chart);
        self
    }

    pub fn build(self) -> Report {
        self.report
    }
}

/// Incremental markup writer: directive line, header line, rows, closing directive
#[derive(Debug)]
pub struct MarkupWriter {
    out: String,
}

impl MarkupWriter {
    /// Start a document with the chart directive and header lines
    pub fn begin(chart: &ChartConfig, headers: &[String]) -> Self {
        let mut out = String::new();
        out.push_str(&format_chart_open(chart));
        out.push('\n');
        out.push_str(&format_header_line(headers));
        out.push('\n');
        Self { out }
    }

    pub fn push_row(&mut self, row: &Row) {
        self.out.push_str(&format_row_line(row));
        self.out.push('\n');
    }

    /// Close the chart and return the full text
    pub fn finish(mut self) -> String {
        self.out.push_str(CHART_CLOSE);
        self.out.push('\n');
        self.out
    }
}

#[cfg(test)]
#[path = "report_test.rs"]
mod report_test;
