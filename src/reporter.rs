/// Reporting session: configuration plus the publish cycle
///
/// A `Reporter` owns one database descriptor, one wiki target and an ordered
/// list of reports. `render` runs each report's query, renders its markup
/// and publishes it, strictly one report at a time.
use crate::database::{Database, DbError, SqliteDatabase};
use crate::report::Report;
use crate::types::{ConnectionDescriptor, DatabaseField, WikiField, WikiTarget};
use crate::wiki::{PageAction, PublishError, Publisher, RpcError, WikiRpc, XmlRpcClient};
use log::{debug, info};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("{0}")]
    Database(#[from] DbError),

    #[error("Failed to set up wiki client: {0}")]
    Wiki(#[from] RpcError),

    #[error("Report '{title}' query failed: {source}")]
    Query { title: String, source: DbError },

    #[error("Report '{title}' could not be published: {source}")]
    Publish { title: String, source: PublishError },
}

/// Result of publishing one report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublishOutcome {
    pub title: String,
    pub space: String,
    pub parent: String,
    pub rows: usize,
    pub bytes: usize,
    pub action: PageAction,
}

/// Markup rendered without publishing
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedMarkup {
    pub title: String,
    pub space: String,
    pub rows: usize,
    pub markup: String,
}

#[derive(Debug, Clone, Default)]
pub struct Reporter {
    database: ConnectionDescriptor,
    wiki: WikiTarget,
    reports: Vec<Report>,
}

impl Reporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_database_field(&mut self, field: DatabaseField, value: impl Into<String>) -> &mut Self {
        self.database.set(field, value);
        self
    }

    pub fn set_wiki_field(&mut self, field: WikiField, value: impl Into<String>) -> &mut Self {
        self.wiki.set(field, value);
        self
    }

    pub fn set_wiki_insecure(&mut self, insecure: bool) -> &mut Self {
        self.wiki.insecure = insecure;
        self
    }

    /// Append a report; reports publish in the order they were added
    pub fn add_report(&mut self, report: Report) -> &mut Self {
        self.reports.push(report);
        self
    }

    pub fn database(&self) -> &ConnectionDescriptor {
        &self.database
    }

    pub fn wiki(&self) -> &WikiTarget {
        &self.wiki
    }

    pub fn reports(&self) -> &[Report] {
        &self.reports
    }

    /// Keep only reports whose titles are listed, preserving order
    pub fn retain_titles(&mut self, titles: &[String]) {
        self.reports.retain(|r| titles.iter().any(|t| t == &r.title));
    }

    /// Query, render and publish every report against the configured backends
    pub fn render(&self) -> Result<Vec<PublishOutcome>, RunError> {
        let db = SqliteDatabase::connect(&self.database)?;
        let publisher = Publisher::new(XmlRpcClient::new(&self.wiki)?, &self.wiki);
        self.render_with(&db, &publisher)
    }

    /// Query, render and publish every report using the given backends.
    ///
    /// Stops at the first failure; reports already published stay published.
    pub fn render_with<R: WikiRpc>(
        &self,
        db: &dyn Database,
        publisher: &Publisher<R>,
    ) -> Result<Vec<PublishOutcome>, RunError> {
        let mut outcomes = Vec::with_capacity(self.reports.len());

        for (idx, report) in self.reports.iter().enumerate() {
            debug!("Report {}/{}: '{}'", idx + 1, self.reports.len(), report.title);

            let rendered = report
                .render_from(db)
                .map_err(|source| RunError::Query { title: report.title.clone(), source })?;

            let action = publisher
                .publish(&report.title, &report.parent, &report.space, &rendered.markup)
                .map_err(|source| RunError::Publish { title: report.title.clone(), source })?;

            info!("Published '{}' ({} rows, {:?})", report.title, rendered.rows, action);

            outcomes.push(PublishOutcome {
                title: report.title.clone(),
                space: report.space.clone(),
                parent: report.parent.clone(),
                rows: rendered.rows,
                bytes: rendered.markup.len(),
                action,
            });
        }

        Ok(outcomes)
    }

    /// Render every report's markup without touching the wiki
    pub fn render_markup(&self) -> Result<Vec<RenderedMarkup>, RunError> {
        let db = SqliteDatabase::connect(&self.database)?;
        self.render_markup_with(&db)
    }

    pub fn render_markup_with(&self, db: &dyn Database) -> Result<Vec<RenderedMarkup>, RunError> {
        self.reports
            .iter()
            .map(|report| {
                let rendered = report
                    .render_from(db)
                    .map_err(|source| RunError::Query { title: report.title.clone(), source })?;
                Ok(RenderedMarkup {
                    title: report.title.clone(),
                    space: report.space.clone(),
                    rows: rendered.rows,
                    markup: rendered.markup,
                })
            })
            .collect()
    }
}

#[cfg(test)]
#[path = "reporter_test.rs"]
mod reporter_test;
