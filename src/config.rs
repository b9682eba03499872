/// Configuration resolution module
///
/// This module handles:
/// - Locating the config file (flag, environment, working dir, user dir)
/// - Parsing the TOML document into database, wiki and report sections
/// - Applying secret overrides from the environment
/// - Building a ready-to-run `Reporter`
use crate::cli::{self, CliArgs};
use crate::report::Report;
use crate::reporter::Reporter;
use crate::types::{ChartConfig, ConnectionDescriptor, DatabaseField, WikiField, WikiTarget};
use log::{debug, warn};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_ENV: &str = "WIKISTATS_CONFIG";
pub const DB_PASSWORD_ENV: &str = "WIKISTATS_DB_PASSWORD";
pub const WIKI_PASSWORD_ENV: &str = "WIKISTATS_WIKI_PASSWORD";

/// The whole configuration document
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub database: ConnectionDescriptor,
    pub wiki: WikiTarget,
    #[serde(rename = "report")]
    pub reports: Vec<ReportSection>,
}

/// One `[[report]]` table
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportSection {
    pub title: String,
    #[serde(alias = "parent_page")]
    pub parent: String,
    pub space: String,
    pub query: String,
    pub headers: Vec<String>,
    pub chart: ChartConfig,
}

impl ReportSection {
    fn into_report(self) -> Report {
        let chart = self.chart;
        Report::builder(self.title)
            .query(self.query)
            .space(self.space)
            .parent_page(self.parent)
            .table_headers(self.headers)
            .chart(move |c| *c = chart)
            .build()
    }
}

/// Build a Reporter from CLI arguments and the process environment
pub fn build_reporter(args: &CliArgs) -> Result<Reporter, String> {
    let env = |key: &str| std::env::var(key).ok();

    let path = resolve_config_path(args.config.as_deref(), env, |p| p.exists())?;
    debug!("Using config {:?}", path);

    let mut config = load_config(&path)?;
    apply_env_overrides(&mut config, env);

    if config.reports.is_empty() {
        warn!("{} defines no [[report]] sections", path.display());
    }

    let reporter = reporter_from_config(config);
    debug!(
        "Database {:?} on {:?}, {} report(s)",
        reporter.database().name,
        reporter.database().host,
        reporter.reports().len()
    );

    filter_reports(reporter, &args.only, &path)
}

/// Populate a reporting session from a parsed config, field by field
pub fn reporter_from_config(config: Config) -> Reporter {
    let Config { database, wiki, reports } = config;

    let mut reporter = Reporter::new();
    reporter
        .set_database_field(DatabaseField::Name, database.name)
        .set_database_field(DatabaseField::Host, database.host)
        .set_database_field(DatabaseField::Username, database.username)
        .set_database_field(DatabaseField::Password, database.password)
        .set_wiki_field(WikiField::Url, wiki.url)
        .set_wiki_field(WikiField::Username, wiki.username)
        .set_wiki_field(WikiField::Password, wiki.password)
        .set_wiki_insecure(wiki.insecure);

    for section in reports {
        reporter.add_report(section.into_report());
    }
    reporter
}

/// Apply `--only`: keep the named reports and fail on titles that are missing
fn filter_reports(mut reporter: Reporter, only: &[String], path: &Path) -> Result<Reporter, String> {
    if !only.is_empty() {
        reporter.retain_titles(only);
        for title in only {
            if !reporter.reports().iter().any(|r| &r.title == title) {
                return Err(format!("No report titled '{}' in {}", title, path.display()));
            }
        }
    }

    Ok(reporter)
}

/// Pick the config file: explicit flag, then $WIKISTATS_CONFIG, then
/// ./wikistats.toml, then the per-user config file
pub fn resolve_config_path<E, X>(explicit: Option<&Path>, env: E, exists: X) -> Result<PathBuf, String>
where
    E: Fn(&str) -> Option<String>,
    X: Fn(&Path) -> bool,
{
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }

    if let Some(path) = env(CONFIG_ENV).filter(|p| !p.is_empty()) {
        return Ok(PathBuf::from(path));
    }

    let local = PathBuf::from(cli::LOCAL_CONFIG_FILE);
    if exists(&local) {
        return Ok(local);
    }

    match cli::default_user_config() {
        Some(user) if exists(&user) => Ok(user),
        _ => Err(format!(
            "No configuration found. Pass --config <PATH>, set {}, or create ./{}",
            CONFIG_ENV,
            cli::LOCAL_CONFIG_FILE
        )),
    }
}

/// Read and parse a config file
pub fn load_config(path: &Path) -> Result<Config, String> {
    let text = fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    parse_config(&text).map_err(|e| format!("Invalid config {}: {}", path.display(), e))
}

/// Parse a config document
pub fn parse_config(text: &str) -> Result<Config, String> {
    toml::from_str(text).map_err(|e| e.to_string())
}

/// Replace passwords with values from the environment when set
pub fn apply_env_overrides<E>(config: &mut Config, env: E)
where
    E: Fn(&str) -> Option<String>,
{
    if let Some(password) = env(DB_PASSWORD_ENV) {
        debug!("Database password taken from {}", DB_PASSWORD_ENV);
        config.database.password = password;
    }
    if let Some(password) = env(WIKI_PASSWORD_ENV) {
        debug!("Wiki password taken from {}", WIKI_PASSWORD_ENV);
        config.wiki.password = password;
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;
