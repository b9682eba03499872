// Copyright 2015 The Rust Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

mod cli;
mod config;
mod database;
mod report;
mod reporter;
mod types;
mod ui;
mod wiki;

use reporter::{PublishOutcome, RenderedMarkup, Reporter};
use wiki::PageAction;

fn main() {
    env_logger::init();

    // Parse CLI arguments
    let args = cli::CliArgs::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        ui::print_error(&e);
        std::process::exit(1);
    }

    // Load configuration into a reporting session
    let reporter = match config::build_reporter(&args) {
        Ok(r) => r,
        Err(e) => {
            ui::print_error(&format!("Configuration error: {}", e));
            std::process::exit(1);
        }
    };

    let result = if args.dry_run { run_dry(&reporter, args.json) } else { run_publish(&reporter, args.json) };

    if let Err(e) = result {
        ui::print_error(&e);
        std::process::exit(1);
    }
}

/// Render every report to stdout without publishing
fn run_dry(reporter: &Reporter, json: bool) -> Result<(), String> {
    let rendered = reporter.render_markup().map_err(|e| e.to_string())?;

    if json {
        println!("{}", dry_run_summary(&rendered));
        return Ok(());
    }

    for r in &rendered {
        println!("== {}/{} ({} rows) ==", r.space, r.title, r.rows);
        print!("{}", r.markup);
    }
    Ok(())
}

/// Query, render and publish every report
fn run_publish(reporter: &Reporter, json: bool) -> Result<(), String> {
    if !json {
        ui::status(&format!("publishing {} report(s) to {}", reporter.reports().len(), reporter.wiki().url));
    }

    let outcomes = reporter.render().map_err(|e| e.to_string())?;

    if json {
        println!("{}", publish_summary(&outcomes));
        return Ok(());
    }

    for o in &outcomes {
        let marker = match o.action {
            PageAction::Created => "created",
            PageAction::Updated => "updated",
        };
        ui::success(marker, &format!("{}/{} ({} rows)", o.space, o.title, o.rows));
    }
    Ok(())
}

fn publish_summary(outcomes: &[PublishOutcome]) -> String {
    use serde_json::json;

    let created = outcomes.iter().filter(|o| o.action == PageAction::Created).count();
    let summary = json!({
        "published": outcomes.len(),
        "created": created,
        "updated": outcomes.len() - created,
        "reports": outcomes,
    });
    serde_json::to_string_pretty(&summary).unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e))
}

fn dry_run_summary(rendered: &[RenderedMarkup]) -> String {
    use serde_json::json;

    let reports: Vec<_> = rendered
        .iter()
        .map(|r| json!({ "title": r.title, "space": r.space, "rows": r.rows, "markup": r.markup }))
        .collect();
    serde_json::to_string_pretty(&json!({ "dry_run": true, "reports": reports }))
        .unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e))
}
