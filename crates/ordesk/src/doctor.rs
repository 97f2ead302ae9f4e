// SPDX-FileCopyrightText: 2026 Ordesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `ordesk doctor` command implementation.
//!
//! Reports on configuration, the database, the assignment rotation, and
//! tickets still waiting for a chat channel.

use std::io::IsTerminal;
use std::path::Path;
use std::time::{Duration, Instant};

use ordesk_config::model::OrdeskConfig;
use ordesk_core::OrdeskError;
use ordesk_storage::queries::{cursor, orders, tickets, users};
use ordesk_storage::{Database, DatabaseOptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub duration: Duration,
}

impl CheckResult {
    fn new(name: &str, status: CheckStatus, message: impl Into<String>, start: Instant) -> Self {
        Self {
            name: name.to_string(),
            status,
            message: message.into(),
            duration: start.elapsed(),
        }
    }
}

/// Run every check and print the report.
pub async fn run_doctor(
    config: &OrdeskConfig,
    config_path: Option<&Path>,
    plain: bool,
) -> Result<(), OrdeskError> {
    let use_color = !plain && std::io::stdout().is_terminal();
    let results = collect_checks(config, config_path).await;

    println!();
    println!("  ordesk doctor");
    println!("  {}", "-".repeat(50));

    let mut issues = 0;
    for result in &results {
        if result.status != CheckStatus::Pass {
            issues += 1;
        }
        println!("{}", format_line(result, use_color));
    }
    println!();

    if issues > 0 {
        let word = if issues == 1 { "issue" } else { "issues" };
        println!("  {issues} {word} found.");
    } else {
        println!("  All checks passed.");
    }
    println!();
    Ok(())
}

pub async fn collect_checks(config: &OrdeskConfig, config_path: Option<&Path>) -> Vec<CheckResult> {
    let mut results = vec![check_config(config_path)];

    let start = Instant::now();
    let db_path = &config.storage.database_path;
    if !Path::new(db_path).exists() {
        results.push(CheckResult::new(
            "Database",
            CheckStatus::Warn,
            format!("not found: {db_path} (will be created on first run)"),
            start,
        ));
        return results;
    }

    let options = DatabaseOptions {
        wal_mode: config.storage.wal_mode,
        busy_timeout_ms: config.storage.busy_timeout_ms,
    };
    let db = match Database::open_with(db_path, &options).await {
        Ok(db) => {
            results.push(CheckResult::new("Database", CheckStatus::Pass, "connected", start));
            db
        }
        Err(e) => {
            results.push(CheckResult::new(
                "Database",
                CheckStatus::Fail,
                format!("open failed: {e}"),
                start,
            ));
            return results;
        }
    };

    results.push(check_rotation(&db, &config.assignment.cursor_name).await);
    results.push(check_pending_channels(&db).await);
    results.push(check_order_tickets(&db).await);
    results.push(check_crm(config));

    if let Err(e) = db.close().await {
        tracing::warn!(error = %e, "doctor could not checkpoint the database");
    }
    results
}

fn check_config(config_path: Option<&Path>) -> CheckResult {
    let start = Instant::now();
    let loaded = match config_path {
        Some(path) => ordesk_config::load_and_validate_path(path),
        None => ordesk_config::load_and_validate(),
    };
    match loaded {
        Ok(_) => CheckResult::new("Configuration", CheckStatus::Pass, "valid", start),
        Err(errors) => CheckResult::new(
            "Configuration",
            CheckStatus::Fail,
            format!("{} error(s)", errors.len()),
            start,
        ),
    }
}

async fn check_rotation(db: &Database, cursor_name: &str) -> CheckResult {
    let start = Instant::now();
    let name = cursor_name.to_string();
    let probe = db
        .call(move |conn| {
            let agents = users::list_eligible_agents(conn)?;
            let position = cursor::peek(conn, &name)?;
            Ok((agents.len(), position))
        })
        .await;

    match probe {
        Ok((0, position)) => CheckResult::new(
            "Rotation",
            CheckStatus::Fail,
            format!("no eligible agents (cursor at {position}); checkouts will be refused"),
            start,
        ),
        Ok((count, position)) => {
            let next = position.rem_euclid(count as i64);
            CheckResult::new(
                "Rotation",
                CheckStatus::Pass,
                format!("{count} eligible agent(s), cursor at {position} (next slot {next})"),
                start,
            )
        }
        Err(e) => CheckResult::new("Rotation", CheckStatus::Fail, e.to_string(), start),
    }
}

async fn check_pending_channels(db: &Database) -> CheckResult {
    let start = Instant::now();
    match db.call(|conn| tickets::count_channel_pending(conn)).await {
        Ok(0) => CheckResult::new("Chat channels", CheckStatus::Pass, "none pending", start),
        Ok(n) => CheckResult::new(
            "Chat channels",
            CheckStatus::Warn,
            format!("{n} ticket(s) waiting for a channel"),
            start,
        ),
        Err(e) => CheckResult::new("Chat channels", CheckStatus::Fail, e.to_string(), start),
    }
}

async fn check_order_tickets(db: &Database) -> CheckResult {
    let start = Instant::now();
    match db.call(|conn| orders::list_without_ticket(conn)).await {
        Ok(orphans) if orphans.is_empty() => {
            CheckResult::new("Order tickets", CheckStatus::Pass, "every order has a ticket", start)
        }
        Ok(orphans) => CheckResult::new(
            "Order tickets",
            CheckStatus::Fail,
            format!("{} order(s) without a ticket", orphans.len()),
            start,
        ),
        Err(e) => CheckResult::new("Order tickets", CheckStatus::Fail, e.to_string(), start),
    }
}

fn check_crm(config: &OrdeskConfig) -> CheckResult {
    let start = Instant::now();
    match (config.crm.enabled, config.crm.webhook_url.as_deref()) {
        (true, Some(url)) => {
            CheckResult::new("CRM sync", CheckStatus::Pass, format!("webhook {url}"), start)
        }
        (true, None) => CheckResult::new(
            "CRM sync",
            CheckStatus::Fail,
            "enabled without webhook_url",
            start,
        ),
        (false, _) => CheckResult::new("CRM sync", CheckStatus::Pass, "disabled", start),
    }
}

fn format_line(result: &CheckResult, use_color: bool) -> String {
    let ms = result.duration.as_millis();
    if use_color {
        use colored::Colorize;
        let (symbol, message) = match result.status {
            CheckStatus::Pass => ("✓".green().to_string(), result.message.normal().to_string()),
            CheckStatus::Warn => ("!".yellow().to_string(), result.message.yellow().to_string()),
            CheckStatus::Fail => ("✗".red().to_string(), result.message.red().to_string()),
        };
        format!("    {symbol} {:<20} {message} ({ms}ms)", result.name)
    } else {
        let tag = match result.status {
            CheckStatus::Pass => "[OK]  ",
            CheckStatus::Warn => "[WARN]",
            CheckStatus::Fail => "[FAIL]",
        };
        format!("    {tag} {:<20} {} ({ms}ms)", result.name, result.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ordesk_config::model::StorageConfig;

    fn config(dir: &tempfile::TempDir) -> OrdeskConfig {
        OrdeskConfig {
            storage: StorageConfig {
                database_path: dir.path().join("doctor.db").to_string_lossy().to_string(),
                ..StorageConfig::default()
            },
            ..OrdeskConfig::default()
        }
    }

    fn status_of<'a>(results: &'a [CheckResult], name: &str) -> &'a CheckResult {
        results.iter().find(|r| r.name == name).unwrap()
    }

    #[tokio::test]
    async fn missing_database_is_a_warning() {
        let dir = tempfile::tempdir().unwrap();
        let results = collect_checks(&config(&dir), None).await;
        assert_eq!(status_of(&results, "Database").status, CheckStatus::Warn);
    }

    #[tokio::test]
    async fn empty_rotation_fails() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(&dir);
        let db = Database::open(&config.storage.database_path).await.unwrap();
        db.close().await.unwrap();
        drop(db);

        let results = collect_checks(&config, None).await;
        assert_eq!(status_of(&results, "Database").status, CheckStatus::Pass);
        assert_eq!(status_of(&results, "Rotation").status, CheckStatus::Fail);
        assert_eq!(status_of(&results, "Chat channels").status, CheckStatus::Pass);
        assert_eq!(status_of(&results, "Order tickets").status, CheckStatus::Pass);
    }

    #[test]
    fn plain_lines_are_tagged() {
        let line = format_line(
            &CheckResult {
                name: "Database".into(),
                status: CheckStatus::Warn,
                message: "slow".into(),
                duration: Duration::from_millis(3),
            },
            false,
        );
        assert!(line.contains("[WARN]"));
        assert!(line.contains("slow (3ms)"));
    }
}
