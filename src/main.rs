mod cli;

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::tty::IsTty;

use portal_diff::async_diff::DiffWorker;
use portal_diff::config::{self, PortalConfig};
use portal_diff::diff::render::{print_colored, render_plain};
use portal_diff::diff::{DiffAlgorithm, DiffEngine, DiffLine, DiffStats};
use portal_diff::git::LocalHistory;
use portal_diff::github::GitHubClient;
use portal_diff::revision::RevisionSource;
use portal_diff::service::{DiffReport, DiffService};
use portal_diff::{logging, server};

use crate::cli::{Cli, Command};

fn print_lines(lines: &[DiffLine]) -> Result<()> {
    let mut stdout = io::stdout().lock();
    if stdout.is_tty() {
        print_colored(&mut stdout, lines)?;
    } else {
        stdout.write_all(render_plain(lines).as_bytes())?;
    }
    Ok(())
}

fn print_report(report: &DiffReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&report.to_response())?);
        return Ok(());
    }

    match report {
        DiffReport::Unavailable { reason, latest } => {
            println!("{reason}");
            if let Some(meta) = latest {
                println!("latest: {} {}", meta.short_id, meta.message_first_line());
            }
        }
        DiffReport::Available {
            lines,
            older,
            newer,
            stats,
        } => {
            println!("- {} {}", older.short_id, older.message_first_line());
            println!("+ {} {}", newer.short_id, newer.message_first_line());
            println!(
                "{} addition(s), {} deletion(s)\n",
                stats.additions, stats.deletions
            );
            if stats.is_unchanged() {
                println!("No line changes between these revisions.");
            } else {
                print_lines(lines)?;
            }
        }
    }
    Ok(())
}

fn github_service(config: &PortalConfig) -> Result<DiffService> {
    let client = GitHubClient::new(&config.github).context("Failed to build GitHub client")?;
    Ok(service_for(client, config))
}

fn service_for(source: impl RevisionSource + 'static, config: &PortalConfig) -> DiffService {
    DiffService::new(Arc::new(source), DiffWorker::new(config.diff_options()))
}

async fn run(cli: Cli, mut config: PortalConfig) -> Result<()> {
    let json = cli.diff.json;

    match cli.command {
        Command::Serve { port, owner } => {
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(owner) = owner {
                config.github.owner = owner;
            }
            server::start_server(&config).await
        }
        Command::Show {
            repo,
            path,
            from,
            to,
        } => {
            let service = github_service(&config)?;
            let report = match (from, to) {
                (Some(from), Some(to)) => service.diff_between(&repo, &path, &from, &to).await,
                _ => service.diff_latest(&repo, &path).await,
            }
            .with_context(|| format!("Failed to diff {repo}/{path}"))?;
            print_report(&report, json)
        }
        Command::Local { path, repo_dir } => {
            let service = service_for(LocalHistory::new(config.local_root(repo_dir)), &config);
            let report = service
                .diff_latest("", &path)
                .await
                .with_context(|| format!("Failed to diff {path}"))?;
            print_report(&report, json)
        }
        Command::Files { old, new } => {
            let older = std::fs::read_to_string(&old)
                .with_context(|| format!("Failed to read {}", old.display()))?;
            let newer = std::fs::read_to_string(&new)
                .with_context(|| format!("Failed to read {}", new.display()))?;
            let lines = DiffEngine::new(config.diff_options()).compute(&older, &newer);

            if json {
                println!("{}", serde_json::to_string_pretty(&lines)?);
            } else {
                let stats = DiffStats::from_lines(&lines);
                println!(
                    "{} addition(s), {} deletion(s)\n",
                    stats.additions, stats.deletions
                );
                print_lines(&lines)?;
            }
            Ok(())
        }
        Command::Log { repo, path, limit } => {
            let service = github_service(&config)?;
            let revisions = service
                .history(&repo, &path, limit.max(1))
                .await
                .with_context(|| format!("Failed to list revisions of {repo}/{path}"))?;

            if json {
                println!("{}", serde_json::to_string_pretty(&revisions)?);
            } else {
                for meta in &revisions {
                    let date = meta
                        .timestamp
                        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                        .unwrap_or_default();
                    println!("{} {date:16} {}", meta.short_id, meta.message_first_line());
                }
            }
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    color_eyre::install().ok();

    let cli = Cli::parse();
    logging::setup_logger(cli.verbose);

    // Config file and environment first, CLI flags win
    let mut config = config::load_config();
    if let Some(lookahead) = cli.diff.lookahead {
        config.lookahead = lookahead.max(1);
    }
    if cli.diff.myers {
        config.algorithm = DiffAlgorithm::Myers;
    }

    if let Err(e) = run(cli, config).await {
        eprintln!("portal-diff: {e:#}");
        std::process::exit(1);
    }
}
