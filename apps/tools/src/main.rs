use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dashboard_api::{
    load_dataset, render_html, render_load_error, render_page, section_report, HtmlOptions,
    RenderOptions, SalesOrdering, ValidationOutcome,
};
use shared::domain::Interaction;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about = "Offline helpers for the business dashboard")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render the dashboard for a CSV file as HTML or as the JSON render tree.
    Render {
        csv: PathBuf,
        #[arg(long)]
        out: Option<PathBuf>,
        #[arg(long)]
        json: bool,
        #[arg(long)]
        sort_sales_by_date: bool,
    },
    /// Report which chart sections a CSV file can populate.
    Check { csv: PathBuf },
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Render {
            csv,
            out,
            json,
            sort_sales_by_date,
        } => {
            let bytes = fs::read(&csv).with_context(|| format!("reading {}", csv.display()))?;
            let options = RenderOptions {
                sales_ordering: if sort_sales_by_date {
                    SalesOrdering::ByDate
                } else {
                    SalesOrdering::RowOrder
                },
                ..RenderOptions::default()
            };
            let page = match load_dataset(&bytes) {
                Ok(dataset) => render_page(dataset.as_ref(), &Interaction::Upload, &options),
                Err(err) => {
                    warn!(file = %csv.display(), error = %err, "rendering load error page");
                    render_load_error(&err, &Interaction::Upload)
                }
            };
            let output = if json {
                serde_json::to_string_pretty(&page)?
            } else {
                render_html(&page, &HtmlOptions::default())
            };
            match out {
                Some(path) => {
                    fs::write(&path, output)
                        .with_context(|| format!("writing {}", path.display()))?;
                    debug!(path = %path.display(), blocks = page.blocks.len(), "page written");
                    println!("wrote {}", path.display());
                }
                None => println!("{output}"),
            }
        }
        Command::Check { csv } => {
            let bytes = fs::read(&csv).with_context(|| format!("reading {}", csv.display()))?;
            let Some(dataset) = load_dataset(&bytes)? else {
                println!("{}: empty file", csv.display());
                return Ok(());
            };
            println!(
                "{}: {} rows, columns: {}",
                csv.display(),
                dataset.row_count(),
                dataset.column_names().join(", ")
            );
            for (section, outcome) in section_report(&dataset) {
                match outcome {
                    ValidationOutcome::Satisfied(columns) => {
                        println!("  ok      {} ({})", section.title(), columns.join(", "))
                    }
                    ValidationOutcome::MissingColumns(columns) => {
                        println!("  missing {} ({})", section.title(), columns.join(", "))
                    }
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_render_flags() {
        let cli = Cli::try_parse_from([
            "tools",
            "render",
            "sales.csv",
            "--json",
            "--sort-sales-by-date",
            "--out",
            "page.json",
        ])
        .expect("parse");
        match cli.command {
            Command::Render {
                csv,
                out,
                json,
                sort_sales_by_date,
            } => {
                assert_eq!(csv, PathBuf::from("sales.csv"));
                assert_eq!(out, Some(PathBuf::from("page.json")));
                assert!(json);
                assert!(sort_sales_by_date);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn check_requires_a_path() {
        assert!(Cli::try_parse_from(["tools", "check"]).is_err());
    }
}
