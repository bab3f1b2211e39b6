mod archive;
mod client;
mod crawler;
mod error;
mod parser;
mod records;
mod search;
mod settings;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;

use crate::client::HttpSource;
use crate::search::SearchParams;
use crate::settings::{FailurePolicy, Settings};

#[derive(Parser)]
#[command(name = "cdt_scraper", about = "China drug clinical trial registry scraper")]
struct Cli {
    /// Settings file (default: ./cdt_scraper.{toml,yaml,json} if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Folder for archives (overrides settings)
    #[arg(short, long, global = true)]
    output_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SearchArgs {
    /// Search filter as key=value; repeatable. drug_category takes
    /// 中药/天然药物, 化学药物 or 生物制品.
    #[arg(short = 'p', long = "param", value_parser = search::parse_pair)]
    params: Vec<(String, String)>,

    /// Appended to archive file names
    #[arg(short, long, default_value = "all")]
    suffix: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl the search result listing into a TSV archive
    Meta {
        #[command(flatten)]
        search: SearchArgs,
    },
    /// Fetch detail pages for the given ids into a JSON archive
    Details {
        /// Record ids (ckm_id)
        ids: Vec<String>,
        /// Read ids from the first column of a summary TSV
        #[arg(long)]
        ids_from: Option<PathBuf>,
        /// Appended to archive file names
        #[arg(short, long, default_value = "all")]
        suffix: String,
        /// What to do when one record fails (overrides settings)
        #[arg(long, value_enum)]
        on_error: Option<FailurePolicy>,
    },
    /// Listing crawl followed by the detail crawl over every listed id
    Run {
        #[command(flatten)]
        search: SearchArgs,
        /// What to do when one record fails (overrides settings)
        #[arg(long, value_enum)]
        on_error: Option<FailurePolicy>,
    },
    /// Parse a saved detail page and print it as JSON
    Parse {
        file: PathBuf,
        /// Id to stamp on the record
        #[arg(long, default_value = "")]
        id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(dir) = cli.output_dir {
        settings.output_dir = dir;
    }
    let today = chrono::Local::now().date_naive();

    let result = match cli.command {
        Commands::Meta { search } => {
            let params = search_params(&search)?;
            let source = HttpSource::new(&settings)?;
            let rows = crawler::search_summaries(
                &source,
                &params,
                settings.page_size,
                settings.listing_delay(),
            )
            .await?;
            if rows.is_empty() {
                println!("No clinical trials matched.");
                return Ok(());
            }
            let path = archive::summary_path(&settings.output_dir, today, &search.suffix);
            archive::write_summaries(&path, &rows)?;
            println!("{} clinical trials archived to {}", rows.len(), path.display());
            Ok(())
        }
        Commands::Details {
            ids,
            ids_from,
            suffix,
            on_error,
        } => {
            let mut ids = ids;
            if let Some(tsv) = ids_from {
                ids.extend(archive::read_ids(&tsv)?);
            }
            if ids.is_empty() {
                bail!("no ids given; pass ids or --ids-from <tsv>");
            }
            let source = HttpSource::new(&settings)?;
            let path = archive::detail_path(&settings.output_dir, today, &suffix);
            let policy = on_error.unwrap_or(settings.on_error);
            let n = crawler::archive_details(&source, &ids, &path, settings.detail_delay(), policy)
                .await?;
            println!("{} trial details archived to {}", n, path.display());
            Ok(())
        }
        Commands::Run { search, on_error } => {
            let params = search_params(&search)?;
            let source = HttpSource::new(&settings)?;

            let t_meta = Instant::now();
            let rows = crawler::search_summaries(
                &source,
                &params,
                settings.page_size,
                settings.listing_delay(),
            )
            .await?;
            if rows.is_empty() {
                println!("No clinical trials matched.");
                return Ok(());
            }
            let meta_path = archive::summary_path(&settings.output_dir, today, &search.suffix);
            archive::write_summaries(&meta_path, &rows)?;
            println!(
                "{} clinical trials archived to {} in {}",
                rows.len(),
                meta_path.display(),
                format_duration(t_meta.elapsed())
            );

            let ids: Vec<String> = rows.into_iter().map(|r| r.id).collect();
            let path = archive::detail_path(&settings.output_dir, today, &search.suffix);
            let policy = on_error.unwrap_or(settings.on_error);
            let n = crawler::archive_details(&source, &ids, &path, settings.detail_delay(), policy)
                .await?;
            println!("{} trial details archived to {}", n, path.display());
            Ok(())
        }
        Commands::Parse { file, id } => {
            let html = std::fs::read_to_string(&file)
                .with_context(|| format!("cannot read {}", file.display()))?;
            let detail = parser::parse_trial_detail(&html, &id)
                .with_context(|| format!("{} is not a trial detail page", file.display()))?;
            archive::write_pretty(std::io::stdout().lock(), &detail)?;
            println!();
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        info!("done in {}", format_duration(elapsed));
    }

    result
}

fn search_params(args: &SearchArgs) -> Result<SearchParams> {
    let params = SearchParams::from_pairs(args.params.iter().map(|(k, v)| (k.as_str(), v.as_str())))?;
    Ok(params)
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
