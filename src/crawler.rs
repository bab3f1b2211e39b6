use std::path::Path;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use crate::archive;
use crate::client::TrialSource;
use crate::error::CrawlError;
use crate::parser::listing::{current_page, page_options};
use crate::parser::{parse_listing, parse_trial_detail, total_count};
use crate::records::{SummaryRecord, TrialDetail};
use crate::search::SearchParams;
use crate::settings::FailurePolicy;

const PROGRESS_EVERY: usize = 50;

/// Pages needed to cover `total` rows.
///
/// Rounds up; an exact multiple of `page_size` does not get an extra page.
pub fn page_count(total: usize, page_size: u32) -> usize {
    if page_size == 0 {
        return 0;
    }
    total.div_ceil(page_size as usize)
}

/// 1-based page numbers, in request order.
pub fn page_numbers(pages: usize) -> impl Iterator<Item = u32> {
    1..=pages as u32
}

/// Every summary row matching `params`, one page at a time.
///
/// The page count comes from the "共 N 条记录" caption of the first response,
/// or from the pager drop-down when the caption is missing.
pub async fn search_summaries<S: TrialSource>(
    source: &S,
    params: &SearchParams,
    page_size: u32,
    delay: Duration,
) -> Result<Vec<SummaryRecord>> {
    let first = source
        .search_page(params)
        .await?
        .ok_or_else(|| anyhow!("unable to perform search"))?;

    let pages = match total_count(&first) {
        Some(total) => {
            info!(total, "search matched");
            page_count(total, page_size)
        }
        None => {
            warn!("result count not found on the first page, using the pager");
            page_options(&first).unwrap_or(0)
        }
    };
    info!(pages, "fetching result pages");

    let pb = progress_bar(pages as u64);
    let mut records = Vec::new();
    for page in page_numbers(pages) {
        let html = source
            .search_page(&params.page(page, page_size))
            .await?
            .ok_or_else(|| anyhow!("result page {} unavailable", page))?;
        if let Some(shown) = current_page(&html) {
            if shown != page {
                warn!(requested = page, shown, "server returned a different page");
            }
        }
        let rows = parse_listing(&html).with_context(|| format!("result page {}", page))?;
        records.extend(rows);
        pb.inc(1);
        pause(delay).await;
    }
    pb.finish_and_clear();

    info!(count = records.len(), "summary rows collected");
    Ok(records)
}

/// Details collected by [`fetch_details`]. `error` is set when the crawl stopped
/// early; `details` then holds everything fetched before the failure.
pub struct DetailBatch {
    pub details: Vec<TrialDetail>,
    pub error: Option<anyhow::Error>,
}

/// Fetch and parse each id in order. Ids the server does not return are
/// skipped; a transport or parse failure ends the crawl under
/// [`FailurePolicy::Abort`].
pub async fn fetch_details<S: TrialSource>(
    source: &S,
    ids: &[String],
    delay: Duration,
    policy: FailurePolicy,
) -> DetailBatch {
    info!(ids = ids.len(), "start getting trial details");
    let pb = progress_bar(ids.len() as u64);
    let mut details = Vec::new();

    for id in ids {
        match fetch_detail(source, id).await {
            Ok(Some(detail)) => {
                details.push(detail);
                if details.len() % PROGRESS_EVERY == 0 {
                    info!(count = details.len(), "trial details fetched");
                }
            }
            Ok(None) => warn!(id = %id, "no detail page returned"),
            Err(e) => match policy {
                FailurePolicy::Abort => {
                    warn!(id = %id, error = %e, count = details.len(), "download terminated");
                    pb.finish_and_clear();
                    return DetailBatch {
                        details,
                        error: Some(e),
                    };
                }
                FailurePolicy::Skip => warn!(id = %id, error = %e, "skipping trial"),
            },
        }
        pb.inc(1);
        pause(delay).await;
    }

    pb.finish_and_clear();
    info!(count = details.len(), "download complete");
    DetailBatch {
        details,
        error: None,
    }
}

async fn fetch_detail<S: TrialSource>(source: &S, id: &str) -> Result<Option<TrialDetail>> {
    let Some(html) = source.detail_page(id).await? else {
        return Ok(None);
    };
    let detail = parse_trial_detail(&html, id).with_context(|| format!("trial {}", id))?;
    Ok(Some(detail))
}

/// Fetch details and write them to `path`. On failure the partial batch is
/// still written before the error is returned; if that write fails too, the
/// crawl error is kept and the write error is attached to it.
pub async fn archive_details<S: TrialSource>(
    source: &S,
    ids: &[String],
    path: &Path,
    delay: Duration,
    policy: FailurePolicy,
) -> Result<usize> {
    let batch = fetch_details(source, ids, delay, policy).await;
    let written = archive::write_details(path, &batch.details);
    if written.is_ok() {
        info!(path = %path.display(), count = batch.details.len(), "archive completed");
    }

    match (batch.error, written) {
        (Some(cause), Ok(())) => Err(CrawlError::Aborted {
            persisted: batch.details.len(),
            source: cause,
        }
        .into()),
        (Some(cause), Err(e)) => {
            warn!(path = %path.display(), error = %e, "partial archive not written");
            Err(CrawlError::Aborted {
                persisted: 0,
                source: cause.context(format!("partial archive not written: {:#}", e)),
            }
            .into())
        }
        (None, Err(e)) => Err(e),
        (None, Ok(())) => Ok(batch.details.len()),
    }
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

fn progress_bar(len: u64) -> ProgressBar {
    let pb = ProgressBar::new(len);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")
    {
        pb.set_style(style.progress_chars("=> "));
    }
    pb
}
