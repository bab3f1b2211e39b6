use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

pub const DEFAULT_BASE_URL: &str = "http://www.chinadrugtrials.org.cn";
pub const DEFAULT_PAGE_SIZE: u32 = 100;
const DEFAULT_CONFIG_FILE: &str = "cdt_scraper";
const ENV_PREFIX: &str = "CDT";

/// What a detail crawl does when one record fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Stop, write what was collected, report the error.
    #[default]
    Abort,
    /// Log the failed id and move on.
    Skip,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub base_url: String,
    pub page_size: u32,
    pub listing_delay_secs: u64,
    pub detail_delay_secs: u64,
    pub timeout_secs: u64,
    pub user_agent: String,
    pub output_dir: PathBuf,
    pub on_error: FailurePolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            listing_delay_secs: 0,
            detail_delay_secs: 8,
            timeout_secs: 30,
            user_agent: concat!("cdt_scraper/", env!("CARGO_PKG_VERSION")).to_string(),
            output_dir: PathBuf::from("."),
            on_error: FailurePolicy::Abort,
        }
    }
}

impl Settings {
    /// Defaults, then `cdt_scraper.{toml,yaml,json}` (or `file`), then `CDT_*` env vars.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let d = Settings::default();
        let builder = config::Config::builder()
            .set_default("base_url", d.base_url)?
            .set_default("page_size", u64::from(d.page_size))?
            .set_default("listing_delay_secs", d.listing_delay_secs)?
            .set_default("detail_delay_secs", d.detail_delay_secs)?
            .set_default("timeout_secs", d.timeout_secs)?
            .set_default("user_agent", d.user_agent)?
            .set_default("output_dir", d.output_dir.to_string_lossy().into_owned())?
            .set_default("on_error", "abort")?;

        let builder = match file {
            Some(path) => builder.add_source(config::File::from(path)),
            None => builder.add_source(config::File::with_name(DEFAULT_CONFIG_FILE).required(false)),
        };

        builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .context("failed to read configuration")?
            .try_deserialize()
            .context("invalid configuration")
    }

    pub fn listing_delay(&self) -> Duration {
        Duration::from_secs(self.listing_delay_secs)
    }

    pub fn detail_delay(&self) -> Duration {
        Duration::from_secs(self.detail_delay_secs)
    }
}
