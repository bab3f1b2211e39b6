use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, REFERER};
use reqwest::StatusCode;
use tracing::{debug, warn};

use crate::search::SearchParams;
use crate::settings::Settings;

const SEARCH_PATH: &str = "/eap/clinicaltrials.searchlist";
const SEARCH_REFERER_PATH: &str = "/eap/clinicaltrials.prosearch?pro=y";
const DETAIL_PATH: &str = "/eap/clinicaltrials.searchlistdetail";
/// The detail form posts these alongside the id, always empty.
const DETAIL_FORM_TAIL: &str = "ckm_index=&pagesize=&currentpage=";

/// Where listing and detail pages come from.
///
/// `Ok(None)` means the server answered with anything but 200; transport
/// errors are `Err`.
#[allow(async_fn_in_trait)]
pub trait TrialSource {
    async fn search_page(&self, params: &SearchParams) -> Result<Option<String>>;
    async fn detail_page(&self, ckm_id: &str) -> Result<Option<String>>;
}

/// The registry's public web form.
pub struct HttpSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSource {
    pub fn new(settings: &Settings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .user_agent(settings.user_agent.as_str())
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl TrialSource for HttpSource {
    async fn search_page(&self, params: &SearchParams) -> Result<Option<String>> {
        let url = params.to_url(&self.url(SEARCH_PATH))?;
        debug!(url = %url, page = params.get("currentpage").unwrap_or("-"), "search request");

        let resp = self
            .client
            .get(url)
            .header(REFERER, self.url(SEARCH_REFERER_PATH))
            .send()
            .await?;
        body_if_ok(resp).await
    }

    async fn detail_page(&self, ckm_id: &str) -> Result<Option<String>> {
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded"),
        );
        headers.insert(REFERER, HeaderValue::from_str(&self.url(SEARCH_PATH))?);

        let resp = self
            .client
            .post(self.url(DETAIL_PATH))
            .headers(headers)
            .body(detail_form(ckm_id))
            .send()
            .await?;
        body_if_ok(resp).await
    }
}

pub fn detail_form(ckm_id: &str) -> String {
    format!("ckm_id={}&{}", ckm_id, DETAIL_FORM_TAIL)
}

async fn body_if_ok(resp: reqwest::Response) -> Result<Option<String>> {
    let status = resp.status();
    if status != StatusCode::OK {
        warn!(status = status.as_u16(), url = %resp.url(), "non-200 response");
        return Ok(None);
    }
    Ok(Some(resp.text().await?))
}
