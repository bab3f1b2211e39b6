use thiserror::Error;

use crate::parser::fields::Field;

/// Failures while turning a fetched page into records.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("anchor not found: {0}")]
    AnchorNotFound(String),

    #[error("no token at offset {offset} from anchor {anchor}")]
    OffsetOutOfRange { anchor: String, offset: usize },

    #[error("field {0:?} is not in the table it was read from")]
    MissingField(Field),

    #[error("listing table not found")]
    MissingListingTable,

    #[error("listing row has {found} links, expected {expected}")]
    MalformedListingRow { found: usize, expected: usize },

    #[error("listing link has no id attribute")]
    MissingRecordId,
}

/// Unknown values in the search parameters.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("unknown drug category: {0}")]
    UnknownDrugCategory(String),

    #[error("invalid search url: {0}")]
    Url(String),
}

/// A detail crawl that stopped early. Raised after the partial batch is on disk.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("detail crawl aborted after {persisted} records: {source}")]
    Aborted {
        persisted: usize,
        #[source]
        source: anyhow::Error,
    },
}
