use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

use crate::error::ExtractError;
use crate::records::SummaryRecord;

static TABLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("table.Tab").unwrap());
static ROW: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").unwrap());
static LINK: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a").unwrap());
static PAGE_LEFT: LazyLock<Selector> = LazyLock::new(|| Selector::parse("div.page_left").unwrap());
static PAGER: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("select#current_page.page_select").unwrap());
static OPTION: LazyLock<Selector> = LazyLock::new(|| Selector::parse("option").unwrap());
static SELECTED: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"option[selected="selected"]"#).unwrap());

const HEADER_CLASS: &str = "Tab_title";
const NO_DATA: &str = "暂无数据";
const CELLS: usize = 5;

/// Summary rows of one result page. A "no data" row empties the whole page.
pub fn parse_listing(html: &str) -> Result<Vec<SummaryRecord>, ExtractError> {
    let document = Html::parse_document(html);
    let table = document
        .select(&TABLE)
        .next()
        .ok_or(ExtractError::MissingListingTable)?;

    let mut records = Vec::new();
    for tr in table.select(&ROW) {
        if tr.value().classes().any(|c| c == HEADER_CLASS) {
            continue;
        }
        if tr.text().collect::<String>().contains(NO_DATA) {
            return Ok(Vec::new());
        }
        records.push(summary_row(tr)?);
    }
    Ok(records)
}

fn summary_row(tr: ElementRef<'_>) -> Result<SummaryRecord, ExtractError> {
    let links: Vec<ElementRef<'_>> = tr.select(&LINK).collect();
    if links.len() < CELLS {
        return Err(ExtractError::MalformedListingRow {
            found: links.len(),
            expected: CELLS,
        });
    }

    let id = links[0]
        .value()
        .attr("id")
        .ok_or(ExtractError::MissingRecordId)?;

    Ok(SummaryRecord {
        id: id.trim().to_string(),
        registration_code: collapsed(links[0]),
        state: collapsed(links[1]),
        drug: collapsed(links[2]),
        indication: collapsed(links[3]),
        title: collapsed(links[4]),
    })
}

fn collapsed(el: ElementRef<'_>) -> String {
    let text: String = el.text().collect();
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Total hits from the "共 N 条记录" pager caption.
pub fn total_count(html: &str) -> Option<usize> {
    let document = Html::parse_document(html);
    let div = document.select(&PAGE_LEFT).next()?;
    let caption: String = div.text().collect();
    let (before, after) = caption.split_once(char::is_numeric)?;
    if !before.contains('共') || !after.contains("条记录") {
        return None;
    }
    let link = div.select(&LINK).next()?;
    link.text().collect::<String>().trim().parse().ok()
}

/// Selected page of the pager drop-down, 1-based.
pub fn current_page(html: &str) -> Option<u32> {
    let document = Html::parse_document(html);
    let pager = document.select(&PAGER).next()?;
    let option = pager.select(&SELECTED).next()?;
    option.text().collect::<String>().trim().parse().ok()
}

/// Number of entries in the pager drop-down.
pub fn page_options(html: &str) -> Option<usize> {
    let document = Html::parse_document(html);
    let pager = document.select(&PAGER).next()?;
    Some(pager.select(&OPTION).count())
}
