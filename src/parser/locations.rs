use std::collections::HashSet;
use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

use crate::records::{Address, Location};

static ROW: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").unwrap());
static CELL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td").unwrap());

/// Column captions of the participating-sites table.
const HEADER: [&str; 6] = ["序号", "机构名称", "主要研究者", "国家", "省（州）", "城市"];

/// Participating sites, read from the table rows under the sites header.
///
/// Rows are deduplicated on the institution cell; the first row wins.
pub fn research_locations(document: &Html) -> Vec<Location> {
    let Some(header) = document.select(&ROW).find(|tr| is_header_row(*tr)) else {
        return Vec::new();
    };

    let mut seen: HashSet<String> = HashSet::new();
    let mut locations = Vec::new();

    for node in header.next_siblings() {
        // whitespace between rows
        let Some(row) = ElementRef::wrap(node) else {
            continue;
        };
        if row.value().name() != "tr" {
            break;
        }

        let cells: Vec<String> = row.select(&CELL).map(cell_text).collect();
        let Some(agency) = cells.get(1) else {
            continue;
        };
        if !seen.insert(agency.clone()) {
            continue;
        }

        locations.push(Location {
            agency: non_empty(cells.get(1)),
            researcher: non_empty(cells.get(2)),
            address: Address {
                country: non_empty(cells.get(3)),
                state: non_empty(cells.get(4)),
                city: non_empty(cells.get(5)),
            },
        });
    }

    locations
}

/// Both the cell count and the caption text have to match.
fn is_header_row(tr: ElementRef<'_>) -> bool {
    if tr.select(&CELL).count() != HEADER.len() {
        return false;
    }
    let text: String = tr.text().collect();
    text.split_whitespace().collect::<String>() == HEADER.concat()
}

fn cell_text(td: ElementRef<'_>) -> String {
    td.text().collect::<String>().trim().to_string()
}

fn non_empty(cell: Option<&String>) -> Option<String> {
    cell.filter(|c| !c.is_empty()).cloned()
}
