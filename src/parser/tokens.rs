use scraper::Html;

use crate::error::ExtractError;

/// First field label of every detail page. Everything above it is site chrome.
pub const FIRST_ANCHOR: &str = "登记号：";

/// Flatten the document into trimmed, non-empty text lines starting at
/// [`FIRST_ANCHOR`].
pub fn tokenize(document: &Html) -> Result<Vec<String>, ExtractError> {
    let text: String = document.root_element().text().collect();
    let lines: Vec<String> = text
        .split('\n')
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect();

    let start = lines
        .iter()
        .position(|l| l == FIRST_ANCHOR)
        .ok_or_else(|| ExtractError::AnchorNotFound(FIRST_ANCHOR.to_string()))?;

    Ok(lines[start..].to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_boilerplate_before_first_anchor() {
        let html = Html::parse_document(
            "<html><body><div>联系我们</div>\n<div>  </div>\n<table><tr><td>登记号：</td>\n<td>  CTR20200001 </td></tr></table></body></html>",
        );
        let tokens = tokenize(&html).unwrap();
        assert_eq!(tokens, vec!["登记号：", "CTR20200001"]);
    }

    #[test]
    fn error_page_has_no_anchor() {
        let html = Html::parse_document("<html><body><p>系统繁忙</p></body></html>");
        let err = tokenize(&html).unwrap_err();
        assert!(matches!(err, ExtractError::AnchorNotFound(a) if a == FIRST_ANCHOR));
    }

    #[test]
    fn full_width_spaces_are_trimmed() {
        let html = Html::parse_document("<p>\u{3000}登记号：\u{3000}\nX</p>");
        assert_eq!(tokenize(&html).unwrap(), vec!["登记号：", "X"]);
    }
}
