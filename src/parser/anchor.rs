use crate::error::ExtractError;

/// A borrowed view over a token stream with anchor-relative lookups.
///
/// Anchors are matched by exact value and the first occurrence always wins.
#[derive(Debug, Clone, Copy)]
pub struct Tokens<'a> {
    items: &'a [String],
}

impl<'a> Tokens<'a> {
    pub fn new(items: &'a [String]) -> Self {
        Self { items }
    }

    pub fn position(&self, anchor: &str) -> Result<usize, ExtractError> {
        self.items
            .iter()
            .position(|t| t == anchor)
            .ok_or_else(|| ExtractError::AnchorNotFound(anchor.to_string()))
    }

    /// Token `offset` places after `anchor`.
    pub fn offset(&self, anchor: &str, offset: usize) -> Result<&'a str, ExtractError> {
        let i = self.position(anchor)?;
        self.items
            .get(i + offset)
            .map(String::as_str)
            .ok_or_else(|| ExtractError::OffsetOutOfRange {
                anchor: anchor.to_string(),
                offset,
            })
    }

    /// `T[index(start) + skip .. index(end)]`. The end anchor is never included;
    /// an end anchor located before the start yields an empty slice.
    pub fn between(&self, start: &str, end: &str, skip: usize) -> Result<&'a [String], ExtractError> {
        let from = self.position(start)? + skip;
        let to = self.position(end)?;
        if from >= to {
            return Ok(&[]);
        }
        Ok(&self.items[from..to])
    }

    /// Narrow to the tokens strictly between two section headers.
    pub fn section(&self, start: &str, end: &str) -> Result<Tokens<'a>, ExtractError> {
        self.between(start, end, 1).map(Tokens::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn offset_reads_relative_to_first_match() {
        let t = toks(&["a", "x", "b", "y", "b", "z"]);
        let tokens = Tokens::new(&t);
        assert_eq!(tokens.offset("a", 1).unwrap(), "x");
        assert_eq!(tokens.offset("b", 1).unwrap(), "y");
        assert_eq!(tokens.offset("b", 0).unwrap(), "b");
        assert_eq!(tokens.offset("a", 5).unwrap(), "z");
    }

    #[test]
    fn offset_missing_anchor() {
        let t = toks(&["a", "x"]);
        let err = Tokens::new(&t).offset("q", 1).unwrap_err();
        assert!(matches!(err, ExtractError::AnchorNotFound(a) if a == "q"));
    }

    #[test]
    fn offset_past_the_end() {
        let t = toks(&["a", "x"]);
        let err = Tokens::new(&t).offset("x", 1).unwrap_err();
        assert!(matches!(err, ExtractError::OffsetOutOfRange { offset: 1, .. }));
    }

    #[test]
    fn between_excludes_end_anchor() {
        let t = toks(&["s", "1", "2", "e", "3"]);
        let tokens = Tokens::new(&t);
        assert_eq!(tokens.between("s", "e", 1).unwrap(), &t[1..3]);
        assert_eq!(tokens.between("s", "e", 2).unwrap(), &t[2..3]);
        assert!(!tokens.between("s", "e", 0).unwrap().contains(&"e".to_string()));
    }

    #[test]
    fn between_adjacent_anchors_is_empty() {
        let t = toks(&["s", "e"]);
        assert!(Tokens::new(&t).between("s", "e", 1).unwrap().is_empty());
    }

    #[test]
    fn between_inverted_anchors_is_empty() {
        let t = toks(&["e", "x", "s"]);
        assert!(Tokens::new(&t).between("s", "e", 1).unwrap().is_empty());
    }

    #[test]
    fn section_narrows_lookups() {
        let t = toks(&["label", "outer", "S", "label", "inner", "E"]);
        let tokens = Tokens::new(&t);
        assert_eq!(tokens.offset("label", 1).unwrap(), "outer");
        let section = tokens.section("S", "E").unwrap();
        assert_eq!(section.offset("label", 1).unwrap(), "inner");
        assert!(section.position("E").is_err());
    }
}
