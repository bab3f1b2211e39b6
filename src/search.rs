use std::collections::BTreeMap;

use reqwest::Url;

use crate::error::SearchError;

/// User-facing key for the drug category filter.
pub const DRUG_CATEGORY: &str = "drug_category";
/// Name the search form expects for the same filter.
const DRUG_CATEGORY_FIELD: &str = "drugs_type";

const DRUG_CATEGORIES: &[(&str, &str)] = &[
    ("中药/天然药物", "1"),
    ("化学药物", "2"),
    ("生物制品", "3"),
];

/// Query string of the advanced search form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchParams {
    fields: BTreeMap<String, String>,
}

impl SearchParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one filter. `drug_category` values are translated to their form codes.
    pub fn insert(&mut self, key: &str, value: &str) -> Result<(), SearchError> {
        if key == DRUG_CATEGORY {
            let code = DRUG_CATEGORIES
                .iter()
                .find(|(name, _)| *name == value)
                .map(|(_, code)| *code)
                .ok_or_else(|| SearchError::UnknownDrugCategory(value.to_string()))?;
            self.fields.insert(DRUG_CATEGORY_FIELD.to_string(), code.to_string());
        } else {
            self.fields.insert(key.to_string(), value.to_string());
        }
        Ok(())
    }

    pub fn from_pairs<'a, I>(pairs: I) -> Result<Self, SearchError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut params = Self::new();
        for (k, v) in pairs {
            params.insert(k, v)?;
        }
        Ok(params)
    }

    /// Same filters, asking for one page of `page_size` rows.
    pub fn page(&self, page: u32, page_size: u32) -> Self {
        let mut fields = self.fields.clone();
        fields.insert("pagesize".to_string(), page_size.to_string());
        fields.insert("currentpage".to_string(), page.to_string());
        Self { fields }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// `base` with the filters URL-encoded into its query.
    pub fn to_url(&self, base: &str) -> Result<Url, SearchError> {
        Url::parse_with_params(base, self.pairs()).map_err(|e| SearchError::Url(e.to_string()))
    }
}

/// Parse `key=value` as given on the command line.
pub fn parse_pair(s: &str) -> Result<(String, String), String> {
    let (k, v) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got {s:?}"))?;
    if k.is_empty() {
        return Err(format!("empty key in {s:?}"));
    }
    Ok((k.to_string(), v.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drug_category_maps_to_code() {
        let params = SearchParams::from_pairs([(DRUG_CATEGORY, "生物制品")]).unwrap();
        assert_eq!(params.get("drugs_type"), Some("3"));
        assert_eq!(params.get(DRUG_CATEGORY), None);
    }

    #[test]
    fn unknown_drug_category() {
        let err = SearchParams::from_pairs([(DRUG_CATEGORY, "疫苗")]).unwrap_err();
        assert!(matches!(err, SearchError::UnknownDrugCategory(v) if v == "疫苗"));
    }

    #[test]
    fn other_keys_pass_through() {
        let params = SearchParams::from_pairs([("keywords", "糖尿病"), ("sort", "desc")]).unwrap();
        let url = params
            .to_url("http://www.chinadrugtrials.org.cn/eap/clinicaltrials.searchlist")
            .unwrap();
        let query: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            query,
            vec![
                ("keywords".to_string(), "糖尿病".to_string()),
                ("sort".to_string(), "desc".to_string()),
            ]
        );
        assert!(url.as_str().contains("keywords=%E7%B3%96%E5%B0%BF%E7%97%85"));
    }

    #[test]
    fn page_adds_paging_fields() {
        let base = SearchParams::from_pairs([("keywords", "x")]).unwrap();
        let paged = base.page(2, 100);
        assert_eq!(paged.get("pagesize"), Some("100"));
        assert_eq!(paged.get("currentpage"), Some("2"));
        assert_eq!(base.get("currentpage"), None);
    }

    #[test]
    fn cli_pairs() {
        assert_eq!(parse_pair("a=b=c").unwrap(), ("a".to_string(), "b=c".to_string()));
        assert!(parse_pair("novalue").is_err());
        assert!(parse_pair("=v").is_err());
    }
}
