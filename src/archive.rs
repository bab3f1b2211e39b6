use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Serialize;

use crate::records::{SummaryRecord, TrialDetail};

/// `chinese_clinical_trial_<19Oct2026>_<suffix>.tsv` under `dir`.
pub fn summary_path(dir: &Path, day: NaiveDate, suffix: &str) -> PathBuf {
    dir.join(format!(
        "chinese_clinical_trial_{}_{}.tsv",
        day.format("%d%b%Y"),
        suffix
    ))
}

/// `chinese_clinical_trial_detail_<19Oct2026>_<suffix>.json` under `dir`.
pub fn detail_path(dir: &Path, day: NaiveDate, suffix: &str) -> PathBuf {
    dir.join(format!(
        "chinese_clinical_trial_detail_{}_{}.json",
        day.format("%d%b%Y"),
        suffix
    ))
}

/// Tab-separated, one header row then one row per record.
pub fn write_summaries(path: &Path, records: &[SummaryRecord]) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_path(path)
        .with_context(|| format!("cannot create {}", path.display()))?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn read_summaries(path: &Path) -> Result<Vec<SummaryRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("cannot open {}", path.display()))?;
    let mut records = Vec::new();
    for row in reader.deserialize() {
        records.push(row?);
    }
    Ok(records)
}

/// Record ids from an earlier summary archive, in file order.
pub fn read_ids(path: &Path) -> Result<Vec<String>> {
    Ok(read_summaries(path)?.into_iter().map(|r| r.id).collect())
}

/// JSON array, four-space indent, non-ASCII written as-is. Missing parent
/// folders are created.
pub fn write_details(path: &Path, details: &[TrialDetail]) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("cannot create {}", dir.display()))?;
    }
    let file = File::create(path).with_context(|| format!("cannot create {}", path.display()))?;
    let mut out = BufWriter::new(file);
    write_pretty(&mut out, details)?;
    out.flush()?;
    Ok(())
}

pub fn write_pretty<W: Write, T: Serialize + ?Sized>(out: W, value: &T) -> Result<()> {
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(out, formatter);
    value.serialize(&mut ser)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(id: &str, title: &str) -> SummaryRecord {
        SummaryRecord {
            id: id.to_string(),
            registration_code: "CTR20200001".to_string(),
            state: "进行中".to_string(),
            drug: "某某片".to_string(),
            indication: "2型糖尿病".to_string(),
            title: title.to_string(),
        }
    }

    #[test]
    fn file_names() {
        let day = NaiveDate::from_ymd_opt(2018, 1, 18).unwrap();
        let dir = Path::new("out");
        assert_eq!(
            summary_path(dir, day, "bio"),
            Path::new("out/chinese_clinical_trial_18Jan2018_bio.tsv")
        );
        assert_eq!(
            detail_path(dir, day, "bio"),
            Path::new("out/chinese_clinical_trial_detail_18Jan2018_bio.json")
        );
    }

    #[test]
    fn summaries_are_tab_separated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s.tsv");
        write_summaries(&path, &[summary("a1", "研究 一"), summary("b2", "研究二")]).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("id\tregistration_code\tstate\tdrug\tindication\ttitle")
        );
        assert_eq!(
            lines.next(),
            Some("a1\tCTR20200001\t进行中\t某某片\t2型糖尿病\t研究 一")
        );
        assert_eq!(read_ids(&path).unwrap(), vec!["a1", "b2"]);
    }

    #[test]
    fn details_use_four_space_indent() {
        let mut buf = Vec::new();
        write_pretty(&mut buf, &vec![serde_json::json!({ "condition": "糖尿病" })]).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "[\n    {\n        \"condition\": \"糖尿病\"\n    }\n]");
    }

    #[test]
    fn details_create_missing_folders() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("new").join("d.json");
        write_details(&path, &[]).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn empty_batch_is_an_empty_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("d.json");
        write_details(&path, &[]).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[]");
    }
}
