//! Date tokens embedded in run log file names.
//!
//! A stem such as `y2024m3d14p1` carries year, month, day and the log's part
//! number as its first four digit groups. Tokens are kept as written so the
//! output directory reproduces them verbatim.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::IoError;

static DIGIT_GROUP: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogName {
    pub year: String,
    pub month: String,
    pub day: String,
    /// Fourth digit group, when present.
    pub part: Option<String>,
}

impl LogName {
    pub fn from_path(path: &Path) -> Result<Self, IoError> {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::from_stem(&stem)
    }

    pub fn from_stem(stem: &str) -> Result<Self, IoError> {
        let mut groups = DIGIT_GROUP.find_iter(stem).map(|m| m.as_str().to_string());
        match (groups.next(), groups.next(), groups.next()) {
            (Some(year), Some(month), Some(day)) => Ok(Self {
                year,
                month,
                day,
                part: groups.next(),
            }),
            _ => Err(IoError::FileName(stem.to_string())),
        }
    }

    /// Directory component: the three date tokens run together.
    pub fn date_dir(&self) -> String {
        format!("{}{}{}", self.year, self.month, self.day)
    }

    /// File name for one data part of this night.
    pub fn part_file_name(&self, part: usize, detector: &str) -> String {
        format!(
            "y{}m{:0>2}d{:0>2}p{:03}.{}.weather.log",
            self.year, self.month, self.day, part, detector
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_typical_stem() {
        let name = LogName::from_path(Path::new("/logs/y2024m3d14p1.log.xml")).unwrap();
        assert_eq!(name.year, "2024");
        assert_eq!(name.month, "3");
        assert_eq!(name.day, "14");
        assert_eq!(name.part.as_deref(), Some("1"));
    }

    #[test]
    fn part_token_is_optional() {
        let name = LogName::from_stem("run_2023_11_02").unwrap();
        assert_eq!(name.date_dir(), "20231102");
        assert_eq!(name.part, None);
    }

    #[test]
    fn too_few_groups_is_an_error() {
        let err = LogName::from_stem("night2024m3").unwrap_err();
        assert!(matches!(err, IoError::FileName(_)));
    }

    #[test]
    fn file_name_pads_tokens() {
        let name = LogName::from_stem("y2024m3d4p1").unwrap();
        assert_eq!(name.date_dir(), "202434");
        assert_eq!(name.part_file_name(7, "tale"), "y2024m03d04p007.tale.weather.log");
        assert_eq!(name.part_file_name(123, "brtax4"), "y2024m03d04p123.brtax4.weather.log");
    }
}
