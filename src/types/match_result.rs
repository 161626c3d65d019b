use crate::types::input_table::RowId;
use crate::types::observatory::ObservatoryId;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

/// Administrative depth reached by the winning reference prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchLevel {
    /// The prefix reaches into the town / block component (町丁目).
    Town,
    /// The prefix ends inside the city, ward or district component (市区郡).
    Municipality,
    /// Only the prefecture (都道府県) was matched.
    Prefecture,
    Unmatched,
}

impl MatchLevel {
    pub const ALL: [MatchLevel; 4] = [
        MatchLevel::Town,
        MatchLevel::Municipality,
        MatchLevel::Prefecture,
        MatchLevel::Unmatched,
    ];

    /// Label written to the `MATCH_LEVEL` output column.
    pub fn label(&self) -> &'static str {
        match self {
            MatchLevel::Town => "町丁目レベル",
            MatchLevel::Municipality => "市区郡レベル",
            MatchLevel::Prefecture => "都道府県レベル",
            MatchLevel::Unmatched => "住所形式が不適切です",
        }
    }
}

impl fmt::Display for MatchLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Exactly one per input row. An unmatched row is represented explicitly rather than
/// by absence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    pub row_id: RowId,
    pub observatory_id: Option<ObservatoryId>,
    /// The canonical reference prefix that won, if any.
    pub matched_prefix: Option<String>,
    /// Share of the address area covered by the prefix, in `(0, 1]`; `0` if unmatched.
    pub confidence: OrderedFloat<f64>,
    pub level: MatchLevel,
    /// Another prefix of the same length pointed at a different observatory.
    pub ambiguous: bool,
}

impl MatchResult {
    pub fn unmatched(row_id: RowId) -> Self {
        Self {
            row_id,
            observatory_id: None,
            matched_prefix: None,
            confidence: OrderedFloat(0.0),
            level: MatchLevel::Unmatched,
            ambiguous: false,
        }
    }

    pub fn is_matched(&self) -> bool {
        self.observatory_id.is_some()
    }

    /// The level label, with a note appended when the choice was not unique.
    pub fn level_label(&self) -> Cow<'static, str> {
        level_label(self.level, self.ambiguous)
    }
}

pub(crate) fn level_label(level: MatchLevel, ambiguous: bool) -> Cow<'static, str> {
    if ambiguous {
        Cow::Owned(format!("{}（2件以上あるので特定できていません）", level.label()))
    } else {
        Cow::Borrowed(level.label())
    }
}

/// Row counts per [`MatchLevel`], as shown after a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MatchSummary {
    pub total: usize,
    pub ambiguous: usize,
    pub per_level: BTreeMap<MatchLevel, usize>,
}

impl MatchSummary {
    pub fn from_results<'a>(results: impl IntoIterator<Item = &'a MatchResult>) -> Self {
        let mut summary = Self::default();
        for result in results {
            summary.total += 1;
            if result.ambiguous {
                summary.ambiguous += 1;
            }
            *summary.per_level.entry(result.level).or_insert(0) += 1;
        }
        summary
    }

    pub fn count(&self, level: MatchLevel) -> usize {
        self.per_level.get(&level).copied().unwrap_or(0)
    }

    /// Fraction of rows at `level`; `0.0` for an empty run.
    pub fn share(&self, level: MatchLevel) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.count(level) as f64 / self.total as f64
    }

    pub fn matched(&self) -> usize {
        self.total - self.count(MatchLevel::Unmatched)
    }
}

impl fmt::Display for MatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} rows, {} ambiguous", self.total, self.ambiguous)?;
        for level in MatchLevel::ALL {
            writeln!(
                f,
                "  {:<12} {:>6} ({:>5.1}%)",
                level.label(),
                self.count(level),
                self.share(level) * 100.0
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unmatched_result() {
        let result = MatchResult::unmatched(RowId(4));
        assert!(!result.is_matched());
        assert_eq!(result.confidence, OrderedFloat(0.0));
        assert_eq!(result.level, MatchLevel::Unmatched);
        assert_eq!(result.level_label(), "住所形式が不適切です");
    }

    #[test]
    fn test_ambiguous_label() {
        let result = MatchResult {
            row_id: RowId(0),
            observatory_id: Some(ObservatoryId::from("東京")),
            matched_prefix: Some("東京都".to_string()),
            confidence: OrderedFloat(0.5),
            level: MatchLevel::Prefecture,
            ambiguous: true,
        };
        assert!(result.level_label().starts_with("都道府県レベル"));
        assert!(result.level_label().contains("2件以上"));
    }

    #[test]
    fn test_summary_shares() {
        let mut town = MatchResult::unmatched(RowId(0));
        town.observatory_id = Some(ObservatoryId::from("東京"));
        town.level = MatchLevel::Town;
        let results = vec![town, MatchResult::unmatched(RowId(1))];

        let summary = MatchSummary::from_results(&results);
        assert_eq!(summary.total, 2);
        assert_eq!(summary.matched(), 1);
        assert_eq!(summary.count(MatchLevel::Town), 1);
        assert_eq!(summary.share(MatchLevel::Unmatched), 0.5);
        assert_eq!(summary.share(MatchLevel::Prefecture), 0.0);
    }
}
