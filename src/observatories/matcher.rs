use crate::address::normalizer::{AddressNormalizer, NormalizedAddress};
use crate::address::parts::AddressParts;
use crate::observatories::index::{Candidate, ObservatoryIndex};
use crate::types::input_table::{InputRow, RowId};
use crate::types::match_result::MatchResult;
use log::{debug, trace};
use ordered_float::OrderedFloat;

/// Resolves a normalized address to at most one observatory.
///
/// The longest reference prefix found in the address wins. Of equally long prefixes
/// the one starting earliest in the address wins, then the one declared first.
pub fn match_address(
    row_id: RowId,
    normalized: &NormalizedAddress,
    index: &ObservatoryIndex,
) -> MatchResult {
    if normalized.is_empty() {
        return MatchResult::unmatched(row_id);
    }

    let candidates = index.candidates(normalized);
    let Some(best) = candidates
        .iter()
        .min_by_key(|c| (std::cmp::Reverse(c.len()), c.start, c.ordinal))
    else {
        trace!("No observatory prefix found in '{}'", normalized);
        return MatchResult::unmatched(row_id);
    };

    // Only the same text declared for another observatory makes the pick uncertain
    let ambiguous = candidates.iter().any(|c| {
        c.start == best.start
            && c.len() == best.len()
            && c.observatory_id() != best.observatory_id()
    });
    if ambiguous {
        debug!(
            "Row {}: '{}' has several {}-character prefixes for different observatories, picked '{}'",
            row_id,
            normalized,
            best.len(),
            best.observatory_id()
        );
    }

    MatchResult {
        row_id,
        observatory_id: Some(best.observatory_id().clone()),
        matched_prefix: Some(best.entry.prefix.as_str().to_string()),
        confidence: confidence(best, normalized),
        level: AddressParts::parse(normalized).level_for_match_end(best.end()),
        ambiguous,
    }
}

/// Prefix length relative to the area part of the address, clamped to `(0, 1]`.
fn confidence(best: &Candidate<'_>, normalized: &NormalizedAddress) -> OrderedFloat<f64> {
    let area_len = normalized.area_part().chars().count().max(1);
    OrderedFloat((best.len() as f64 / area_len as f64).min(1.0))
}

/// Matches every row, reading the address from cell `address_column`. A missing or
/// null cell reads as an empty address and comes back unmatched.
pub fn match_rows(
    rows: &[InputRow],
    address_column: usize,
    normalizer: &AddressNormalizer,
    index: &ObservatoryIndex,
) -> Vec<MatchResult> {
    rows.iter()
        .map(|row| {
            let raw = row
                .cell(address_column)
                .map(|cell| cell.to_text())
                .unwrap_or_default();
            match_address(row.id(), &normalizer.normalize(&raw), index)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observatories::index::MatchMode;
    use crate::types::input_table::InputTable;
    use crate::types::match_result::MatchLevel;
    use crate::types::observatory::{ObservatoryId, ObservatoryReference};

    fn index(refs: &[(&str, &str)]) -> ObservatoryIndex {
        ObservatoryIndex::build(
            refs.iter()
                .map(|(id, prefix)| ObservatoryReference::new(*id, *prefix)),
        )
        .unwrap()
    }

    fn match_raw(raw: &str, index: &ObservatoryIndex) -> MatchResult {
        match_address(RowId(0), &AddressNormalizer::new().normalize(raw), index)
    }

    #[test]
    fn test_longest_prefix_wins() {
        let index = index(&[("東京", "東京都"), ("渋谷", "東京都渋谷区")]);
        let result = match_raw("東京都渋谷区1-2-3", &index);
        assert_eq!(result.observatory_id, Some(ObservatoryId::from("渋谷")));
        assert_eq!(result.matched_prefix.as_deref(), Some("東京都渋谷区"));
        assert_eq!(result.level, MatchLevel::Municipality);
        assert_eq!(result.confidence, OrderedFloat(1.0));
        assert!(!result.ambiguous);
    }

    #[test]
    fn test_declaration_order_breaks_ties() {
        let first = index(&[("練馬", "東京都"), ("東京", "東京都")]);
        let second = index(&[("東京", "東京都"), ("練馬", "東京都")]);

        let a = match_raw("東京都新宿区西新宿2-8-1", &first);
        let b = match_raw("東京都新宿区西新宿2-8-1", &second);
        assert_eq!(a.observatory_id, Some(ObservatoryId::from("練馬")));
        assert_eq!(b.observatory_id, Some(ObservatoryId::from("東京")));
        assert!(a.ambiguous && b.ambiguous);
        assert_eq!(a.level, MatchLevel::Prefecture);
    }

    #[test]
    fn test_anchored_match_beats_straddling_match() {
        // "京都府" also occurs inside "東京都府中市", one character in
        let index = index(&[("京都", "京都府"), ("東京", "東京都")]);
        let result = match_raw("東京都府中市宮西町1-1", &index);
        assert_eq!(result.observatory_id, Some(ObservatoryId::from("東京")));
        assert_eq!(result.matched_prefix.as_deref(), Some("東京都"));
        assert_eq!(result.level, MatchLevel::Prefecture);
        assert!(!result.ambiguous);
    }

    #[test]
    fn test_matching_is_deterministic() {
        let index = index(&[
            ("東京", "東京都"),
            ("練馬", "東京都練馬区"),
            ("渋谷", "東京都渋谷区"),
        ]);
        let first = match_raw("東京都練馬区豊玉北6-12-1", &index);
        for _ in 0..10 {
            assert_eq!(match_raw("東京都練馬区豊玉北6-12-1", &index), first);
        }
        assert_eq!(first.observatory_id, Some(ObservatoryId::from("練馬")));
    }

    #[test]
    fn test_no_match() {
        let index = index(&[("東京", "東京都")]);
        let result = match_raw("大阪府大阪市北区梅田3-1-3", &index);
        assert_eq!(result, MatchResult::unmatched(RowId(0)));

        let empty = match_raw("", &index);
        assert!(!empty.is_matched());
    }

    #[test]
    fn test_legacy_forms_match_the_same_observatory() {
        let index = index(&[("渋谷", "東京都渋谷区")]);
        let legacy = match_raw("東京都澁谷區道玄坂２丁目", &index);
        let modern = match_raw("東京都渋谷区道玄坂2丁目", &index);
        assert_eq!(legacy, modern);
        assert!(legacy.is_matched());
    }

    #[test]
    fn test_town_level_and_confidence() {
        let index = index(&[("東京", "東京都"), ("渋谷", "東京都渋谷区道玄坂")]);
        let result = match_raw("東京都渋谷区道玄坂1-2-3", &index);
        assert_eq!(result.level, MatchLevel::Town);
        assert_eq!(result.confidence, OrderedFloat(1.0));

        let result = match_raw("東京都新宿区西新宿", &index);
        assert_eq!(result.level, MatchLevel::Prefecture);
        assert_eq!(result.confidence, OrderedFloat(3.0 / 9.0));
    }

    #[test]
    fn test_prefix_mode_ignores_inner_occurrences() {
        let index = ObservatoryIndex::build_with_mode(
            vec![ObservatoryReference::new("渋谷", "渋谷区")],
            MatchMode::Prefix,
        )
        .unwrap();
        assert!(!match_raw("東京都渋谷区", &index).is_matched());
    }

    #[test]
    fn test_match_rows_keeps_row_order() {
        let index = index(&[("東京", "東京都"), ("大阪", "大阪府")]);
        let table = InputTable::from_text_rows(
            &["NAME", "ADDRESS"],
            [["a", "大阪府大阪市"], ["b", ""], ["c", "東京都港区"]],
        )
        .unwrap();
        let results = match_rows(table.rows(), 1, &AddressNormalizer::new(), &index);
        assert_eq!(results.len(), 3);
        assert_eq!(
            results.iter().map(|r| r.row_id).collect::<Vec<_>>(),
            vec![RowId(0), RowId(1), RowId(2)]
        );
        assert_eq!(results[0].observatory_id, Some(ObservatoryId::from("大阪")));
        assert!(!results[1].is_matched());
        assert_eq!(results[2].observatory_id, Some(ObservatoryId::from("東京")));
    }
}
