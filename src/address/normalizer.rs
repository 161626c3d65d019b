//! Rewrites raw addresses into a canonical, comparable form.
//!
//! The pipeline is total and idempotent: `normalize(normalize(x)) == normalize(x)`.
//! Stages run in a fixed order and each one assumes the previous ones ran.

use crate::address::legacy_kanji::replace_legacy_kanji;
use crate::address::numerals::{arabize_block_numbers, is_town_name_unit};
use regex::{Captures, Regex};
use serde::Serialize;
use std::fmt;
use std::sync::LazyLock;

/// Upper bound on how often the variant patterns are re-applied.
const MAX_PATTERN_PASSES: usize = 8;

/// Symbols dropped in the first stage, in ASCII and full-width form.
const STRIPPED_SYMBOLS: &[char] = &[
    '!', '?', '/', ':', '@', '[', ']', '`', '{', '}', '~', '！', '？', '／', '：', '＠', '［',
    '］', '｀', '｛', '｝', '～', '〜',
];

/// Characters that stand in for a hyphen between two block numbers.
const DASH_LOOKALIKES: &[char] = &['ー', '−', '‐', '‑', '―', '–', '—', '─', '━', '﹣', 'ｰ'];

/// Ordered variant rewrites. Alternatives are listed longest first where one
/// contains another.
static VARIANT_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        ("大字|小字|字", ""),
        ("鬮野川|くじ野川|くじの川", "くじ野川"),
        ("通り|とおり", "通り"),
        ("柿碕町|柿さき町", "柿碕町"),
        ("埠頭|ふ頭", "埠頭"),
        ("番町|番丁", "番町"),
        ("大冝|大宜", "大宜"),
        ("穝|さい", "穝"),
        ("杁|えぶり", "杁"),
        ("薭|稗|ひえ|ヒエ", "稗"),
        ("上ル|上る", "上る"),
        ("下ル|下る", "下る"),
        ("四ツ谷|四谷", "四谷"),
        ("[之ノの]", ""),
        ("[ｹヶケが]", "が"),
        ("[ｶヵカか力]", "か"),
        ("[ﾂッツっつ]", "つ"),
        ("[ニ二]", "二"),
        ("[ハ八]", "八"),
    ]
    .into_iter()
    .map(|(pattern, replacement)| {
        (
            Regex::new(pattern).expect("valid variant pattern"),
            replacement,
        )
    })
    .collect()
});

static BLOCK_UNIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9]+)(丁目|番地|番|号)").expect("valid block unit pattern"));

static REPEATED_HYPHENS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-{2,}").expect("valid hyphen pattern"));

/// Everything up to and including the first block-number chain (`1-2-3`).
static BLOCK_CHAIN_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*?[0-9]+(?:-[0-9]+)*)").expect("valid block chain pattern"));

/// Canonical form of an address. Only produced by [`AddressNormalizer`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize)]
#[serde(transparent)]
pub struct NormalizedAddress(String);

impl NormalizedAddress {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Length in characters, which is what prefix lengths are compared in.
    pub fn char_len(&self) -> usize {
        self.0.chars().count()
    }

    /// The address without anything after its block-number chain start, i.e. the
    /// part that names an area.
    pub fn area_part(&self) -> &str {
        match self.0.find(|c: char| c.is_ascii_digit()) {
            Some(idx) => &self.0[..idx],
            None => &self.0,
        }
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for NormalizedAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NormalizedAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The address rewrite pipeline.
///
/// # Examples
///
/// ```
/// use amedas::AddressNormalizer;
///
/// let normalizer = AddressNormalizer::new();
/// let address = normalizer.normalize("東京都澁谷區道玄坂２丁目１番１号　渋谷ビル５F");
/// assert_eq!(address.as_str(), "東京都渋谷区道玄坂2-1-1");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct AddressNormalizer;

impl AddressNormalizer {
    pub fn new() -> Self {
        Self
    }

    pub fn normalize(&self, raw: &str) -> NormalizedAddress {
        let stripped = strip_symbols(raw);
        if stripped.is_empty() {
            return NormalizedAddress::default();
        }
        let modern = replace_legacy_kanji(&stripped);
        let folded = fold_width_and_case(&modern);
        let unified = apply_variant_patterns(folded);
        let numbered = normalize_numerals(&unified);
        let area = strip_building(&numbered);
        NormalizedAddress(area.trim().to_string())
    }
}

fn strip_symbols(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace() && !STRIPPED_SYMBOLS.contains(c))
        .collect()
}

fn fold_width_and_case(address: &str) -> String {
    address
        .chars()
        .map(|c| match c {
            '\u{FF01}'..='\u{FF5E}' => char::from_u32(c as u32 - 0xFEE0).unwrap_or(c),
            _ => c,
        })
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

fn apply_variant_patterns(mut address: String) -> String {
    for _ in 0..MAX_PATTERN_PASSES {
        let next = VARIANT_PATTERNS
            .iter()
            .fold(address.clone(), |acc, (regex, replacement)| {
                regex.replace_all(&acc, *replacement).into_owned()
            });
        if next == address {
            break;
        }
        address = next;
    }
    address
}

fn normalize_numerals(address: &str) -> String {
    let arabic = arabize_block_numbers(address);
    let hyphenated = BLOCK_UNIT
        .replace_all(&arabic, |caps: &Captures| {
            let end = caps.get(0).map_or(0, |m| m.end());
            if is_town_name_unit(&arabic, end) {
                caps[0].to_string()
            } else {
                format!("{}-", &caps[1])
            }
        })
        .into_owned();
    let dashed = unify_dashes(&hyphenated);
    REPEATED_HYPHENS
        .replace_all(&dashed, "-")
        .trim_end_matches('-')
        .to_string()
}

/// Replaces dash look-alikes with `-` where they sit between two digits.
fn unify_dashes(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    let mut out = String::with_capacity(address.len());
    for (i, &c) in chars.iter().enumerate() {
        let after_digit = i > 0 && chars[i - 1].is_ascii_digit();
        let before_digit = chars.get(i + 1).is_some_and(|n| n.is_ascii_digit());
        if DASH_LOOKALIKES.contains(&c) && after_digit && before_digit {
            out.push('-');
        } else {
            out.push(c);
        }
    }
    out
}

fn strip_building(address: &str) -> &str {
    BLOCK_CHAIN_PREFIX
        .captures(address)
        .and_then(|caps| caps.get(1))
        .map_or(address, |m| m.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalize(raw: &str) -> String {
        AddressNormalizer::new().normalize(raw).into_string()
    }

    #[test]
    fn test_empty_and_symbol_only_input() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("　 \t"), "");
        assert_eq!(normalize("!?／：＠"), "");
    }

    #[test]
    fn test_strips_building_and_room() {
        assert_eq!(
            normalize("東京都渋谷区道玄坂1-2-3渋谷ビル5F"),
            "東京都渋谷区道玄坂1-2-3"
        );
        assert_eq!(
            normalize("東京都渋谷区道玄坂1-2-3 渋谷ビル 501号室"),
            "東京都渋谷区道玄坂1-2-3"
        );
    }

    #[test]
    fn test_full_width_digits_and_block_units() {
        assert_eq!(
            normalize("東京都渋谷区道玄坂２丁目１番１号"),
            "東京都渋谷区道玄坂2-1-1"
        );
        assert_eq!(normalize("東京都渋谷区道玄坂２－１－１"), "東京都渋谷区道玄坂2-1-1");
        assert_eq!(normalize("東京都渋谷区道玄坂2ー1ー1"), "東京都渋谷区道玄坂2-1-1");
    }

    #[test]
    fn test_kanji_block_numbers() {
        assert_eq!(
            normalize("大阪府大阪市北区梅田三丁目一番三号"),
            "大阪府大阪市北区梅田3-1-3"
        );
        assert_eq!(normalize("東京都八王子市"), "東京都八王子市");
    }

    #[test]
    fn test_legacy_forms_match_modern_forms() {
        assert_eq!(normalize("東京都澁谷區"), normalize("東京都渋谷区"));
        assert_eq!(normalize("神奈川縣横濱市"), normalize("神奈川県横浜市"));
    }

    #[test]
    fn test_variant_patterns() {
        assert_eq!(normalize("京都府京都市中京区三条通り"), "京都府京都市中京区三条通り");
        assert_eq!(normalize("三重県四日市市大字小杉"), "三重県四日市市小杉");
        assert_eq!(normalize("東京都新宿区四ツ谷"), "東京都新宿区四谷");
        assert_eq!(normalize("茨城県龍ケ崎市"), normalize("茨城県龍ヶ崎市"));
        assert_eq!(normalize("東京都千代田区一番町"), "東京都千代田区一番町");
    }

    #[test]
    fn test_width_and_case_folding() {
        assert_eq!(normalize("ａｂｃ１"), "ABC1");
    }

    #[test]
    fn test_idempotent() {
        let samples = [
            "東京都澁谷區道玄坂２丁目１番１号　渋谷ビル５F",
            "大阪府大阪市北区梅田三丁目一番三号",
            "北海道札幌市中央区北一条西二丁目",
            "京都府京都市下京区四条通り烏丸東入ル",
            "東京都千代田区一番町五番地",
            "福岡県福岡市博多区博多駅前1ー1ー1",
            "神奈川縣横濱市中區山下町",
            "愛知県名古屋市中村区名駅の一丁目",
            "---",
            "",
        ];
        for sample in samples {
            let once = normalize(sample);
            assert_eq!(normalize(&once), once, "not idempotent for {sample}");
        }
    }

    #[test]
    fn test_area_part() {
        let address = AddressNormalizer::new().normalize("東京都渋谷区道玄坂2-1-1");
        assert_eq!(address.area_part(), "東京都渋谷区道玄坂");
        assert_eq!(address.char_len(), 14);
    }
}
