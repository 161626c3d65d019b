use crate::address::normalizer::NormalizedAddress;
use crate::types::match_result::MatchLevel;
use regex::Regex;
use std::sync::LazyLock;

// Municipalities whose name contains a character that would otherwise end the
// municipality component early are listed explicitly.
static ADDRESS_SPLIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^(?P<pref>東京都|北海道|京都府|大阪府|[^0-9\-]{2,3}県)?",
        r"(?P<city>(?:京都|札幌|福岡|田村|東村山|武蔵村山|羽村|十日町|野々市|大町|蒲郡|四日市|大和郡山|廿日市|大村)市",
        r"|.+?郡(?:玉村|大町|.+?)[町村]",
        r"|.+?市.+?区",
        r"|.+?[市区町村])?",
        r"(?P<town>.*)$",
    ))
    .expect("valid address split pattern")
});

/// Components of a canonical address. Any of them may be empty.
///
/// ```
/// use amedas::{AddressNormalizer, AddressParts};
///
/// let address = AddressNormalizer::new().normalize("大阪府大阪市北区梅田3-1-3");
/// let parts = AddressParts::parse(&address);
/// assert_eq!(parts.prefecture, "大阪府");
/// assert_eq!(parts.municipality, "大阪市北区");
/// assert_eq!(parts.town, "梅田3-1-3");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressParts<'a> {
    pub prefecture: &'a str,
    pub municipality: &'a str,
    pub town: &'a str,
}

impl<'a> AddressParts<'a> {
    pub fn parse(address: &'a NormalizedAddress) -> Self {
        Self::parse_str(address.as_str())
    }

    pub(crate) fn parse_str(address: &'a str) -> Self {
        let Some(caps) = ADDRESS_SPLIT.captures(address) else {
            return Self {
                prefecture: "",
                municipality: "",
                town: address,
            };
        };
        let group = |name: &str| caps.name(name).map_or("", |m| m.as_str());
        let (prefecture, municipality, town) = (group("pref"), group("city"), group("town"));
        Self {
            prefecture,
            municipality,
            town,
        }
    }

    /// Character offset where the prefecture component ends.
    pub fn prefecture_end(&self) -> usize {
        self.prefecture.chars().count()
    }

    /// Character offset where the municipality component ends.
    pub fn municipality_end(&self) -> usize {
        self.prefecture_end() + self.municipality.chars().count()
    }

    /// Classifies a match that ends at character offset `match_end`.
    pub fn level_for_match_end(&self, match_end: usize) -> MatchLevel {
        if match_end == 0 {
            MatchLevel::Unmatched
        } else if match_end > self.municipality_end() {
            MatchLevel::Town
        } else if match_end > self.prefecture_end() {
            MatchLevel::Municipality
        } else {
            MatchLevel::Prefecture
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_address() {
        let parts = AddressParts::parse_str("東京都渋谷区道玄坂2-1-1");
        assert_eq!(parts.prefecture, "東京都");
        assert_eq!(parts.municipality, "渋谷区");
        assert_eq!(parts.town, "道玄坂2-1-1");
        assert_eq!(parts.prefecture_end(), 3);
        assert_eq!(parts.municipality_end(), 6);
    }

    #[test]
    fn test_without_prefecture() {
        let parts = AddressParts::parse_str("横浜市都筑区茅ヶ崎中央");
        assert_eq!(parts.prefecture, "");
        assert_eq!(parts.municipality, "横浜市都筑区");
    }

    #[test]
    fn test_listed_municipalities() {
        let parts = AddressParts::parse_str("三重県四日市市諏訪町");
        assert_eq!(parts.prefecture, "三重県");
        assert_eq!(parts.municipality, "四日市市");
        assert_eq!(parts.town, "諏訪町");

        let parts = AddressParts::parse_str("北海道上川郡東川町");
        assert_eq!(parts.prefecture, "北海道");
        assert_eq!(parts.municipality, "上川郡東川町");
    }

    #[test]
    fn test_level_for_match_end() {
        let parts = AddressParts::parse_str("東京都渋谷区道玄坂2-1-1");
        assert_eq!(parts.level_for_match_end(3), MatchLevel::Prefecture);
        assert_eq!(parts.level_for_match_end(6), MatchLevel::Municipality);
        assert_eq!(parts.level_for_match_end(9), MatchLevel::Town);
        assert_eq!(parts.level_for_match_end(0), MatchLevel::Unmatched);
    }
}
