use regex::{Captures, Regex};
use std::sync::LazyLock;

static KANJI_BLOCK_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([〇一二三四五六七八九十百千]+)(丁目|番地|番|号)").expect("valid block number pattern")
});

fn digit_value(c: char) -> Option<u64> {
    match c {
        '〇' => Some(0),
        '一' => Some(1),
        '二' => Some(2),
        '三' => Some(3),
        '四' => Some(4),
        '五' => Some(5),
        '六' => Some(6),
        '七' => Some(7),
        '八' => Some(8),
        '九' => Some(9),
        _ => None,
    }
}

fn unit_value(c: char) -> Option<u64> {
    match c {
        '十' => Some(10),
        '百' => Some(100),
        '千' => Some(1000),
        _ => None,
    }
}

/// Parses a kanji numeral.
///
/// Both the positional style (`二〇` = 20) and the unit style (`二十三` = 23,
/// `十` = 10, `百五` = 105) are understood. Returns `None` for empty input or any
/// character that is not a numeral.
pub fn kanji_to_number(numeral: &str) -> Option<u64> {
    if numeral.is_empty() {
        return None;
    }

    if !numeral.chars().any(|c| unit_value(c).is_some()) {
        return numeral
            .chars()
            .try_fold(0u64, |acc, c| Some(acc.checked_mul(10)? + digit_value(c)?));
    }

    let mut total = 0u64;
    let mut pending: Option<u64> = None;
    for c in numeral.chars() {
        if let Some(d) = digit_value(c) {
            pending = Some(pending.unwrap_or(0).checked_mul(10)? + d);
        } else {
            let unit = unit_value(c)?;
            total = total.checked_add(pending.unwrap_or(1).checked_mul(unit)?)?;
            pending = None;
        }
    }
    total.checked_add(pending.unwrap_or(0))
}

/// True when the block unit ending at `end` is really part of a town name such as
/// `一番町` or `四番丁`.
pub(crate) fn is_town_name_unit(address: &str, end: usize) -> bool {
    address[end..].starts_with(['町', '丁'])
}

/// Rewrites kanji numerals that are directly followed by a block unit into Arabic
/// digits. Numerals inside place names (`八王子`, `二子玉川`, `一番町`) are left alone.
pub fn arabize_block_numbers(address: &str) -> String {
    KANJI_BLOCK_NUMBER
        .replace_all(address, |caps: &Captures| {
            let whole = &caps[0];
            let end = caps.get(0).map_or(0, |m| m.end());
            if is_town_name_unit(address, end) {
                return whole.to_string();
            }
            match kanji_to_number(&caps[1]) {
                Some(n) => format!("{}{}", n, &caps[2]),
                None => whole.to_string(),
            }
        })
        .into_owned()
}
