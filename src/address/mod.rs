pub mod legacy_kanji;
pub mod normalizer;
pub mod numerals;
pub mod parts;
