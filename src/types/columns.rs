/// Area address in the observatory reference table.
pub const ADDRESS_NAME: &str = "ADDRESS_NAME";
/// Observatory assigned to an area in the reference table, and to a row in the output.
pub const NEAREST_OBSERVATORY: &str = "NEAREST_OBSERVATORY";
/// Optional human readable observatory name in the reference table, and in the output.
pub const DISPLAY_NAME: &str = "DISPLAY_NAME";

/// Observatory key of the daily observation table.
pub const OBSERVATORY_NAME: &str = "OBSERVATORY_NAME";
/// Observation day, in both the daily table and the output.
pub const DATE: &str = "DATE";

/// How deep the address match reached, in the output.
pub const MATCH_LEVEL: &str = "MATCH_LEVEL";

/// Columns appended to every joined table (besides the category value column).
pub const JOIN_COLUMNS: [&str; 4] = [NEAREST_OBSERVATORY, DISPLAY_NAME, MATCH_LEVEL, DATE];
