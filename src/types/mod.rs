pub mod calendar;
pub mod climate_record;
pub mod columns;
pub mod data_category;
pub mod date_range;
pub mod input_table;
pub mod joined_table;
pub mod match_result;
pub mod observatory;
