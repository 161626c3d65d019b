//! Attaches daily AMeDAS observations to tables of Japanese addresses.
//!
//! Addresses are normalized to a canonical form, matched to the observatory whose
//! reference prefix they contain, and joined with that observatory's daily values.

pub mod address;
mod amedas;
pub mod climate;
mod error;
pub mod observatories;
pub mod types;
mod utils;

pub use amedas::Amedas;
pub use error::{AmedasError, ConfigurationError};

pub use address::normalizer::{AddressNormalizer, NormalizedAddress};
pub use address::parts::AddressParts;

pub use observatories::index::{MatchMode, ObservatoryIndex};
pub use observatories::matcher::{match_address, match_rows};

pub use climate::data_loader::DataLocation;
pub use climate::error::FetchError;
pub use climate::filtering::AmedasFrameFilterExt;
pub use climate::frame_source::{FrameSource, SourceConfig};
pub use climate::joiner::join;
pub use climate::source::{ClimateSource, InMemorySource};

pub use types::calendar::{Month, Year};
pub use types::climate_record::ClimateRecord;
pub use types::columns;
pub use types::data_category::DataCategory;
pub use types::date_range::{AnyDate, DatePeriod, DateRange};
pub use types::input_table::{Cell, CellKind, ColumnSpec, InputRow, InputTable, RowId};
pub use types::joined_table::{JoinedRow, JoinedTable};
pub use types::match_result::{MatchLevel, MatchResult, MatchSummary};
pub use types::observatory::{ObservatoryId, ObservatoryReference};
