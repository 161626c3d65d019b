pub mod index;
pub mod matcher;
