pub mod data_loader;
pub mod error;
pub mod filtering;
pub mod frame_source;
pub mod joiner;
pub mod source;
