//! Joins daily rainfall onto a CSV of store addresses.
//!
//! Usage: `cargo run --example join_csv -- [input.csv] [category] [start] [end] [output.csv]`
//! Set RUST_LOG=info (or debug) to see what the pipeline does.

use amedas::{Amedas, DataCategory, DateRange, InputTable};
use std::env;
use std::error::Error;
use std::path::PathBuf;

const DATA_DIR: &str = "demos/data";

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    configure_polars_display();

    let args: Vec<String> = env::args().skip(1).collect();
    let arg = |i: usize, default: &str| args.get(i).cloned().unwrap_or_else(|| default.to_string());

    let input = PathBuf::from(arg(0, &format!("{DATA_DIR}/stores.csv")));
    let category: DataCategory = arg(1, "rainfall").parse()?;
    let date_range = DateRange::new(arg(2, "2024-01-01"), arg(3, "2024-01-03"))?;
    let output = PathBuf::from(arg(4, "joined.csv"));

    let amedas = Amedas::from_files(
        format!("{DATA_DIR}/observatories.csv"),
        format!("{DATA_DIR}/daily.csv"),
    )
    .await?;
    let table = InputTable::from_csv_path(&input)?;

    let joined = amedas
        .process_input_data()
        .table(&table)
        .address_column("ADDRESS")
        .category(category)
        .date_range(date_range)
        .call()
        .await?;

    println!("{}", joined.to_dataframe()?);
    println!("{}", joined.match_summary());

    joined.write_csv(&output)?;
    println!("Wrote {} rows to {}", joined.len(), output.display());
    Ok(())
}

fn configure_polars_display() {
    // show every column
    env::set_var("POLARS_FMT_MAX_COLS", "-1");
    // show 30 rows
    env::set_var("POLARS_FMT_MAX_ROWS", "30");
}
