//! Prints the canonical form and the matched observatory for each address given on
//! the command line.

use amedas::{AddressNormalizer, Amedas, AmedasError};
use std::env;

#[tokio::main]
async fn main() -> Result<(), AmedasError> {
    env_logger::init();

    let amedas =
        Amedas::from_files("demos/data/observatories.csv", "demos/data/daily.csv").await?;
    let normalizer = AddressNormalizer::new();

    let mut addresses: Vec<String> = env::args().skip(1).collect();
    if addresses.is_empty() {
        addresses = vec![
            "東京都澁谷區道玄坂２丁目１番１号　渋谷ビル５F".to_string(),
            "神奈川縣横濱市中区山下町１０番地".to_string(),
            "東京都千代田区一番町五番地".to_string(),
            "沖縄県那覇市泉崎1-2-2".to_string(),
        ];
    }

    for address in &addresses {
        let result = amedas.find_observatory(address);
        let observatory = result
            .observatory_id
            .as_ref()
            .map(|id| id.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!("{address}");
        println!("  canonical:   {}", normalizer.normalize(address));
        println!("  observatory: {observatory}");
        println!(
            "  level:       {} (confidence {:.2})",
            result.level_label(),
            result.confidence
        );
    }
    Ok(())
}
