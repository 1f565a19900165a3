use isd_lite::{IsdClient, IsdConfig, IsdError};
use std::env;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), IsdError> {
    env_logger::init();
    configure_polars_display();

    let address = env::args()
        .nth(1)
        .unwrap_or_else(|| "Logan Airport, Boston, MA".to_string());

    let config = IsdConfig::builder()
        .request_timeout(Duration::from_secs(60))
        .build();
    let client = IsdClient::with_config(config)?;

    let resolution = client
        .resolve()
        .address(&address)
        .years(2022..=2023)
        .call()
        .await?;

    println!(
        "{} resolved to {}, nearest usable station {} ({:.1} km)",
        address,
        resolution.location,
        resolution.station_info.station,
        resolution.station_info.distance_km
    );
    for dataset in &resolution.datasets {
        let measured = dataset.records.iter().filter(|r| r.has_measurements()).count();
        println!(
            "  {}: {} hours ({} with measurements) from {}, {} skipped lines, {} closer stations failed",
            dataset.year,
            dataset.len(),
            measured,
            dataset.station.station,
            dataset.skipped_lines.len(),
            dataset.failed_candidates.len()
        );
    }
    for failure in &resolution.failed_years {
        println!("  {}", failure);
    }

    let df = resolution.to_dataframe()?;
    println!("{}", df);

    Ok(())
}

fn configure_polars_display() {
    // show every column
    env::set_var("POLARS_FMT_MAX_COLS", "-1");
    // show 20 rows
    env::set_var("POLARS_FMT_MAX_ROWS", "20");
}
