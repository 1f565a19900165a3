use isd_lite::{IsdClient, IsdError, LatLon};

#[tokio::main]
async fn main() -> Result<(), IsdError> {
    env_logger::init();
    let client = IsdClient::new()?;
    let berlin = LatLon(52.52, 13.40);

    let stations = client
        .find_stations()
        .location(berlin)
        .max_distance_km(100.0)
        .station_limit(10)
        .year(2023)
        .call()
        .await?;

    println!(
        "Stations around ({}, {}) with data for 2023:",
        berlin.latitude(),
        berlin.longitude()
    );
    for candidate in &stations {
        println!(
            "  {:>6.1} km  {}  covered {:?} - {:?}",
            candidate.distance_km,
            candidate.station,
            candidate.station.coverage.start,
            candidate.station.coverage.end
        );
    }

    if let Some(closest) = stations.first() {
        let decoded = client
            .from_station()
            .usaf(&closest.station.usaf_id)
            .wban(&closest.station.wban_id)
            .year(2023)
            .call()
            .await?;
        println!(
            "{} has {} hourly records for 2023",
            closest.station,
            decoded.records.len()
        );
    }

    Ok(())
}
