//! Fetches KNMI precipitation and evapotranspiration for one station and
//! derives the daily groundwater recharge series.

use chrono::NaiveDate;
use knmi_hydro::{recharge, KnmiHydro, KnmiHydroError, Station};

#[tokio::main]
async fn main() -> Result<(), KnmiHydroError> {
    let client = KnmiHydro::new()?;

    // --- Fetch both stress series for Berkhout (station 249) ---
    let (prec, evap) = client
        .prec_evap()
        .station(Station(249))
        .start(NaiveDate::from_ymd_opt(2023, 1, 1).unwrap())
        .end(NaiveDate::from_ymd_opt(2023, 12, 31).unwrap())
        .call()
        .await?;

    println!("precipitation days:      {}", prec.len());
    println!("evapotranspiration days: {}", evap.len());

    // --- Subtract on the shared dates ---
    let net = recharge(&prec, &evap)?;
    println!("\nrecharge frame:\n{}", net.frame());

    println!("first days:");
    for point in net.points()?.iter().take(5) {
        println!("  {}: {:?} mm", point.time.date(), point.value);
    }

    Ok(())
}
