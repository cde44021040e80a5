//! Loads calibration input series from local CSV folders and prepares the
//! observed head for a daily calibration run.

use knmi_hydro::{
    recharge, Aggregation, CalibrationSpec, InputDirs, InputKind, KnmiHydroError, SeriesStore,
};

fn main() -> Result<(), KnmiHydroError> {
    let store = SeriesStore::new(InputDirs {
        precipitation: "input_files/input_prec".into(),
        evaporation: "input_files/input_evap".into(),
        head: "input_files/input_head".into(),
    });

    // --- Pick the first file of each kind ---
    let (Some(prec_name), Some(evap_name), Some(head_name)) = (
        first_file(&store, InputKind::Precipitation)?,
        first_file(&store, InputKind::Evaporation)?,
        first_file(&store, InputKind::Head)?,
    ) else {
        eprintln!("place CSV files under input_files/input_prec, input_evap and input_head");
        return Ok(());
    };
    println!("precipitation: {prec_name}");
    println!("evaporation:   {evap_name}");
    println!("observed head: {head_name}");

    let prec = store
        .load_series(InputKind::Precipitation, &prec_name)?
        .drop_missing()?;
    let evap = store
        .load_series(InputKind::Evaporation, &evap_name)?
        .drop_missing()?;
    let head = store.load_series(InputKind::Head, &head_name)?;

    // --- Describe the calibration and prepare its inputs ---
    let spec = CalibrationSpec {
        head_aggregation: Some(Aggregation::Mean),
        ar_noise: true,
        ..CalibrationSpec::default()
    };
    let daily_head = spec.prepare_head(&head)?;
    let net = recharge(&prec, &evap)?;

    println!(
        "\ncalibrating {} through {} on {} recharge days and {} head days (AR noise: {})",
        spec.recharge_model,
        spec.response_function,
        net.len(),
        daily_head.len(),
        spec.ar_noise,
    );

    Ok(())
}

fn first_file(store: &SeriesStore, kind: InputKind) -> Result<Option<String>, KnmiHydroError> {
    Ok(store.list_files(kind)?.into_iter().next())
}
