//! Loads measurement series from locally stored CSV folders.

use crate::series::frame::{TimeSeries, COL_TIME, COL_VALUE};
use crate::store::error::StoreError;
use crate::utils::is_numeric_dtype;
use log::info;
use polars::prelude::*;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// The input folders a [`SeriesStore`] draws from, one per signal kind.
#[derive(Debug, Clone)]
pub struct InputDirs {
    pub precipitation: PathBuf,
    pub evaporation: PathBuf,
    pub head: PathBuf,
}

/// Selects one of the configured input folders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Precipitation,
    Evaporation,
    Head,
}

/// The series of a two-signal file, split apart.
#[derive(Debug, Clone)]
pub struct SignalPair {
    /// First numeric column after the timestamps.
    pub primary: TimeSeries,
    /// Second numeric column, when the file carries one.
    pub secondary: Option<TimeSeries>,
}

/// Reads calibration input series from CSV files on disk.
///
/// Files hold a timestamp column first, then one or more value columns.
/// Loaded series keep missing observations as nulls; callers that need a
/// dense series follow up with [`TimeSeries::drop_missing`].
///
/// # Examples
///
/// ```no_run
/// use knmi_hydro::{InputDirs, InputKind, SeriesStore};
///
/// let store = SeriesStore::new(InputDirs {
///     precipitation: "input_files/input_prec".into(),
///     evaporation: "input_files/input_evap".into(),
///     head: "input_files/input_head".into(),
/// });
/// for name in store.list_files(InputKind::Head)? {
///     let head = store.load_series(InputKind::Head, &name)?;
///     println!("{name}: {} observations", head.len());
/// }
/// # Ok::<(), knmi_hydro::StoreError>(())
/// ```
pub struct SeriesStore {
    dirs: InputDirs,
}

impl SeriesStore {
    pub fn new(dirs: InputDirs) -> SeriesStore {
        SeriesStore { dirs }
    }

    fn dir(&self, kind: InputKind) -> &Path {
        match kind {
            InputKind::Precipitation => &self.dirs.precipitation,
            InputKind::Evaporation => &self.dirs.evaporation,
            InputKind::Head => &self.dirs.head,
        }
    }

    /// Lists the CSV files in the folder for `kind`, sorted by name.
    ///
    /// A folder that does not exist yields an empty list; any other I/O
    /// failure is an error. The extension check ignores case.
    pub fn list_files(&self, kind: InputKind) -> Result<Vec<String>, StoreError> {
        let dir = self.dir(kind);
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::DirRead(dir.to_path_buf(), e)),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::DirRead(dir.to_path_buf(), e))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.to_lowercase().ends_with(".csv") {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }

    /// Loads `file_name` from the folder for `kind` as a single series.
    ///
    /// The first column holds the timestamps; the first numeric column after
    /// it holds the values.
    pub fn load_series(&self, kind: InputKind, file_name: &str) -> Result<TimeSeries, StoreError> {
        let path = self.dir(kind).join(file_name);
        let df = read_csv(&path)?;
        let (time, numeric) = signal_columns(&path, &df)?;
        let value = numeric
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::NoValueColumn(path.clone()))?;

        let series = to_series(&path, time, value)?;
        info!("Loaded {} observations from {}", series.len(), path.display());
        Ok(series)
    }

    /// Splits a two-signal file into its primary and secondary series.
    ///
    /// The first numeric column is the primary signal, the second, when
    /// present, the secondary. Both share the file's timestamp column.
    pub fn load_signals(path: &Path) -> Result<SignalPair, StoreError> {
        let df = read_csv(path)?;
        let (time, numeric) = signal_columns(path, &df)?;
        let mut numeric = numeric.into_iter();
        let primary = numeric
            .next()
            .ok_or_else(|| StoreError::NoValueColumn(path.to_path_buf()))?;
        let secondary = numeric.next();

        let primary = to_series(path, time.clone(), primary)?;
        let secondary = secondary
            .map(|column| to_series(path, time, column))
            .transpose()?;
        info!(
            "Loaded {} signal(s) from {}",
            1 + secondary.is_some() as usize,
            path.display()
        );
        Ok(SignalPair { primary, secondary })
    }
}

fn read_csv(path: &Path) -> Result<DataFrame, StoreError> {
    CsvReadOptions::default()
        .with_parse_options(CsvParseOptions::default().with_try_parse_dates(true))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .map_err(|e| StoreError::CsvRead {
            path: path.to_path_buf(),
            source: e,
        })?
        .finish()
        .map_err(|e| StoreError::CsvRead {
            path: path.to_path_buf(),
            source: e,
        })
}

/// Splits a loaded frame into its timestamp column and the numeric columns
/// following it, validating the file layout.
fn signal_columns(path: &Path, df: &DataFrame) -> Result<(Series, Vec<Series>), StoreError> {
    let columns = df.get_columns();
    let Some(time) = columns.first() else {
        return Err(StoreError::NoColumns(path.to_path_buf()));
    };
    if !matches!(time.dtype(), DataType::Date | DataType::Datetime(_, _)) {
        return Err(StoreError::TimestampColumn {
            path: path.to_path_buf(),
            dtype: time.dtype().clone(),
        });
    }

    let numeric = columns[1..]
        .iter()
        .filter(|column| is_numeric_dtype(column.dtype()))
        .map(|column| column.as_materialized_series().clone())
        .collect();
    Ok((time.as_materialized_series().clone(), numeric))
}

fn to_series(path: &Path, time: Series, value: Series) -> Result<TimeSeries, StoreError> {
    let df = DataFrame::new(vec![
        time.with_name(COL_TIME.into()).into_column(),
        value.with_name(COL_VALUE.into()).into_column(),
    ])
    .map_err(|e| StoreError::CsvRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    TimeSeries::from_frame(df).map_err(|e| StoreError::Series {
        path: path.to_path_buf(),
        source: e,
    })
}
