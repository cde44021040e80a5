//! Defines the station identifier used when requesting daily climate data.

use std::fmt;

/// A KNMI measuring station, identified by its numeric code.
///
/// Dutch automatic weather stations carry codes in the 200&ndash;400 range
/// (for example 260 for De Bilt or 249 for Berkhout); the code is passed to
/// the daggegevens service verbatim and is not validated here.
///
/// # Examples
///
/// ```
/// use knmi_hydro::Station;
///
/// let de_bilt = Station(260);
/// assert_eq!(de_bilt.to_string(), "260");
/// assert_eq!(Station::from(249).0, 249);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Station(pub u16);

impl From<u16> for Station {
    fn from(code: u16) -> Self {
        Station(code)
    }
}

impl fmt::Display for Station {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
