use chrono::NaiveDate;

#[derive(Debug, PartialEq, Clone)]
pub struct DailyClimate {
    pub date: NaiveDate,                    // date
    pub radiation: Option<f64>,             // radiation (global, MJ/m2/day)
    pub precipitation: Option<f64>,         // prcp (total mm)
    pub temp_min: Option<f64>,              // tmin
    pub temp_max: Option<f64>,              // tmax
    pub temp_avg: Option<f64>,              // tavg
    pub evapotranspiration: Option<f64>,    // et (Hargreaves, mm/day)
}
