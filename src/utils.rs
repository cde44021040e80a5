use chrono::{NaiveDate, NaiveTime};
use polars::prelude::DataType;

/// Millisecond timestamp of midnight at the start of `date`.
pub(crate) fn day_start_ms(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp_millis()
}

/// Millisecond timestamp of midnight after `date`, saturating at the far end
/// of the calendar.
pub(crate) fn day_end_exclusive_ms(date: NaiveDate) -> i64 {
    date.succ_opt().map(day_start_ms).unwrap_or(i64::MAX)
}

pub(crate) fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_bounds_cover_exactly_one_day() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let start = day_start_ms(date);
        let end = day_end_exclusive_ms(date);
        assert_eq!(end - start, 24 * 60 * 60 * 1000);
    }

    #[test]
    fn numeric_dtype_check() {
        assert!(is_numeric_dtype(&DataType::Int32));
        assert!(is_numeric_dtype(&DataType::Float64));
        assert!(!is_numeric_dtype(&DataType::String));
        assert!(!is_numeric_dtype(&DataType::Boolean));
    }
}
