pub mod date;

pub use date::{parse_date, week_dates, week_start};
