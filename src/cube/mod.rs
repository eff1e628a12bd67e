pub mod units;
pub mod volume;
