pub mod fund_diff;
pub mod units;
