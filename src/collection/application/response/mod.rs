pub mod cycle_report;
pub mod fetch_result;
