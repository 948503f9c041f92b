//! Request and response data transfer objects

pub mod ledger;
pub mod occupancy;
