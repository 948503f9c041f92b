//! Assertion Helpers
//!
//! Small helpers that keep error-path assertions readable and report the
//! unexpected value on failure.

use std::fmt::Debug;

use core_kernel::Money;
use domain_ledger::LedgerError;
use domain_occupancy::OccupancyError;
use rust_decimal::Decimal;

#[track_caller]
pub fn assert_conflict<T: Debug>(result: Result<T, LedgerError>) {
    assert!(
        matches!(result, Err(LedgerError::Conflict(_))),
        "expected Conflict, got {result:?}"
    );
}

#[track_caller]
pub fn assert_not_found<T: Debug>(result: Result<T, LedgerError>) {
    assert!(
        matches!(result, Err(LedgerError::NotFound(_))),
        "expected NotFound, got {result:?}"
    );
}

#[track_caller]
pub fn assert_validation<T: Debug>(result: Result<T, LedgerError>) {
    assert!(
        matches!(result, Err(LedgerError::Validation(_))),
        "expected Validation, got {result:?}"
    );
}

#[track_caller]
pub fn assert_occupancy_conflict<T: Debug>(result: Result<T, OccupancyError>) {
    assert!(
        matches!(result, Err(OccupancyError::Conflict(_))),
        "expected Conflict, got {result:?}"
    );
}

#[track_caller]
pub fn assert_occupancy_not_found<T: Debug>(result: Result<T, OccupancyError>) {
    assert!(
        matches!(result, Err(OccupancyError::NotFound(_))),
        "expected NotFound, got {result:?}"
    );
}

/// Asserts a money value has the expected amount, ignoring scale
#[track_caller]
pub fn assert_amount(money: Money, expected: Decimal) {
    assert_eq!(
        money.amount(),
        expected.round_dp(2),
        "expected {expected}, got {money}"
    );
}
