//! Request handlers

pub mod billing;
pub mod health;
pub mod invoice;
pub mod payment;
pub mod resident;
pub mod room;
