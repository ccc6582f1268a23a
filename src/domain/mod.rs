//! Domain layer: value objects, charge/outcome types and the ports the
//! authorization core talks to.

pub mod account;
pub mod id;
pub mod ports;
pub mod transaction;
