// Domain layer: scoring model, static tables and ports (interfaces).
// The scorer itself performs no I/O.

pub mod model;
pub mod payload;
pub mod ports;
pub mod schedule;
pub mod scorer;
pub mod tables;
