// Domain layer: seating models and ports (interfaces).

pub mod model;
pub mod ports;
