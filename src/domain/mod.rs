// Domain layer: layer definitions, command data and the ports the engine depends on.

pub mod model;
pub mod ports;
