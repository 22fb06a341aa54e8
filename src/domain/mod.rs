// Domain layer: timeline/submission models, run settings and ports.

pub mod model;
pub mod ports;
pub mod settings;
