mod helpers;
mod points;

pub mod op;
mod secret;

pub use helpers::{env_or_default, parse_boolean_flag};
pub use points::{Points, PointsConversionError, POINTS_SCALE};
pub use secret::Secret;
