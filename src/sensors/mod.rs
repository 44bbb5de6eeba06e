use std::fmt::Debug;

mod gpm;
mod landsat;
pub use gpm::GpmImerg;
pub use landsat::Landsat9L2;

use crate::{
    components::{Reduction, ScaleRule, VisParams},
    errors::Result,
};

/// Known collection with its scaling and default rendering.
pub trait Sensor: Debug {
    const COLLECTION_ID: &'static str;
    const LAYER_NAME: &'static str;

    /// Rules turning stored digital numbers into physical units.
    fn scale_rules() -> Result<Vec<ScaleRule>>;

    fn visualization() -> VisParams;

    /// Composite drawn instead of the plain mosaic, if any.
    fn reduction() -> Option<Reduction> {
        None
    }

    /// Default map view `(lon, lat, zoom)`.
    fn center() -> (f64, f64, u8);
}
