use crate::{
    components::{Collection, Image, Reducer, Reduction, ScaleRule, VisParams},
    errors::Result,
};

use super::Sensor;

/// GPM IMERG V07 half-hourly precipitation (mm/hr), stored as floats.
#[derive(Debug)]
pub struct GpmImerg;

impl GpmImerg {
    pub const PRECIPITATION: &'static str = "precipitation";
    /// Rates at or below this are masked out of the composite.
    pub const RAIN_THRESHOLD: f64 = 0.5;
    pub const PALETTE: [&'static str; 10] = [
        "000096", "0064ff", "00b4ff", "33db80", "9beb4a", "ffeb00", "ffb300", "ff6400", "eb1e00",
        "af0000",
    ];
    /// Grey drawn where no rain is shown.
    pub const BACKGROUND: &'static str = "808080";

    /// Maximum precipitation rate over `collection`, masked where it does not
    /// exceed [Self::RAIN_THRESHOLD].
    pub fn max_precipitation(collection: &Collection) -> Result<Image> {
        Reduction::new(Reducer::Max)
            .with_threshold(Self::RAIN_THRESHOLD)
            .reduce(collection, &[Self::PRECIPITATION.to_string()])
            .map(|composite| composite.image)
    }
}

impl Sensor for GpmImerg {
    const COLLECTION_ID: &'static str = "NASA/GPM_L3/IMERG_V07";
    const LAYER_NAME: &'static str = "Precipitation (mm/hr)";

    fn scale_rules() -> Result<Vec<ScaleRule>> {
        Ok(Vec::new())
    }

    fn visualization() -> VisParams {
        VisParams::single(Self::PRECIPITATION, 0.0, 1.5, Some(&Self::PALETTE[..]))
            .with_background(Self::BACKGROUND)
    }

    fn reduction() -> Option<Reduction> {
        Some(Reduction::new(Reducer::Max).with_threshold(Self::RAIN_THRESHOLD))
    }

    fn center() -> (f64, f64, u8) {
        (-76., 33., 3)
    }
}
