use crate::{
    components::{ScaleRule, VisParams},
    errors::Result,
};

use super::Sensor;

/// Landsat 9 OLI/TIRS Collection 2 Tier 1 Level 2.
///
/// Surface reflectance (`SR_B1`..`SR_B7`) is stored as scaled integers with
/// reflectance = DN * 0.0000275 - 0.2, surface temperature (`ST_B10`) as
/// kelvin = DN * 0.00341802 + 149.0.
#[derive(Debug)]
pub struct Landsat9L2;

impl Landsat9L2 {
    pub const OPTICAL_SELECTOR: &'static str = "SR_B.";
    pub const THERMAL_SELECTOR: &'static str = "ST_B.*";
    pub const QA_BANDS: [&'static str; 2] = ["QA_PIXEL", "QA_RADSAT"];
}

impl Sensor for Landsat9L2 {
    const COLLECTION_ID: &'static str = "LANDSAT/LC09/C02/T1_L2";
    const LAYER_NAME: &'static str = "True Color (432)";

    fn scale_rules() -> Result<Vec<ScaleRule>> {
        Ok(vec![
            ScaleRule::new(Self::OPTICAL_SELECTOR, 0.0000275, -0.2)?,
            ScaleRule::new(Self::THERMAL_SELECTOR, 0.00341802, 149.0)?,
        ])
    }

    fn visualization() -> VisParams {
        VisParams::rgb(["SR_B4", "SR_B3", "SR_B2"], 0.0, 0.3)
    }

    fn center() -> (f64, f64, u8) {
        (-114.2579, 38.9275, 8)
    }
}
