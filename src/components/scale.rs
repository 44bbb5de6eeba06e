use log::debug;

use crate::{
    components::{image::Image, selector::BandSelector},
    errors::Result,
};

/// Any per-image transform the collection mapper can run.
pub trait ImageTransform: Send + Sync {
    fn apply(&self, image: &Image) -> Result<Image>;
}

impl<F> ImageTransform for F
where
    F: Fn(&Image) -> Result<Image> + Send + Sync,
{
    fn apply(&self, image: &Image) -> Result<Image> {
        self(image)
    }
}

/// `sample * multiplier + offset` for bands picked by `selector`.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct ScaleRule {
    pub selector: BandSelector,
    pub multiplier: f64,
    pub offset: f64,
}

impl ScaleRule {
    pub fn new(selector: &str, multiplier: f64, offset: f64) -> Result<Self> {
        Ok(Self {
            selector: BandSelector::new(selector)?,
            multiplier,
            offset,
        })
    }
}

/// Scales `image` by every rule in `rules`.
///
/// Every rule selects from `image` itself, results are merged in rule order
/// with overwrite so a later rule wins on overlapping bands. A rule that
/// matches no band fails the whole image.
pub fn apply(image: &Image, rules: &[ScaleRule]) -> Result<Image> {
    rules.iter().try_fold(image.clone(), |scaled, rule| {
        let selected = image.select_bands(&rule.selector)?;
        debug!(
            "scaling {} bands of {} by {} + {}",
            selected.len(),
            image.id(),
            rule.multiplier,
            rule.offset
        );
        let transformed = selected.map_bands(|band| band.scaled(rule.multiplier, rule.offset));
        scaled.merge_bands(transformed, true)
    })
}

/// Ordered list of [ScaleRule]s applied as one transform.
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(transparent)]
pub struct BandScaler {
    rules: Vec<ScaleRule>,
}

impl From<Vec<ScaleRule>> for BandScaler {
    fn from(rules: Vec<ScaleRule>) -> Self {
        Self { rules }
    }
}

impl BandScaler {
    pub fn new(rules: Vec<ScaleRule>) -> Self {
        Self { rules }
    }

    pub fn with_rule(mut self, rule: ScaleRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn rules(&self) -> &[ScaleRule] {
        &self.rules
    }
}

impl ImageTransform for BandScaler {
    fn apply(&self, image: &Image) -> Result<Image> {
        apply(image, &self.rules)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{components::band::Band, errors::BandscaleError};
    use approx::assert_relative_eq;
    use rstest::{fixture, rstest};

    #[fixture]
    fn scaler() -> BandScaler {
        BandScaler::default()
            .with_rule(ScaleRule::new("SR_B.", 0.0000275, -0.2).unwrap())
            .with_rule(ScaleRule::new("ST_B.*", 0.00341802, 149.0).unwrap())
    }

    #[fixture]
    fn image() -> Image {
        Image::new("LC09_038029_20220110")
            .with_band("SR_B2", Band::filled((3, 4), 8000.))
            .and_then(|image| image.with_band("SR_B4", Band::filled((3, 4), 10000.)))
            .and_then(|image| image.with_band("ST_B10", Band::filled((3, 4), 50000.)))
            .and_then(|image| image.with_band("QA_PIXEL", Band::filled((3, 4), 21824.)))
            .unwrap()
    }

    #[rstest]
    #[case("SR_B4", 0.075)]
    #[case("SR_B2", 8000. * 0.0000275 - 0.2)]
    #[case("ST_B10", 319.901)]
    fn scales_matched_bands(scaler: BandScaler, image: Image, #[case] band: &str, #[case] expected: f64) {
        let scaled = scaler.apply(&image).unwrap();
        scaled
            .band(band)
            .unwrap()
            .iter()
            .for_each(|value| assert_relative_eq!(*value, expected, max_relative = 1e-12));
    }

    #[rstest]
    fn passes_through_unmatched_bands(scaler: BandScaler, image: Image) {
        let scaled = scaler.apply(&image).unwrap();
        let original = image.band("QA_PIXEL").unwrap();
        let passed = scaled.band("QA_PIXEL").unwrap();
        assert!(original
            .iter()
            .zip(passed.iter())
            .all(|(lhs, rhs)| lhs.to_bits() == rhs.to_bits()));
    }

    #[rstest]
    fn preserves_band_names(scaler: BandScaler, image: Image) {
        let scaled = scaler.apply(&image).unwrap();
        assert!(scaled.band_names().eq(image.band_names()));
        assert_eq!(scaled.id(), image.id());
    }

    #[rstest]
    fn leaves_input_untouched(scaler: BandScaler, image: Image) {
        let before = image.clone();
        scaler.apply(&image).unwrap();
        assert_eq!(image, before);
    }

    #[rstest]
    fn empty_selection_fails(image: Image) {
        let scaler = BandScaler::default().with_rule(ScaleRule::new("SR_B1[0-9]", 2., 0.).unwrap());
        assert!(matches!(
            scaler.apply(&image),
            Err(BandscaleError::Selection { .. })
        ));
    }

    #[rstest]
    fn later_rule_wins_on_overlap(image: Image) {
        let rules = [
            ScaleRule::new("SR_B.", 2., 0.).unwrap(),
            ScaleRule::new("SR_B4", 1., 1.).unwrap(),
        ];
        let scaled = apply(&image, &rules).unwrap();
        assert_eq!(scaled.band("SR_B4").unwrap()[[0, 0]], 10001.);
        assert_eq!(scaled.band("SR_B2").unwrap()[[0, 0]], 16000.);
    }

    #[rstest]
    fn no_rules_is_identity(image: Image) {
        assert_eq!(apply(&image, &[]).unwrap(), image);
    }

    #[rstest]
    fn deserializes_rules() {
        let scaler: BandScaler = serde_json::from_str(
            r#"[{"selector": "SR_B.", "multiplier": 0.0000275, "offset": -0.2}]"#,
        )
        .unwrap();
        assert_eq!(scaler.rules()[0].selector.as_str(), "SR_B.");
        assert_eq!(scaler.rules()[0].offset, -0.2);
    }
}
