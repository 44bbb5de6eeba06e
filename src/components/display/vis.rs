use ndarray::{aview1, Array3, Axis, Zip};

use crate::{
    components::{band::Band, image::Image},
    errors::{BandscaleError, Result},
};

type Rgb = [u8; 3];

const OPAQUE: u8 = 255;

/// How bands of an image are drawn.
///
/// Either three bands as an RGB composite, or one band drawn in grey or
/// through a colour `palette` (hex strings such as `"0064ff"`). Masked and
/// NaN pixels are transparent unless a `background` colour is set.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct VisParams {
    pub bands: Vec<String>,
    pub min: f64,
    pub max: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub palette: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
}

fn parse_hex(color: &str) -> Result<Rgb> {
    let hex = color.trim_start_matches('#');
    let invalid = || BandscaleError::InvalidVisualization(format!("bad colour `{color}`"));
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid());
    }
    let mut rgb = [0u8; 3];
    for (channel, idx) in rgb.iter_mut().zip((0..6).step_by(2)) {
        *channel = u8::from_str_radix(&hex[idx..idx + 2], 16).map_err(|_| invalid())?;
    }
    Ok(rgb)
}

fn to_u8(position: f64) -> u8 {
    (position * 255.).round() as u8
}

impl VisParams {
    pub fn rgb(bands: [&str; 3], min: f64, max: f64) -> Self {
        Self {
            bands: bands.map(String::from).to_vec(),
            min,
            max,
            palette: None,
            background: None,
        }
    }

    pub fn single(band: &str, min: f64, max: f64, palette: Option<&[&str]>) -> Self {
        Self {
            bands: vec![band.to_string()],
            min,
            max,
            palette: palette.map(|colors| colors.iter().map(|color| color.to_string()).collect()),
            background: None,
        }
    }

    /// Opaque colour drawn under masked and NaN pixels.
    pub fn with_background(self, color: &str) -> Self {
        Self {
            background: Some(color.to_string()),
            ..self
        }
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| Err(BandscaleError::InvalidVisualization(reason));
        if !(self.min.is_finite() && self.max.is_finite() && self.min < self.max) {
            return invalid(format!("range {}..{} is empty", self.min, self.max));
        }
        self.background()?;
        match (self.bands.len(), &self.palette) {
            (3, Some(_)) => invalid("palette needs a single band".into()),
            (1, Some(palette)) if palette.is_empty() => invalid("palette is empty".into()),
            (1 | 3, _) => self.colors().map(|_| ()),
            (n, _) => invalid(format!("expected 1 or 3 bands, got {n}")),
        }
    }

    fn colors(&self) -> Result<Vec<Rgb>> {
        self.palette
            .iter()
            .flatten()
            .map(|color| parse_hex(color))
            .collect()
    }

    fn background(&self) -> Result<Option<Rgb>> {
        self.background.as_deref().map(parse_hex).transpose()
    }

    /// Position of `sample` in `[min, max]`, clamped to `[0, 1]`.
    fn normalize(&self, sample: f64) -> Option<f64> {
        (!sample.is_nan()).then(|| ((sample - self.min) / (self.max - self.min)).clamp(0., 1.))
    }

    /// Colour of one pixel from the normalized samples of its bands.
    fn color(positions: &[f64], stops: &[Rgb]) -> Rgb {
        match stops {
            [] if positions.len() == 3 => [0, 1, 2].map(|channel| to_u8(positions[channel])),
            [] => [to_u8(positions[0]); 3],
            [color] => *color,
            stops => {
                let scaled = positions[0] * (stops.len() - 1) as f64;
                let lower = (scaled.floor() as usize).min(stops.len() - 2);
                let fraction = scaled - lower as f64;
                [0, 1, 2].map(|channel| {
                    let (from, to) = (stops[lower][channel] as f64, stops[lower + 1][channel] as f64);
                    (from + (to - from) * fraction).round() as u8
                })
            }
        }
    }

    /// Linear stretch of the visualized bands to 8-bit RGBA, shape `(rows, cols, 4)`.
    ///
    /// Masked pixels, and pixels NaN in any drawn band, get the background
    /// colour or alpha 0.
    pub fn stretch(&self, image: &Image) -> Result<Array3<u8>> {
        self.validate()?;
        let bands = self
            .bands
            .iter()
            .map(|name| image.band(name))
            .collect::<Result<Vec<&Band>>>()?;
        let (rows, cols) = bands[0].dim();
        let valid = image.mask();
        let stops = self.colors()?;
        let hidden = self.background()?.map_or([0; 4], |[r, g, b]| [r, g, b, OPAQUE]);

        let pixel = |row: usize, col: usize| -> Option<Rgb> {
            if valid.is_some_and(|mask| !mask[[row, col]]) {
                return None;
            }
            let mut positions = [0.; 3];
            for (position, band) in positions.iter_mut().zip(&bands) {
                *position = self.normalize(band[[row, col]])?;
            }
            Some(Self::color(&positions[..bands.len()], &stops))
        };

        let mut rgba = Array3::<u8>::zeros((rows, cols, 4));
        Zip::indexed(rgba.lanes_mut(Axis(2))).for_each(|(row, col), mut lane| {
            let value = match pixel(row, col) {
                Some([r, g, b]) => [r, g, b, OPAQUE],
                None => hidden,
            };
            lane.assign(&aview1(&value));
        });
        Ok(rgba)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rstest::rstest;

    fn image(samples: ndarray::Array2<f64>) -> Image {
        ["SR_B4", "SR_B3", "SR_B2"]
            .into_iter()
            .enumerate()
            .try_fold(Image::new("scaled"), |image, (idx, name)| {
                image.with_band(name, Band::from(&samples * (idx + 1) as f64))
            })
            .unwrap()
    }

    #[rstest]
    fn stretches_and_clamps() {
        let vis = VisParams::rgb(["SR_B4", "SR_B3", "SR_B2"], 0., 0.3);
        let rgb = vis.stretch(&image(array![[0., 0.05], [-1., f64::NAN]])).unwrap();
        assert_eq!(rgb.dim(), (2, 2, 4));
        assert_eq!(rgb.slice(ndarray::s![0, 0, ..]).to_vec(), [0, 0, 0, 255]);
        assert_eq!(rgb.slice(ndarray::s![0, 1, ..]).to_vec(), [43, 85, 128, 255]);
        assert_eq!(rgb.slice(ndarray::s![1, 0, ..]).to_vec(), [0, 0, 0, 255]);
        assert_eq!(rgb.slice(ndarray::s![1, 1, ..]).to_vec(), [0, 0, 0, 0]);

        let saturated = vis.stretch(&image(array![[0.3, 10.]])).unwrap();
        assert!(saturated.iter().all(|value| *value == 255));
    }

    #[rstest]
    fn palette_interpolates() {
        let vis = VisParams::single("precipitation", 0., 1., Some(&["000000", "#ff0000", "ffffff"][..]));
        let image = Image::new("p")
            .with_band("precipitation", Band::from(array![[0., 0.25, 0.5, 1.]]))
            .unwrap();
        let rgb = vis.stretch(&image).unwrap();
        assert_eq!(rgb.slice(ndarray::s![0, 0, ..]).to_vec(), [0, 0, 0, 255]);
        assert_eq!(rgb.slice(ndarray::s![0, 1, ..]).to_vec(), [128, 0, 0, 255]);
        assert_eq!(rgb.slice(ndarray::s![0, 2, ..]).to_vec(), [255, 0, 0, 255]);
        assert_eq!(rgb.slice(ndarray::s![0, 3, ..]).to_vec(), [255, 255, 255, 255]);
    }

    #[rstest]
    fn masked_pixels_are_transparent() {
        let image = Image::new("p")
            .with_band("precipitation", Band::from(array![[0., 5.]]))
            .unwrap()
            .update_mask(&Band::from(array![[1., 0.]]))
            .unwrap();
        let vis = VisParams::single("precipitation", 0., 1., None);
        let rgb = vis.stretch(&image).unwrap();
        assert_eq!(rgb.slice(ndarray::s![0, 0, ..]).to_vec(), [0, 0, 0, 255]);
        assert_eq!(rgb.slice(ndarray::s![0, 1, ..]).to_vec(), [0, 0, 0, 0]);

        let rgb = vis.with_background("808080").stretch(&image).unwrap();
        assert_eq!(rgb.slice(ndarray::s![0, 0, ..]).to_vec(), [0, 0, 0, 255]);
        assert_eq!(rgb.slice(ndarray::s![0, 1, ..]).to_vec(), [128, 128, 128, 255]);
    }

    #[rstest]
    #[case(VisParams::rgb(["a", "b", "c"], 0.3, 0.3))]
    #[case(VisParams::rgb(["a", "b", "c"], 0., f64::NAN))]
    #[case(VisParams { bands: vec!["a".into(), "b".into()], ..VisParams::single("a", 0., 1., None) })]
    #[case(VisParams { palette: Some(vec!["ffffff".into()]), ..VisParams::rgb(["a", "b", "c"], 0., 1.) })]
    #[case(VisParams::single("a", 0., 1., Some(&[] as &[&str])))]
    #[case(VisParams::single("a", 0., 1., Some(&["fffff"][..])))]
    #[case(VisParams::single("a", 0., 1., Some(&["gg0000"][..])))]
    #[case(VisParams::single("a", 0., 1., Some(&["+f+f+f"][..])))]
    #[case(VisParams::single("a", 0., 1., None).with_background("80808"))]
    fn rejects_invalid(#[case] vis: VisParams) {
        assert!(matches!(
            vis.validate(),
            Err(BandscaleError::InvalidVisualization(_))
        ));
    }

    #[rstest]
    fn missing_band_fails() {
        let vis = VisParams::rgb(["SR_B5", "SR_B3", "SR_B2"], 0., 0.3);
        assert!(matches!(
            vis.stretch(&image(array![[0.]])),
            Err(BandscaleError::MissingBand(name)) if name == "SR_B5"
        ));
    }

    #[rstest]
    fn deserializes_from_script_dict() {
        let vis: VisParams =
            serde_json::from_str(r#"{"bands": ["SR_B4", "SR_B3", "SR_B2"], "min": 0.0, "max": 0.3}"#)
                .unwrap();
        assert_eq!(vis, VisParams::rgb(["SR_B4", "SR_B3", "SR_B2"], 0., 0.3));
    }
}
