use chrono::NaiveDate;
use log::{info, warn};
use std::path::Path;

use crate::{
    components::{
        BandScaler, Collection, DisplayContext, ImageFailure, ImageSource, MapDisplay, Reduction,
        ScaleRule, VisParams,
    },
    errors::{BandscaleError, Result},
    sensors::Sensor,
};

/// Map position a run centres on before drawing.
#[derive(Debug, Clone, Copy, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct MapView {
    pub lon: f64,
    pub lat: f64,
    pub zoom: u8,
}

/// One "fetch, scale, draw" run.
///
/// ```json
/// {
///   "collection": "LANDSAT/LC09/C02/T1_L2",
///   "start": "2022-01-01",
///   "end": "2022-02-01",
///   "rules": [{"selector": "SR_B.", "multiplier": 0.0000275, "offset": -0.2}],
///   "visualization": {"bands": ["SR_B4", "SR_B3", "SR_B2"], "min": 0.0, "max": 0.3},
///   "reduction": {"reducer": "mosaic"},
///   "layer": "True Color (432)",
///   "center": {"lon": -114.2579, "lat": 38.9275, "zoom": 8}
/// }
/// ```
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct PipelineConfig {
    pub collection: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    #[serde(default)]
    pub rules: Vec<ScaleRule>,
    pub visualization: VisParams,
    /// Composite of the scaled images drawn as the layer, the plain mosaic
    /// when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reduction: Option<Reduction>,
    pub layer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub center: Option<MapView>,
}

impl PipelineConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    /// Default run of a known collection over `[start, end)`.
    pub fn for_sensor<S: Sensor>(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        let (lon, lat, zoom) = S::center();
        let config = Self {
            collection: S::COLLECTION_ID.to_string(),
            start,
            end,
            rules: S::scale_rules()?,
            visualization: S::visualization(),
            reduction: S::reduction(),
            layer: S::LAYER_NAME.to_string(),
            center: Some(MapView { lon, lat, zoom }),
        };
        config.validate()?;
        Ok(config)
    }

    /// Default run of a known collection over the single day `day`.
    pub fn for_sensor_on<S: Sensor>(day: NaiveDate) -> Result<Self> {
        let next = day.succ_opt().ok_or(BandscaleError::InvalidDateRange {
            start: day,
            end: day,
        })?;
        Self::for_sensor::<S>(day, next)
    }

    pub fn validate(&self) -> Result<()> {
        if self.start >= self.end {
            return Err(BandscaleError::InvalidDateRange {
                start: self.start,
                end: self.end,
            });
        }
        self.visualization.validate()
    }
}

/// Result of [Pipeline::run].
#[derive(Debug)]
pub struct PipelineOutput {
    /// Context with the new layer, without it when nothing could be drawn.
    pub context: DisplayContext,
    /// Number of scaled images drawn into the layer.
    pub rendered: usize,
    /// Images the scaler rejected, left out of the layer.
    pub failures: Vec<ImageFailure>,
}

#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
    scaler: BandScaler,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        let scaler = BandScaler::new(config.rules.clone());
        Self { config, scaler }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn run(
        &self,
        source: &impl ImageSource,
        display: &impl MapDisplay,
        context: &DisplayContext,
    ) -> Result<PipelineOutput> {
        let PipelineConfig {
            collection,
            start,
            end,
            visualization,
            reduction,
            layer,
            center,
            ..
        } = &self.config;
        let fetched = source.fetch_collection(collection, *start, *end)?;
        info!("scaling {fetched:?}");

        let (scaled, failures) = fetched.map(&self.scaler).partition();
        for ImageFailure { index, date, error } in &failures {
            warn!("dropping image {index} ({date}) of {collection}: {error}");
        }

        let context = match center {
            Some(MapView { lon, lat, zoom }) => context.set_center(*lon, *lat, *zoom)?,
            None => context.clone(),
        };
        let rendered = scaled.len();
        if scaled.is_empty() {
            warn!("no image of {collection} left to draw as `{layer}`");
            return Ok(PipelineOutput {
                context,
                rendered,
                failures,
            });
        }

        let drawn = match reduction {
            Some(reduction) => Collection::from_images(
                scaled.id().to_string(),
                vec![reduction.reduce(&scaled, &visualization.bands)?],
            ),
            None => scaled,
        };
        let context = display.render(&context, &drawn, visualization, layer)?;
        Ok(PipelineOutput {
            context,
            rendered,
            failures,
        })
    }
}
