mod vis;

pub use vis::VisParams;

use geo::Point;
use log::info;
use ndarray::Array3;
use std::fmt::Debug;

use crate::{
    components::collection::Collection,
    errors::{BandscaleError, Result},
};

const MAX_ZOOM: u8 = 24;

/// Rendered layer of a [DisplayContext].
#[derive(Clone, PartialEq)]
pub struct Layer {
    pub name: String,
    pub vis: VisParams,
    pub image_count: usize,
    /// RGBA preview `(rows, cols, 4)` of the mosaicked collection.
    pub preview: Array3<u8>,
}

impl Debug for Layer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let f = &mut f.debug_struct("Layer");
        f.field("name", &self.name)
            .field("bands", &self.vis.bands)
            .field("image_count", &self.image_count)
            .field("preview_shape", &self.preview.dim())
            .finish()
    }
}

/// State of a map display.
///
/// Values are never mutated in place, every change returns a new context
/// which the caller threads into the next call.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayContext {
    center: Point,
    zoom: u8,
    layers: Vec<Layer>,
}

impl Default for DisplayContext {
    fn default() -> Self {
        Self {
            center: Point::new(0., 0.),
            zoom: 1,
            layers: Vec::new(),
        }
    }
}

impl DisplayContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_center(&self, lon: f64, lat: f64, zoom: u8) -> Result<Self> {
        if !(-180. ..=180.).contains(&lon) || !(-90. ..=90.).contains(&lat) {
            return Err(BandscaleError::InvalidVisualization(format!(
                "center ({lon}, {lat}) is not a lon/lat position"
            )));
        }
        if zoom > MAX_ZOOM {
            return Err(BandscaleError::InvalidVisualization(format!(
                "zoom {zoom} above {MAX_ZOOM}"
            )));
        }
        Ok(Self {
            center: Point::new(lon, lat),
            zoom,
            layers: self.layers.clone(),
        })
    }

    pub fn with_layer(&self, layer: Layer) -> Self {
        let mut layers = self.layers.clone();
        layers.push(layer);
        Self {
            layers,
            ..self.clone()
        }
    }

    pub fn center(&self) -> Point {
        self.center
    }

    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layer(&self, name: &str) -> Option<&Layer> {
        self.layers.iter().find(|layer| layer.name == name)
    }
}

/// Map widget drawing collections as layers.
pub trait MapDisplay: Debug {
    /// Draws `collection` as `layer_name` on top of `context`.
    fn render(
        &self,
        context: &DisplayContext,
        collection: &Collection,
        vis: &VisParams,
        layer_name: &str,
    ) -> Result<DisplayContext>;
}

/// [MapDisplay] that keeps a stretched preview of each layer.
#[derive(Debug, Default, Clone, Copy)]
pub struct LayerStack;

impl MapDisplay for LayerStack {
    fn render(
        &self,
        context: &DisplayContext,
        collection: &Collection,
        vis: &VisParams,
        layer_name: &str,
    ) -> Result<DisplayContext> {
        vis.validate()?;
        let mosaic = collection.project(&vis.bands)?.mosaic()?;
        let preview = vis.stretch(&mosaic.image)?;
        info!(
            "layer `{layer_name}`: {} images of {} as {:?}",
            collection.len(),
            collection.id(),
            preview.dim()
        );
        Ok(context.with_layer(Layer {
            name: layer_name.to_string(),
            vis: vis.clone(),
            image_count: collection.len(),
            preview,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{band::Band, image::Image};
    use chrono::NaiveDate;
    use ndarray::s;
    use rstest::{fixture, rstest};

    fn scene(value: f64) -> Image {
        ["SR_B4", "SR_B3", "SR_B2"]
            .into_iter()
            .try_fold(Image::new("scene"), |image, name| {
                image.with_band(name, Band::filled((4, 4), value))
            })
            .unwrap()
    }

    #[fixture]
    fn collection() -> Collection {
        let date = NaiveDate::from_ymd_opt(2022, 1, 10).unwrap();
        Collection::new("LANDSAT/LC09/C02/T1_L2")
            .with_image(date, scene(0.))
            .with_image(date, scene(0.3))
    }

    #[rstest]
    fn render_threads_context(collection: Collection) {
        let vis = VisParams::rgb(["SR_B4", "SR_B3", "SR_B2"], 0., 0.3);
        let context = DisplayContext::new()
            .set_center(-114.2579, 38.9275, 8)
            .unwrap();
        let rendered = LayerStack
            .render(&context, &collection, &vis, "True Color (432)")
            .unwrap();

        assert!(context.layers().is_empty());
        assert_eq!(rendered.layers().len(), 1);
        assert_eq!(rendered.center(), context.center());
        assert_eq!(rendered.zoom(), 8);

        let layer = rendered.layer("True Color (432)").unwrap();
        assert_eq!(layer.image_count, 2);
        assert_eq!(layer.preview.dim(), (4, 4, 4));
        assert!(layer.preview.slice(s![.., .., 0]).iter().all(|value| *value == 255));
    }

    #[rstest]
    fn render_requires_bands_on_every_image(collection: Collection) {
        let vis = VisParams::rgb(["SR_B5", "SR_B3", "SR_B2"], 0., 0.3);
        assert!(matches!(
            LayerStack.render(&DisplayContext::new(), &collection, &vis, "false colour"),
            Err(BandscaleError::MissingBand(_))
        ));
    }

    #[rstest]
    fn render_ignores_bands_it_does_not_draw(collection: Collection) {
        let date = NaiveDate::from_ymd_opt(2022, 1, 26).unwrap();
        let collection = Collection::new("LANDSAT/LC09/C02/T1_L2")
            .with_image(date, scene(0.15).with_band("ST_B10", Band::filled((4, 4), 300.)).unwrap())
            .with_image(date, collection.first().unwrap().image.clone());
        let vis = VisParams::rgb(["SR_B4", "SR_B3", "SR_B2"], 0., 0.3);
        let rendered = LayerStack
            .render(&DisplayContext::new(), &collection, &vis, "True Color (432)")
            .unwrap();
        let layer = rendered.layer("True Color (432)").unwrap();
        assert_eq!(layer.preview.slice(s![0, 0, ..]).to_vec(), [0, 0, 0, 255]);
    }

    #[rstest]
    fn render_empty_collection_fails() {
        let vis = VisParams::rgb(["SR_B4", "SR_B3", "SR_B2"], 0., 0.3);
        assert!(LayerStack
            .render(&DisplayContext::new(), &Collection::new("empty"), &vis, "empty")
            .is_err());
    }

    #[rstest]
    #[case(-181., 0., 3)]
    #[case(0., 91., 3)]
    #[case(0., 0., 25)]
    fn set_center_validates(#[case] lon: f64, #[case] lat: f64, #[case] zoom: u8) {
        assert!(DisplayContext::new().set_center(lon, lat, zoom).is_err());
    }

    #[rstest]
    fn layers_stack_in_order(collection: Collection) {
        let vis = VisParams::rgb(["SR_B4", "SR_B3", "SR_B2"], 0., 0.3);
        let context = ["first", "second"]
            .into_iter()
            .try_fold(DisplayContext::new(), |context, name| {
                LayerStack.render(&context, &collection, &vis, name)
            })
            .unwrap();
        assert_eq!(
            context.layers().iter().map(|layer| layer.name.as_str()).collect::<Vec<_>>(),
            ["first", "second"]
        );
    }
}
