//! Rescale band groups of dated raster collections and draw them as map layers.
//!
//! ```
//! use bandscale::{Band, BandScaler, Image, ImageTransform, ScaleRule};
//!
//! let image = Image::new("LC09_038033_20220109")
//!     .with_band("SR_B4", Band::filled((2, 2), 10000.))?
//!     .with_band("ST_B10", Band::filled((2, 2), 50000.))?;
//! let scaler = BandScaler::default()
//!     .with_rule(ScaleRule::new("SR_B.", 0.0000275, -0.2)?)
//!     .with_rule(ScaleRule::new("ST_B.*", 0.00341802, 149.0)?);
//! let scaled = scaler.apply(&image)?;
//! assert!((scaled.band("SR_B4")?[[0, 0]] - 0.075).abs() < 1e-12);
//! # Ok::<(), bandscale::BandscaleError>(())
//! ```

mod components;
mod errors;
mod pipeline;
pub mod sensors;

pub use components::{
    scale::apply, Band, BandScaler, BandSelector, Collection, DatedImage, DisplayContext,
    Image, ImageFailure, ImageSource, ImageTransform, Layer, LayerStack, MapDisplay, Mapped,
    MemorySource, Metadata, Reducer, Reduction, ScaleRule, VisParams,
};
pub use errors::{BandscaleError, Result};
pub use pipeline::{MapView, Pipeline, PipelineConfig, PipelineOutput};
