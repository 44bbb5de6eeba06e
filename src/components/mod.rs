pub mod band;
pub mod collection;
pub mod display;
pub mod image;
pub mod scale;
pub mod selector;
pub mod source;

pub use band::Band;
pub use collection::{Collection, DatedImage, ImageFailure, Mapped, Reducer, Reduction};
pub use display::{DisplayContext, Layer, LayerStack, MapDisplay, VisParams};
pub use image::Image;
pub use scale::{BandScaler, ImageTransform, ScaleRule};
pub use selector::BandSelector;
pub use source::{memory_source::MemorySource, ImageSource};

use std::collections::HashMap;
pub type Metadata = HashMap<String, String>;
