use chrono::NaiveDate;
use itertools::Itertools;
use log::{debug, info};
use ndarray::{Array2, Zip};
use rayon::prelude::*;
use std::fmt::Debug;

use crate::{
    components::{band::Band, image::Image, scale::ImageTransform, selector::BandSelector},
    errors::{BandscaleError, Result},
};

/// [Image] tagged with its acquisition date.
#[derive(Debug, Clone, PartialEq)]
pub struct DatedImage {
    pub date: NaiveDate,
    pub image: Image,
}

/// Ordered sequence of [DatedImage]s.
#[derive(Clone, PartialEq, Default)]
pub struct Collection {
    id: String,
    images: Vec<DatedImage>,
}

impl Debug for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let f = &mut f.debug_struct("Collection");
        f.field("id", &self.id)
            .field("len", &self.images.len())
            .field("dates", &self.dates().map(|date| date.to_string()).join(", "))
            .finish()
    }
}

impl Collection {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            images: Vec::new(),
        }
    }

    pub fn from_images(id: impl Into<String>, images: Vec<DatedImage>) -> Self {
        Self {
            id: id.into(),
            images,
        }
    }

    pub fn with_image(mut self, date: NaiveDate, image: Image) -> Self {
        self.images.push(DatedImage { date, image });
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn first(&self) -> Option<&DatedImage> {
        self.images.first()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DatedImage> {
        self.images.iter()
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.images.iter().map(|dated| dated.date)
    }

    /// Images acquired in `[start, end)`, order kept.
    pub fn filter_date(&self, start: NaiveDate, end: NaiveDate) -> Collection {
        let images: Vec<DatedImage> = self
            .images
            .iter()
            .filter(|dated| start <= dated.date && dated.date < end)
            .cloned()
            .collect();
        debug!(
            "{}: {} of {} images in {start}..{end}",
            self.id,
            images.len(),
            self.images.len()
        );
        Collection::from_images(self.id.clone(), images)
    }

    /// Runs `transform` on every image in parallel.
    ///
    /// Position `i` of the result always holds the outcome for image `i`.
    pub fn map<T: ImageTransform + ?Sized>(&self, transform: &T) -> Mapped {
        let outcomes: Vec<(NaiveDate, Result<Image>)> = self
            .images
            .par_iter()
            .map(|DatedImage { date, image }| (*date, transform.apply(image)))
            .collect();
        let mapped = Mapped {
            id: self.id.clone(),
            outcomes,
        };
        info!(
            "mapped {}: {} ok, {} failed",
            self.id,
            mapped.len() - mapped.failed(),
            mapped.failed()
        );
        mapped
    }

    /// Band selection on every image.
    pub fn select(&self, selector: &BandSelector) -> Mapped {
        self.map(&|image: &Image| image.select_bands(selector))
    }

    /// Every image reduced to the bands called `names`, in that order.
    ///
    /// Fails with [BandscaleError::MissingBand] if any image lacks one.
    pub fn project(&self, names: &[String]) -> Result<Collection> {
        self.map(&|image: &Image| image.select_names(names))
            .into_collection()
    }

    /// Per-pixel maximum over all images, ignoring masked pixels.
    ///
    /// Pixels masked in every image stay masked. The composite is dated with
    /// the newest acquisition.
    pub fn max(&self) -> Result<DatedImage> {
        self.composite("max", |current, sample| current.max(sample))
    }

    /// Per-pixel mosaic, the last unmasked pixel in collection order wins.
    pub fn mosaic(&self) -> Result<DatedImage> {
        self.composite("mosaic", |_, sample| sample)
    }

    fn composite(&self, reducer: &str, combine: impl Fn(f64, f64) -> f64) -> Result<DatedImage> {
        let first = self.first().ok_or(BandscaleError::EmptyCollection)?;
        let Some(dim) = first.image.dim() else {
            return Ok(first.clone());
        };
        let band_names: Vec<&str> = first.image.band_names().collect();
        let mut seen = Array2::from_elem(dim, false);
        let mut accumulated: Vec<Array2<f64>> = band_names
            .iter()
            .map(|_| Array2::from_elem(dim, f64::NAN))
            .collect();

        for DatedImage { image, .. } in &self.images {
            let valid = image.valid_mask().unwrap_or_else(|| Array2::from_elem(dim, false));
            if valid.dim() != dim {
                return Err(BandscaleError::ShapeMismatch {
                    band: format!("{}:mask", image.id()),
                    expected: dim,
                    found: valid.dim(),
                });
            }
            for (name, acc) in band_names.iter().zip(accumulated.iter_mut()) {
                let band = image.band(name)?;
                if band.dim() != dim {
                    return Err(BandscaleError::ShapeMismatch {
                        band: name.to_string(),
                        expected: dim,
                        found: band.dim(),
                    });
                }
                Zip::from(acc)
                    .and(&seen)
                    .and(&**band)
                    .and(&valid)
                    .for_each(|acc, &seen, &sample, &valid| {
                        if valid {
                            *acc = if seen { combine(*acc, sample) } else { sample };
                        }
                    });
            }
            Zip::from(&mut seen)
                .and(&valid)
                .for_each(|seen, &valid| *seen |= valid);
        }

        let mask = if seen.iter().all(|valid| *valid) {
            None
        } else {
            Some(seen)
        };
        let image = band_names
            .into_iter()
            .zip(accumulated)
            .try_fold(
                Image::new(format!("{}:{reducer}", self.id)),
                |image, (name, samples)| image.with_band(name, Band::from(samples)),
            )?
            .with_mask(mask);
        let date = self.dates().max().unwrap_or(first.date);
        debug!("{reducer} of {} images: {image:?}", self.images.len());
        Ok(DatedImage { date, image })
    }
}

/// Per-pixel reducer of a [Reduction].
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Reducer {
    Max,
    Mosaic,
}

/// Collapses a collection into one image before it is drawn.
#[derive(Debug, Clone, Copy, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Reduction {
    pub reducer: Reducer,
    /// Pixels whose first band does not exceed this are masked out.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
}

impl Reduction {
    pub fn new(reducer: Reducer) -> Self {
        Self {
            reducer,
            threshold: None,
        }
    }

    pub fn with_threshold(self, threshold: f64) -> Self {
        Self {
            threshold: Some(threshold),
            ..self
        }
    }

    /// Reduces the `bands` of every image of `collection`.
    pub fn reduce(&self, collection: &Collection, bands: &[String]) -> Result<DatedImage> {
        let projected = collection.project(bands)?;
        let composite = match self.reducer {
            Reducer::Max => projected.max()?,
            Reducer::Mosaic => projected.mosaic()?,
        };
        let (Some(threshold), Some(first)) = (self.threshold, bands.first()) else {
            return Ok(composite);
        };
        let keep = composite.image.band(first)?.gt(threshold);
        let image = composite.image.update_mask(&keep)?;
        debug!("{:?} of {}: masked {first} <= {threshold}", self.reducer, collection.id());
        Ok(DatedImage {
            date: composite.date,
            image,
        })
    }
}

impl FromIterator<DatedImage> for Collection {
    fn from_iter<I: IntoIterator<Item = DatedImage>>(iter: I) -> Self {
        Self::from_images(String::new(), iter.into_iter().collect())
    }
}

/// Image that failed a [Collection::map].
#[derive(Debug)]
pub struct ImageFailure {
    pub index: usize,
    pub date: NaiveDate,
    pub error: BandscaleError,
}

/// Per-image outcomes of [Collection::map], in collection order.
#[derive(Debug)]
pub struct Mapped {
    id: String,
    outcomes: Vec<(NaiveDate, Result<Image>)>,
}

impl Mapped {
    pub fn outcomes(&self) -> &[(NaiveDate, Result<Image>)] {
        &self.outcomes
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|(_, outcome)| outcome.is_err()).count()
    }

    /// The mapped collection, or the error of the first failing image.
    pub fn into_collection(self) -> Result<Collection> {
        let images = self
            .outcomes
            .into_iter()
            .map(|(date, outcome)| outcome.map(|image| DatedImage { date, image }))
            .collect::<Result<Vec<_>>>()?;
        Ok(Collection::from_images(self.id, images))
    }

    /// Successful images as a collection, and the failures.
    pub fn partition(self) -> (Collection, Vec<ImageFailure>) {
        let mut images = Vec::with_capacity(self.outcomes.len());
        let mut failures = Vec::new();
        for (index, (date, outcome)) in self.outcomes.into_iter().enumerate() {
            match outcome {
                Ok(image) => images.push(DatedImage { date, image }),
                Err(error) => failures.push(ImageFailure { index, date, error }),
            }
        }
        (Collection::from_images(self.id, images), failures)
    }
}
