use itertools::Itertools;
use log::debug;
use ndarray::{Array2, Zip};
use std::fmt::Debug;

use crate::{
    components::{band::Band, selector::BandSelector, Metadata},
    errors::{BandscaleError, Result},
};

/// Ordered set of named [Band]s on one pixel grid.
///
/// Carries free-form metadata and an optional validity mask
/// (`true` = pixel is valid).
#[derive(Clone, PartialEq, Default)]
pub struct Image {
    id: String,
    bands: Vec<(String, Band)>,
    mask: Option<Array2<bool>>,
    metadata: Metadata,
}

impl Debug for Image {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let f = &mut f.debug_struct("Image");
        f.field("id", &self.id)
            .field("shape", &self.dim())
            .field("bands", &self.band_names().join(", "))
            .field("masked", &self.mask.is_some())
            .finish()
    }
}

impl Image {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Appends a band, the first band fixes the grid.
    pub fn with_band(mut self, name: impl Into<String>, band: Band) -> Result<Self> {
        let name = name.into();
        if self.band(&name).is_ok() {
            return Err(BandscaleError::DuplicateBand(name));
        }
        self.check_shape(&name, &band)?;
        self.bands.push((name, band));
        Ok(self)
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Grid shape `(rows, cols)`, `None` for an image without bands.
    pub fn dim(&self) -> Option<(usize, usize)> {
        self.bands.first().map(|(_, band)| band.dim())
    }

    pub fn len(&self) -> usize {
        self.bands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }

    pub fn band_names(&self) -> impl Iterator<Item = &str> {
        self.bands.iter().map(|(name, _)| name.as_str())
    }

    pub fn bands(&self) -> impl Iterator<Item = (&str, &Band)> {
        self.bands.iter().map(|(name, band)| (name.as_str(), band))
    }

    pub fn band(&self, name: &str) -> Result<&Band> {
        self.bands
            .iter()
            .find(|(band_name, _)| band_name == name)
            .map(|(_, band)| band)
            .ok_or_else(|| BandscaleError::MissingBand(name.to_string()))
    }

    pub fn mask(&self) -> Option<&Array2<bool>> {
        self.mask.as_ref()
    }

    /// Per-pixel validity, all valid when the image is unmasked.
    pub fn valid_mask(&self) -> Option<Array2<bool>> {
        let dim = self.dim()?;
        Some(
            self.mask
                .clone()
                .unwrap_or_else(|| Array2::from_elem(dim, true)),
        )
    }

    /// Subset of the bands matching `selector`, keeping id, mask and metadata.
    pub fn select_bands(&self, selector: &BandSelector) -> Result<Image> {
        let bands: Vec<(String, Band)> = self
            .bands
            .iter()
            .filter(|(name, _)| selector.matches(name))
            .cloned()
            .collect();
        if bands.is_empty() {
            return Err(BandscaleError::Selection {
                selector: selector.to_string(),
                image: self.id.clone(),
            });
        }
        debug!(
            "selected [{}] from {} with `{selector}`",
            bands.iter().map(|(name, _)| name).join(", "),
            self.id
        );
        Ok(Image {
            id: self.id.clone(),
            bands,
            mask: self.mask.clone(),
            metadata: self.metadata.clone(),
        })
    }

    /// The bands called `names`, in that order, keeping id, mask and metadata.
    pub fn select_names<S: AsRef<str>>(&self, names: &[S]) -> Result<Image> {
        let bands = names
            .iter()
            .map(AsRef::<str>::as_ref)
            .unique()
            .map(|name| self.band(name).map(|band| (name.to_string(), band.clone())))
            .collect::<Result<Vec<_>>>()?;
        Ok(Image {
            id: self.id.clone(),
            bands,
            mask: self.mask.clone(),
            metadata: self.metadata.clone(),
        })
    }

    /// Copy of `self` with the bands of `other` added.
    ///
    /// Bands with an existing name replace the original in place when
    /// `overwrite` is set, otherwise they are a [BandscaleError::DuplicateBand].
    /// Mask and metadata of `self` are kept.
    pub fn merge_bands(&self, other: Image, overwrite: bool) -> Result<Image> {
        let mut merged = self.clone();
        for (name, band) in other.bands {
            merged.check_shape(&name, &band)?;
            let position = merged.bands.iter().position(|(existing, _)| *existing == name);
            match position {
                Some(idx) if overwrite => merged.bands[idx].1 = band,
                Some(_) => return Err(BandscaleError::DuplicateBand(name)),
                None => merged.bands.push((name, band)),
            }
        }
        Ok(merged)
    }

    /// Applies `f` to every band.
    pub fn map_bands(&self, f: impl Fn(&Band) -> Band) -> Image {
        Image {
            id: self.id.clone(),
            bands: self
                .bands
                .iter()
                .map(|(name, band)| (name.clone(), f(band)))
                .collect(),
            mask: self.mask.clone(),
            metadata: self.metadata.clone(),
        }
    }

    /// 0/1 bands, 1 where the sample is greater than `threshold`.
    pub fn gt(&self, threshold: f64) -> Image {
        self.map_bands(|band| band.gt(threshold))
    }

    /// Masks out pixels where `mask` is zero or NaN.
    ///
    /// Combined with any existing mask, a pixel stays valid only if valid in both.
    pub fn update_mask(&self, mask: &Band) -> Result<Image> {
        let mut updated = self.clone();
        updated.check_shape("mask", mask)?;
        let Some(mut valid) = self.valid_mask() else {
            return Ok(updated);
        };
        Zip::from(&mut valid)
            .and(&**mask)
            .for_each(|valid, &sample| *valid &= sample != 0. && !sample.is_nan());
        updated.mask = Some(valid);
        Ok(updated)
    }

    pub(crate) fn with_mask(mut self, mask: Option<Array2<bool>>) -> Self {
        self.mask = mask;
        self
    }

    fn check_shape(&self, name: &str, band: &Band) -> Result<()> {
        match self.dim() {
            Some(expected) if expected != band.dim() => Err(BandscaleError::ShapeMismatch {
                band: name.to_string(),
                expected,
                found: band.dim(),
            }),
            _ => Ok(()),
        }
    }
}
