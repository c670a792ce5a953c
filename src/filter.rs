//! Extension filter for listed images
//!
//! An entry is kept when the last dot-delimited segment of its name matches
//! one of the allowed tokens. Comparison is case-insensitive. Under
//! [`ExtensionMatch::Contains`] (the default) "matches" means the segment
//! *contains* the token, so `photo.jpgx` passes the `jpg` token; under
//! [`ExtensionMatch::Exact`] the segment must equal it.

use crate::config::{ExtensionMatch, FilterConfig};
use crate::types::{AllowedImage, ImageReference};
use crate::utils::extension_segment;

/// Order-preserving extension filter
#[derive(Clone, Debug)]
pub struct ImageFilter {
    allowed: Vec<String>,
    mode: ExtensionMatch,
}

impl Default for ImageFilter {
    fn default() -> Self {
        Self::new(&FilterConfig::default())
    }
}

impl ImageFilter {
    /// Build a filter from configuration
    pub fn new(config: &FilterConfig) -> Self {
        let allowed = config
            .allowed_extensions
            .iter()
            .map(|ext| ext.trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect();

        Self {
            allowed,
            mode: config.match_mode,
        }
    }

    /// Whether a single reference passes the filter
    pub fn is_allowed(&self, reference: &ImageReference) -> bool {
        let segment = extension_segment(reference.file_name()).to_ascii_lowercase();
        match self.mode {
            ExtensionMatch::Contains => self
                .allowed
                .iter()
                .any(|token| segment.contains(token.as_str())),
            ExtensionMatch::Exact => self.allowed.iter().any(|token| segment == *token),
        }
    }

    /// Keep the allowed references, preserving their relative order
    pub fn filter_allowed<I>(&self, references: I) -> Vec<AllowedImage>
    where
        I: IntoIterator<Item = ImageReference>,
    {
        references
            .into_iter()
            .filter(|reference| self.is_allowed(reference))
            .map(AllowedImage::new)
            .collect()
    }
}

/// Filter with the default allowed tokens (`jpg`, `png`, `jpeg`) and loose matching
pub fn filter_allowed<I>(references: I) -> Vec<AllowedImage>
where
    I: IntoIterator<Item = ImageReference>,
{
    ImageFilter::default().filter_allowed(references)
}
