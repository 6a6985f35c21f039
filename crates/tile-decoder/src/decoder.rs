//! Tile window decoding and overview level matching.

use raster_common::{DecodedTile, RasterError, TileWindow};
use tracing::{debug, instrument};

use crate::error::DecodeError;
use crate::source::RasterSource;

/// Decode `window` at `level` of `source`.
///
/// The level is trusted as given: matching overviews across bands is
/// done beforehand with [`match_levels`]. Samples keep their native
/// numeric type.
#[instrument(skip(source), fields(raster = source.id()))]
pub async fn decode(source: &dyn RasterSource, level: usize, window: TileWindow) -> Result<DecodedTile, DecodeError> {
    let layout = source.sample_layout();
    let format = layout.format().ok_or(DecodeError::UnsupportedSampleFormat {
        bits_per_sample: layout.bits_per_sample,
        kind: layout.kind,
    })?;

    let count = source.image_count();
    let (width, height) = source
        .dimensions(level)
        .ok_or(DecodeError::InvalidLevel { level, count })?;

    if !window.fits_within(width, height) {
        return Err(DecodeError::TileOutOfBounds {
            window,
            level,
            width,
            height,
        });
    }

    let samples = source.read_rasters(level, window).await?;

    if samples.format() != format {
        return Err(DecodeError::MalformedSamples(format!(
            "source declared {} but returned {}",
            format,
            samples.format()
        )));
    }

    let expected = window.pixel_count() * layout.samples_per_pixel;
    if samples.len() != expected {
        return Err(DecodeError::MalformedSamples(format!(
            "expected {} samples for {}, got {}",
            expected,
            window,
            samples.len()
        )));
    }

    debug!(level, %window, format = %format, "Decoded tile");

    Ok(DecodedTile::new(samples, layout.samples_per_pixel, window.width, window.height))
}

/// Lowest level of `source` whose size is exactly `dimensions`.
pub fn level_for_dimensions(source: &dyn RasterSource, dimensions: (usize, usize)) -> Option<usize> {
    (0..source.image_count()).find(|&i| source.dimensions(i) == Some(dimensions))
}

/// For each of `others`, the level matching `reference` at `reference_level`.
///
/// When several overviews share the reference size, the lowest index
/// wins. A band with no matching level is a dimension mismatch.
pub fn match_levels(
    reference: &dyn RasterSource,
    reference_level: usize,
    others: &[&dyn RasterSource],
) -> Result<Vec<usize>, RasterError> {
    let dims = reference.dimensions(reference_level).ok_or_else(|| {
        RasterError::DimensionMismatch(format!(
            "reference raster '{}' has no level {}",
            reference.id(),
            reference_level
        ))
    })?;

    others
        .iter()
        .map(|other| {
            level_for_dimensions(*other, dims).ok_or_else(|| {
                RasterError::DimensionMismatch(format!(
                    "raster '{}' has no level of {}x{} to match '{}' level {}",
                    other.id(),
                    dims.0,
                    dims.1,
                    reference.id(),
                    reference_level
                ))
            })
        })
        .collect()
}
