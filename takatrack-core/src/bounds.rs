//! Viewport framing for the current set of bins.

use crate::model::{Location, Span, Viewport, ViewportUpdate};

#[derive(Debug, Clone, Copy, PartialEq)]
/// Tuning for viewport computation.
pub struct BoundsSettings {
    /// Fraction of the raw extent added on each side.
    pub padding: f64,
    /// Smallest span allowed on either axis, in degrees.
    pub min_span: f64,
}

impl Default for BoundsSettings {
    fn default() -> Self {
        Self {
            padding: 0.1,
            min_span: 0.05,
        }
    }
}

/// Compute a viewport framing all locations.
///
/// Longitudes are framed by the shorter arc, so bins on both sides of the
/// antimeridian get a narrow viewport centered near ±180°.
///
/// Returns [`ViewportUpdate::Keep`] when there is nothing to frame.
#[must_use]
pub fn frame<'loc, I>(locations: I, settings: BoundsSettings) -> ViewportUpdate
where
    I: IntoIterator<Item = &'loc Location>,
{
    let mut locations = locations.into_iter();
    let Some(first) = locations.next() else {
        return ViewportUpdate::Keep;
    };

    let (mut south, mut north) = (first.lat, first.lat);
    let mut longitudes = vec![first.lng];
    for location in locations {
        south = south.min(location.lat);
        north = north.max(location.lat);
        longitudes.push(location.lng);
    }
    let (west, east) = longitude_extent(&mut longitudes);

    let grow = 1.0 + 2.0 * settings.padding;
    let span = Span {
        lat_delta: ((north - south) * grow).max(settings.min_span),
        lng_delta: ((east - west) * grow).max(settings.min_span),
    };

    ViewportUpdate::Fit(Viewport {
        center: Location {
            lat: (south + north) / 2.0,
            lng: wrap_longitude((west + east) / 2.0),
        },
        span,
    })
}

/// Western and eastern edge of the smallest arc holding every longitude.
///
/// `east` exceeds 180 when the arc crosses the antimeridian.
fn longitude_extent(longitudes: &mut [f64]) -> (f64, f64) {
    longitudes.sort_by(f64::total_cmp);
    let (Some(&min), Some(&max)) = (longitudes.first(), longitudes.last()) else {
        return (0.0, 0.0);
    };

    // The widest empty gap is the part of the globe left out of the viewport.
    let mut extent = (min, max);
    let mut widest_gap = min + 360.0 - max;
    for pair in longitudes.windows(2) {
        if let [before, after] = pair {
            let gap = after - before;
            if gap > widest_gap {
                widest_gap = gap;
                extent = (*after, before + 360.0);
            }
        }
    }
    extent
}

fn wrap_longitude(lng: f64) -> f64 {
    if lng > 180.0 { lng - 360.0 } else { lng }
}
