//! Preference scores for eligible modes
//!
//! Scores are sums of fixed bonuses and proximity terms of the form
//! `x / (x + |value - x|)`. A proximity term is 1.0 when the mode hits the
//! requested value exactly and falls off smoothly with distance, on a scale
//! set by the requested value itself.

use serde::Serialize;

use crate::catalog::Catalog;
use crate::config::MatchConfig;
use crate::modes::{ModeKind, ModeRecord, SpectroscopyMode};
use crate::request::{ImagingRequest, Request, RequestParams, SpectroscopyRequest};

/// Saturating closeness of `value` to a positive `target`, in (0, 1].
pub fn proximity(target: f64, value: f64) -> f64 {
    target / (target + (value - target).abs())
}

/// Individual contributions to a mode's score.
///
/// Terms that do not apply to a category stay at zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ScoreTerms {
    /// Base credit for matching the configuration (imaging)
    pub configuration: f64,
    /// Bonus for not needing AO
    pub non_ao: f64,
    /// Closeness of the optimal wavelength to the requested one
    pub wavelength: f64,
    /// Bonus for an order-blocking filter at long wavelengths (spectroscopy)
    pub order_blocking: f64,
    /// Closeness of the resolving power to the requested one (spectroscopy)
    pub resolution: f64,
    /// Slit width match, or full credit for IFU / multi-object setups (spectroscopy)
    pub slit: f64,
}

impl ScoreTerms {
    /// Sum of all terms, always added in the same order.
    pub fn total(&self) -> f64 {
        self.configuration
            + self.non_ao
            + self.wavelength
            + self.order_blocking
            + self.resolution
            + self.slit
    }
}

pub fn imaging_terms(
    record: &ModeRecord,
    request: &ImagingRequest,
    config: &MatchConfig,
) -> ScoreTerms {
    let weights = &config.weights;
    ScoreTerms {
        configuration: weights.configuration,
        non_ao: if record.adaptive_optics {
            0.0
        } else {
            weights.imaging_non_ao
        },
        wavelength: proximity(request.wavelength, record.wavelength_optimal),
        ..Default::default()
    }
}

pub fn spectroscopy_terms(
    record: &ModeRecord,
    mode: &SpectroscopyMode,
    request: &SpectroscopyRequest,
    config: &MatchConfig,
) -> ScoreTerms {
    let weights = &config.weights;

    let relaxed_seeing = request.image_quality > config.ao_image_quality_threshold;
    let non_ao = if relaxed_seeing && !record.adaptive_optics {
        weights.spectroscopy_non_ao
    } else {
        0.0
    };

    // Blocking filters suppress second-order light from the blue
    let order_blocking =
        if request.wavelength > config.second_order_wavelength && mode.filter.is_some() {
            weights.order_blocking_filter
        } else {
            0.0
        };

    let slit = if mode.has_extended_unit() {
        weights.extended_fpu
    } else {
        proximity(request.image_quality, mode.slit_width)
    };

    ScoreTerms {
        configuration: 0.0,
        non_ao,
        wavelength: proximity(request.wavelength, record.wavelength_optimal),
        order_blocking,
        resolution: proximity(request.resolution, mode.resolution),
        slit,
    }
}

/// Score one row against a request; `None` when the categories differ.
pub fn score_terms(record: &ModeRecord, request: &Request, config: &MatchConfig) -> Option<ScoreTerms> {
    match (&record.kind, request.params()) {
        (ModeKind::Imaging(_), RequestParams::Imaging(req)) => {
            Some(imaging_terms(record, req, config))
        }
        (ModeKind::Spectroscopy(mode), RequestParams::Spectroscopy(req)) => {
            Some(spectroscopy_terms(record, mode, req, config))
        }
        _ => None,
    }
}

/// Score the given rows; rows of the wrong category or out of range are skipped.
pub fn score_modes(
    catalog: &Catalog,
    indices: &[usize],
    request: &Request,
    config: &MatchConfig,
) -> Vec<(usize, ScoreTerms)> {
    indices
        .iter()
        .filter_map(|&index| {
            let record = catalog.get(index)?;
            let terms = score_terms(record, request, config)?;
            log::debug!(
                "Scored row={index}, instrument={}, score={:.3}, terms={terms:?}",
                record.instrument,
                terms.total()
            );
            Some((index, terms))
        })
        .collect()
}
