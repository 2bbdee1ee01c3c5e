//! Hard constraints applied before scoring
//!
//! A catalog row is eligible for a request only if every predicate for the
//! request's category holds. Each predicate is a standalone function so it
//! can be re-checked on its own; [`check`] runs them in order and reports
//! the first one that fails.

use std::collections::BTreeSet;
use std::fmt;

use log::{debug, info, warn};

use crate::catalog::Catalog;
use crate::config::MatchConfig;
use crate::modes::{Capability, ImagingMode, ModeKind, ModeRecord, SpectroscopyMode};
use crate::request::{ImagingRequest, Request, RequestParams, SpectroscopyRequest};

/// The predicate that excluded a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Category,
    FieldOfView,
    Filters,
    Bandwidth,
    WavelengthCoverage,
    Resolution,
    WavelengthRange,
    SlitLength,
    FocalPlaneUnit,
    AdaptiveOptics,
    ImageQuality,
    Exposure,
    Capability(Capability),
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::Category => write!(f, "wrong observing mode"),
            Rejection::FieldOfView => write!(f, "field of view too small"),
            Rejection::Filters => write!(f, "no requested filter available"),
            Rejection::Bandwidth => write!(f, "bandwidth outside requested bounds"),
            Rejection::WavelengthCoverage => write!(f, "wavelength not covered"),
            Rejection::Resolution => write!(f, "resolution too low"),
            Rejection::WavelengthRange => write!(f, "spectral coverage too narrow"),
            Rejection::SlitLength => write!(f, "slit too short"),
            Rejection::FocalPlaneUnit => write!(f, "focal plane unit unavailable"),
            Rejection::AdaptiveOptics => write!(f, "AO required for requested image quality"),
            Rejection::ImageQuality => write!(f, "requested image quality not reachable"),
            Rejection::Exposure => write!(f, "minimum exposure too long"),
            Rejection::Capability(c) => write!(f, "{c} gate"),
        }
    }
}

/// True when the requested image quality can only be reached with AO.
pub fn requires_adaptive_optics(image_quality: f64, config: &MatchConfig) -> bool {
    image_quality < config.ao_image_quality_threshold
}

/// AO gate: AO rows are mandatory below the threshold and allowed above it.
pub fn passes_ao_gate(record: &ModeRecord, image_quality: f64, config: &MatchConfig) -> bool {
    !requires_adaptive_optics(image_quality, config) || record.adaptive_optics
}

/// Exclusive capability gate.
///
/// A requested capability admits only rows offering it; an unrequested one
/// excludes rows offering it.
pub fn passes_capability_gate(
    record: &ModeRecord,
    requested: &BTreeSet<Capability>,
    capability: Capability,
) -> bool {
    requested.contains(&capability) == record.has_capability(capability)
}

/// The mode's best image quality is no worse than the request.
///
/// Rows without a floor (`image_quality_min == 0`) always pass.
pub fn reaches_image_quality(record: &ModeRecord, image_quality: f64) -> bool {
    record.image_quality_min <= image_quality
}

/// The mode can read out an exposure as short as the program needs.
pub fn supports_exposure(record: &ModeRecord, exposure_time: Option<f64>) -> bool {
    exposure_time.map_or(true, |exposure| record.min_exposure <= exposure)
}

pub fn has_field_of_view(mode: &ImagingMode, min_field_of_view: f64) -> bool {
    mode.field_of_view >= min_field_of_view
}

/// At least one requested filter is mounted.
pub fn shares_filter(mode: &ImagingMode, requested: &BTreeSet<String>) -> bool {
    !mode.filters.is_disjoint(requested)
}

/// Bandwidth within optional bounds; an absent bound always passes.
pub fn within_bandwidth(mode: &ImagingMode, min: Option<f64>, max: Option<f64>) -> bool {
    min.map_or(true, |min| mode.bandwidth >= min) && max.map_or(true, |max| mode.bandwidth <= max)
}

pub fn has_resolution(mode: &SpectroscopyMode, min_resolution: f64) -> bool {
    mode.resolution >= min_resolution
}

pub fn has_wavelength_range(mode: &SpectroscopyMode, min_range: f64) -> bool {
    mode.wavelength_range >= min_range
}

pub fn has_slit_length(mode: &SpectroscopyMode, min_length: f64) -> bool {
    mode.slit_length >= min_length
}

fn require(passes: bool, rejection: Rejection) -> Result<(), Rejection> {
    if passes {
        Ok(())
    } else {
        Err(rejection)
    }
}

fn check_imaging(
    record: &ModeRecord,
    mode: &ImagingMode,
    request: &ImagingRequest,
    config: &MatchConfig,
) -> Result<(), Rejection> {
    require(
        has_field_of_view(mode, request.field_of_view),
        Rejection::FieldOfView,
    )?;
    require(shares_filter(mode, &request.filters), Rejection::Filters)?;
    require(
        passes_ao_gate(record, request.image_quality, config),
        Rejection::AdaptiveOptics,
    )?;
    require(
        reaches_image_quality(record, request.image_quality),
        Rejection::ImageQuality,
    )?;
    require(
        passes_capability_gate(record, &request.capabilities, Capability::Speckle),
        Rejection::Capability(Capability::Speckle),
    )?;
    require(
        within_bandwidth(mode, request.min_bandwidth, request.max_bandwidth),
        Rejection::Bandwidth,
    )?;
    require(
        supports_exposure(record, request.exposure_time),
        Rejection::Exposure,
    )
}

fn check_spectroscopy(
    record: &ModeRecord,
    mode: &SpectroscopyMode,
    request: &SpectroscopyRequest,
    config: &MatchConfig,
) -> Result<(), Rejection> {
    require(
        record.covers_wavelength(request.wavelength),
        Rejection::WavelengthCoverage,
    )?;
    require(
        has_resolution(mode, request.resolution),
        Rejection::Resolution,
    )?;
    require(
        has_wavelength_range(mode, request.wavelength_range),
        Rejection::WavelengthRange,
    )?;
    require(
        has_slit_length(mode, request.field_of_view),
        Rejection::SlitLength,
    )?;
    require(
        mode.focal_plane_units.contains(&request.focal_plane_unit),
        Rejection::FocalPlaneUnit,
    )?;
    require(
        passes_capability_gate(record, &request.capabilities, Capability::NodShuffle),
        Rejection::Capability(Capability::NodShuffle),
    )?;
    require(
        passes_ao_gate(record, request.image_quality, config),
        Rejection::AdaptiveOptics,
    )?;
    require(
        reaches_image_quality(record, request.image_quality),
        Rejection::ImageQuality,
    )?;
    require(
        passes_capability_gate(record, &request.capabilities, Capability::Coronagraph),
        Rejection::Capability(Capability::Coronagraph),
    )?;
    require(
        supports_exposure(record, request.exposure_time),
        Rejection::Exposure,
    )
}

/// Run every predicate for the request's category against one row.
pub fn check(record: &ModeRecord, request: &Request, config: &MatchConfig) -> Result<(), Rejection> {
    match (&record.kind, request.params()) {
        (ModeKind::Imaging(mode), RequestParams::Imaging(req)) => {
            check_imaging(record, mode, req, config)
        }
        (ModeKind::Spectroscopy(mode), RequestParams::Spectroscopy(req)) => {
            check_spectroscopy(record, mode, req, config)
        }
        _ => Err(Rejection::Category),
    }
}

pub fn is_eligible(record: &ModeRecord, request: &Request, config: &MatchConfig) -> bool {
    check(record, request, config).is_ok()
}

/// Narrow `indices` to the rows that satisfy the request, keeping their order.
///
/// Indices that are out of range for the catalog are dropped.
pub fn eligible_among(
    catalog: &Catalog,
    indices: &[usize],
    request: &Request,
    config: &MatchConfig,
) -> Vec<usize> {
    indices
        .iter()
        .copied()
        .filter(|&index| {
            let Some(record) = catalog.get(index) else {
                return false;
            };
            match check(record, request, config) {
                Ok(()) => true,
                Err(Rejection::Category) => false,
                Err(reason) => {
                    debug!(
                        "Mode rejected: row={index}, instrument={}, reason={reason}",
                        record.instrument
                    );
                    false
                }
            }
        })
        .collect()
}

/// Indices of every catalog row eligible for `request`, in catalog order.
pub fn eligible_modes(catalog: &Catalog, request: &Request, config: &MatchConfig) -> Vec<usize> {
    let all: Vec<usize> = (0..catalog.len()).collect();
    let eligible = eligible_among(catalog, &all, request, config);

    if eligible.is_empty() {
        warn!(
            "No {} modes satisfy the request ({} candidates)",
            request.category(),
            catalog.count(request.category())
        );
    } else {
        info!(
            "{} of {} {} modes eligible",
            eligible.len(),
            catalog.count(request.category()),
            request.category()
        );
    }
    eligible
}
