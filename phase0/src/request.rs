//! Observer requests.
//!
//! Parameters are collected into a plain [`ImagingRequest`] or
//! [`SpectroscopyRequest`] and then validated into an immutable [`Request`],
//! which is the only form the matching engine accepts.

use std::collections::BTreeSet;

use crate::error::RequestError;
use crate::modes::{Capability, Category, FocalPlaneUnit};

/// Default minimum field of view / slit length (arcsec)
pub const DEFAULT_FIELD_OF_VIEW: f64 = 1.0;
/// Default minimum resolving power
pub const DEFAULT_RESOLUTION: f64 = 1.0;
/// Default target wavelength (microns)
pub const DEFAULT_WAVELENGTH: f64 = 0.5;
/// Default minimum spectral coverage (microns)
pub const DEFAULT_WAVELENGTH_RANGE: f64 = 0.0;
/// Default image quality (arcsec)
pub const DEFAULT_IMAGE_QUALITY: f64 = 1.0;

/// Nod & Shuffle sky subtraction is only offered below this wavelength (microns)
pub const NOD_SHUFFLE_MAX_WAVELENGTH: f64 = 1.0;

/// Imaging parameters before validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ImagingRequest {
    /// Minimum field of view in arcseconds
    pub field_of_view: f64,
    /// Acceptable filter names; any one of them is enough
    pub filters: BTreeSet<String>,
    /// Target wavelength in microns
    pub wavelength: f64,
    /// Expected image quality in arcseconds
    pub image_quality: f64,
    pub capabilities: BTreeSet<Capability>,
    /// Narrowest acceptable filter bandwidth (microns), `None` for any
    pub min_bandwidth: Option<f64>,
    /// Widest acceptable filter bandwidth (microns), `None` for any
    pub max_bandwidth: Option<f64>,
    /// Shortest exposure the program needs (seconds), `None` for any
    pub exposure_time: Option<f64>,
}

impl Default for ImagingRequest {
    fn default() -> Self {
        Self {
            field_of_view: DEFAULT_FIELD_OF_VIEW,
            filters: BTreeSet::new(),
            wavelength: DEFAULT_WAVELENGTH,
            image_quality: DEFAULT_IMAGE_QUALITY,
            capabilities: BTreeSet::new(),
            min_bandwidth: None,
            max_bandwidth: None,
            exposure_time: None,
        }
    }
}

/// Spectroscopy parameters before validation.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectroscopyRequest {
    pub focal_plane_unit: FocalPlaneUnit,
    /// Central wavelength in microns, must be covered by the mode
    pub wavelength: f64,
    /// Minimum resolving power
    pub resolution: f64,
    /// Minimum simultaneous coverage in microns
    pub wavelength_range: f64,
    /// Minimum slit length in arcseconds
    pub field_of_view: f64,
    /// Expected image quality in arcseconds, also the target slit width
    pub image_quality: f64,
    pub capabilities: BTreeSet<Capability>,
    /// Shortest exposure the program needs (seconds), `None` for any
    pub exposure_time: Option<f64>,
}

impl Default for SpectroscopyRequest {
    fn default() -> Self {
        Self {
            focal_plane_unit: FocalPlaneUnit::SingleSlit,
            wavelength: DEFAULT_WAVELENGTH,
            resolution: DEFAULT_RESOLUTION,
            wavelength_range: DEFAULT_WAVELENGTH_RANGE,
            field_of_view: DEFAULT_FIELD_OF_VIEW,
            image_quality: DEFAULT_IMAGE_QUALITY,
            capabilities: BTreeSet::new(),
            exposure_time: None,
        }
    }
}

/// Validated parameters, one variant per observing mode.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestParams {
    Imaging(ImagingRequest),
    Spectroscopy(SpectroscopyRequest),
}

/// A validated, immutable observer request.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    params: RequestParams,
}

impl Request {
    pub fn imaging(mut params: ImagingRequest) -> Result<Self, RequestError> {
        params.filters = params
            .filters
            .iter()
            .map(|f| f.trim())
            .filter(|f| !f.is_empty())
            .map(str::to_string)
            .collect();
        if params.filters.is_empty() {
            return Err(RequestError::NoFilters);
        }

        non_negative("field of view", params.field_of_view)?;
        positive("wavelength", params.wavelength)?;
        positive("image quality", params.image_quality)?;

        if let Some(min) = params.min_bandwidth {
            non_negative("minimum bandwidth", min)?;
        }
        if let Some(max) = params.max_bandwidth {
            non_negative("maximum bandwidth", max)?;
        }
        if let (Some(min), Some(max)) = (params.min_bandwidth, params.max_bandwidth) {
            if min > max {
                return Err(RequestError::InvertedBandwidth { min, max });
            }
        }

        if let Some(exposure) = params.exposure_time {
            non_negative("exposure time", exposure)?;
        }

        supported_capabilities(Category::Imaging, &params.capabilities)?;

        Ok(Self {
            params: RequestParams::Imaging(params),
        })
    }

    /// Validate spectroscopy parameters.
    ///
    /// Nod & Shuffle is optical only: a request for it at or beyond
    /// [`NOD_SHUFFLE_MAX_WAVELENGTH`] falls back to normal sky subtraction.
    pub fn spectroscopy(mut params: SpectroscopyRequest) -> Result<Self, RequestError> {
        positive("wavelength", params.wavelength)?;
        positive("resolution", params.resolution)?;
        non_negative("wavelength range", params.wavelength_range)?;
        non_negative("field of view", params.field_of_view)?;
        positive("image quality", params.image_quality)?;
        if let Some(exposure) = params.exposure_time {
            non_negative("exposure time", exposure)?;
        }

        supported_capabilities(Category::Spectroscopy, &params.capabilities)?;

        if params.wavelength >= NOD_SHUFFLE_MAX_WAVELENGTH
            && params.capabilities.remove(&Capability::NodShuffle)
        {
            log::warn!(
                "Nod & Shuffle is not available at {:.2} um, using normal sky subtraction",
                params.wavelength
            );
        }

        Ok(Self {
            params: RequestParams::Spectroscopy(params),
        })
    }

    pub fn category(&self) -> Category {
        match self.params {
            RequestParams::Imaging(_) => Category::Imaging,
            RequestParams::Spectroscopy(_) => Category::Spectroscopy,
        }
    }

    pub fn params(&self) -> &RequestParams {
        &self.params
    }

    pub fn wavelength(&self) -> f64 {
        match &self.params {
            RequestParams::Imaging(p) => p.wavelength,
            RequestParams::Spectroscopy(p) => p.wavelength,
        }
    }

    pub fn image_quality(&self) -> f64 {
        match &self.params {
            RequestParams::Imaging(p) => p.image_quality,
            RequestParams::Spectroscopy(p) => p.image_quality,
        }
    }

    pub fn capabilities(&self) -> &BTreeSet<Capability> {
        match &self.params {
            RequestParams::Imaging(p) => &p.capabilities,
            RequestParams::Spectroscopy(p) => &p.capabilities,
        }
    }

    pub fn exposure_time(&self) -> Option<f64> {
        match &self.params {
            RequestParams::Imaging(p) => p.exposure_time,
            RequestParams::Spectroscopy(p) => p.exposure_time,
        }
    }
}

/// Capabilities the filter stage can gate on for each observing mode.
pub fn gated_capabilities(category: Category) -> &'static [Capability] {
    match category {
        Category::Imaging => &[Capability::Speckle],
        Category::Spectroscopy => &[Capability::NodShuffle, Capability::Coronagraph],
    }
}

fn supported_capabilities(
    category: Category,
    requested: &BTreeSet<Capability>,
) -> Result<(), RequestError> {
    let gated = gated_capabilities(category);
    match requested.iter().find(|c| !gated.contains(*c)) {
        Some(&capability) => Err(RequestError::UnsupportedCapability {
            capability,
            category,
        }),
        None => Ok(()),
    }
}

fn positive(parameter: &'static str, value: f64) -> Result<(), RequestError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(RequestError::NotPositive { parameter, value })
    }
}

fn non_negative(parameter: &'static str, value: f64) -> Result<(), RequestError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(RequestError::Negative { parameter, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filters(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_imaging_defaults() {
        let request = Request::imaging(ImagingRequest {
            filters: filters(&["r"]),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(request.category(), Category::Imaging);
        assert_eq!(request.wavelength(), 0.5);
        assert_eq!(request.image_quality(), 1.0);
        assert!(request.capabilities().is_empty());
    }

    #[test]
    fn test_imaging_requires_filters() {
        let err = Request::imaging(ImagingRequest::default()).unwrap_err();
        assert_eq!(err, RequestError::NoFilters);

        let err = Request::imaging(ImagingRequest {
            filters: filters(&["  ", ""]),
            ..Default::default()
        })
        .unwrap_err();
        assert_eq!(err, RequestError::NoFilters);
    }

    #[test]
    fn test_imaging_filters_are_trimmed() {
        let request = Request::imaging(ImagingRequest {
            filters: filters(&[" r ", "g"]),
            ..Default::default()
        })
        .unwrap();
        match request.params() {
            RequestParams::Imaging(p) => assert_eq!(p.filters, filters(&["g", "r"])),
            RequestParams::Spectroscopy(_) => panic!("expected imaging"),
        }
    }

    #[test]
    fn test_non_positive_targets_rejected() {
        let err = Request::imaging(ImagingRequest {
            filters: filters(&["r"]),
            wavelength: 0.0,
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(
            err,
            RequestError::NotPositive {
                parameter: "wavelength",
                ..
            }
        ));

        let err = Request::spectroscopy(SpectroscopyRequest {
            resolution: -100.0,
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(
            err,
            RequestError::NotPositive {
                parameter: "resolution",
                ..
            }
        ));

        let err = Request::spectroscopy(SpectroscopyRequest {
            image_quality: f64::NAN,
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(
            err,
            RequestError::NotPositive {
                parameter: "image quality",
                ..
            }
        ));
    }

    #[test]
    fn test_negative_minimums_rejected() {
        let err = Request::spectroscopy(SpectroscopyRequest {
            wavelength_range: -0.1,
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(
            err,
            RequestError::Negative {
                parameter: "wavelength range",
                ..
            }
        ));
    }

    #[test]
    fn test_inverted_bandwidth_rejected() {
        let err = Request::imaging(ImagingRequest {
            filters: filters(&["r"]),
            min_bandwidth: Some(0.3),
            max_bandwidth: Some(0.1),
            ..Default::default()
        })
        .unwrap_err();
        assert_eq!(err, RequestError::InvertedBandwidth { min: 0.3, max: 0.1 });
    }

    #[test]
    fn test_capabilities_must_have_a_gate() {
        let err = Request::imaging(ImagingRequest {
            filters: filters(&["H"]),
            capabilities: [Capability::Coronagraph].into_iter().collect(),
            ..Default::default()
        })
        .unwrap_err();
        assert_eq!(
            err,
            RequestError::UnsupportedCapability {
                capability: Capability::Coronagraph,
                category: Category::Imaging
            }
        );

        let err = Request::spectroscopy(SpectroscopyRequest {
            capabilities: [Capability::Speckle].into_iter().collect(),
            ..Default::default()
        })
        .unwrap_err();
        assert_eq!(
            err,
            RequestError::UnsupportedCapability {
                capability: Capability::Speckle,
                category: Category::Spectroscopy
            }
        );

        assert!(Request::spectroscopy(SpectroscopyRequest {
            capabilities: [Capability::NodShuffle, Capability::Coronagraph]
                .into_iter()
                .collect(),
            ..Default::default()
        })
        .is_ok());
    }

    #[test]
    fn test_negative_exposure_rejected() {
        let err = Request::imaging(ImagingRequest {
            filters: filters(&["r"]),
            exposure_time: Some(-1.0),
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(
            err,
            RequestError::Negative {
                parameter: "exposure time",
                ..
            }
        ));

        let request = Request::spectroscopy(SpectroscopyRequest {
            exposure_time: Some(0.5),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(request.exposure_time(), Some(0.5));
    }

    #[test]
    fn test_nod_shuffle_dropped_in_the_infrared() {
        let nod_shuffle: BTreeSet<Capability> = [Capability::NodShuffle].into_iter().collect();

        let optical = Request::spectroscopy(SpectroscopyRequest {
            wavelength: 0.8,
            capabilities: nod_shuffle.clone(),
            ..Default::default()
        })
        .unwrap();
        assert!(optical.capabilities().contains(&Capability::NodShuffle));

        let infrared = Request::spectroscopy(SpectroscopyRequest {
            wavelength: NOD_SHUFFLE_MAX_WAVELENGTH,
            capabilities: [Capability::NodShuffle, Capability::Coronagraph]
                .into_iter()
                .collect(),
            ..Default::default()
        })
        .unwrap();
        assert!(!infrared.capabilities().contains(&Capability::NodShuffle));
        assert!(infrared.capabilities().contains(&Capability::Coronagraph));
    }

    #[test]
    fn test_unsupported_capability_message_lists_gates() {
        let err = Request::imaging(ImagingRequest {
            filters: filters(&["H"]),
            capabilities: [Capability::Coronagraph].into_iter().collect(),
            ..Default::default()
        })
        .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("no imaging gate exists for capability 'coronagraph'"));
        assert!(message.contains("accept: speckle"));
    }

    #[test]
    fn test_spectroscopy_defaults() {
        let request = Request::spectroscopy(SpectroscopyRequest::default()).unwrap();
        match request.params() {
            RequestParams::Spectroscopy(p) => {
                assert_eq!(p.focal_plane_unit, FocalPlaneUnit::SingleSlit);
                assert_eq!(p.resolution, 1.0);
                assert_eq!(p.wavelength_range, 0.0);
                assert_eq!(p.field_of_view, 1.0);
            }
            RequestParams::Imaging(_) => panic!("expected spectroscopy"),
        }
    }
}
