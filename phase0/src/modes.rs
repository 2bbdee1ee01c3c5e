//! Instrument mode records.
//!
//! A [`ModeRecord`] describes one observing configuration of one instrument:
//! an imager with its filter set, or a spectrograph setup with its disperser,
//! blocking filter and focal plane units. Fields shared by both kinds live on
//! the record itself; everything specific to one kind lives in the
//! [`ModeKind`] payload, so imaging code can never read a resolution and
//! spectroscopy code can never read a filter wheel.
//!
//! Wavelengths are in microns, angular sizes in arcseconds.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Observing mode of a catalog row or a request.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Imaging,
    Spectroscopy,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Imaging => write!(f, "imaging"),
            Category::Spectroscopy => write!(f, "spectroscopy"),
        }
    }
}

/// Spectroscopic slit or aperture configuration.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum FocalPlaneUnit {
    /// Single long slit
    #[value(name = "singleslit")]
    SingleSlit,
    /// Custom multi-object slit mask
    #[value(name = "multislit")]
    MultiSlit,
    /// Integral field unit
    #[value(name = "ifu")]
    Ifu,
}

impl FocalPlaneUnit {
    /// True for units that cover a 2-D field or many targets at once.
    ///
    /// These never need their slit width matched to the seeing.
    pub fn is_extended(&self) -> bool {
        matches!(self, FocalPlaneUnit::MultiSlit | FocalPlaneUnit::Ifu)
    }
}

impl fmt::Display for FocalPlaneUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FocalPlaneUnit::SingleSlit => write!(f, "singleslit"),
            FocalPlaneUnit::MultiSlit => write!(f, "multislit"),
            FocalPlaneUnit::Ifu => write!(f, "ifu"),
        }
    }
}

impl FromStr for FocalPlaneUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "singleslit" | "longslit" => Ok(FocalPlaneUnit::SingleSlit),
            "multislit" | "mos" => Ok(FocalPlaneUnit::MultiSlit),
            "ifu" => Ok(FocalPlaneUnit::Ifu),
            other => Err(format!("unknown focal plane unit '{other}'")),
        }
    }
}

/// Special observing capability offered by a mode.
///
/// A mode with no special capability carries an empty set; the catalog
/// token `none` maps to that empty set rather than to a variant.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    #[value(name = "speckle")]
    Speckle,
    #[value(name = "nodshuffle")]
    NodShuffle,
    #[value(name = "coronagraph")]
    Coronagraph,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::Speckle => write!(f, "speckle"),
            Capability::NodShuffle => write!(f, "nodshuffle"),
            Capability::Coronagraph => write!(f, "coronagraph"),
        }
    }
}

impl FromStr for Capability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "speckle" => Ok(Capability::Speckle),
            "nodshuffle" | "nod&shuffle" | "n&s" => Ok(Capability::NodShuffle),
            "coronagraph" => Ok(Capability::Coronagraph),
            other => Err(format!("unknown capability '{other}'")),
        }
    }
}

/// Imaging-only properties of a mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImagingMode {
    /// Filter bandwidth in microns
    pub bandwidth: f64,
    /// Field of view in arcseconds
    pub field_of_view: f64,
    /// Filter names available in this mode (empty when the catalog says `none`)
    pub filters: BTreeSet<String>,
}

/// Spectroscopy-only properties of a mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpectroscopyMode {
    /// Simultaneous spectral coverage in microns
    pub wavelength_range: f64,
    /// Spectral resolving power λ/Δλ
    pub resolution: f64,
    /// Slit length (or IFU field) in arcseconds
    pub slit_length: f64,
    /// Slit width in arcseconds
    pub slit_width: f64,
    /// Order-blocking filter, `None` when the catalog says `none`
    pub filter: Option<String>,
    /// Focal plane units this setup can be used with
    pub focal_plane_units: BTreeSet<FocalPlaneUnit>,
    /// Grating, prism or echelle label (display only)
    pub disperser: String,
}

impl SpectroscopyMode {
    /// True if the setup offers an IFU or a multi-object mask.
    pub fn has_extended_unit(&self) -> bool {
        self.focal_plane_units.iter().any(FocalPlaneUnit::is_extended)
    }
}

/// Category-specific payload of a [`ModeRecord`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "lowercase")]
pub enum ModeKind {
    Imaging(ImagingMode),
    Spectroscopy(SpectroscopyMode),
}

/// One row of the instrument mode catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModeRecord {
    /// Instrument name, e.g. "GMOS-N"
    pub instrument: String,
    /// Wavelength at which the mode performs best
    pub wavelength_optimal: f64,
    /// Short end of the wavelength coverage
    pub wavelength_min: f64,
    /// Long end of the wavelength coverage
    pub wavelength_max: f64,
    /// Mode is fed by an adaptive optics system
    pub adaptive_optics: bool,
    /// Special capabilities, empty for a plain mode
    pub capabilities: BTreeSet<Capability>,
    /// Shortest exposure the readout modes support (seconds), 0 when unlimited
    #[serde(default)]
    pub min_exposure: f64,
    /// Best image quality the mode can deliver (arcsec), 0 when unlimited
    #[serde(default)]
    pub image_quality_min: f64,
    #[serde(flatten)]
    pub kind: ModeKind,
}

impl ModeRecord {
    pub fn category(&self) -> Category {
        match self.kind {
            ModeKind::Imaging(_) => Category::Imaging,
            ModeKind::Spectroscopy(_) => Category::Spectroscopy,
        }
    }

    pub fn has_capability(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    /// Check whether `wavelength` falls inside the coverage band (inclusive).
    pub fn covers_wavelength(&self, wavelength: f64) -> bool {
        self.wavelength_min <= wavelength && wavelength <= self.wavelength_max
    }

    pub fn as_imaging(&self) -> Option<&ImagingMode> {
        match &self.kind {
            ModeKind::Imaging(mode) => Some(mode),
            ModeKind::Spectroscopy(_) => None,
        }
    }

    pub fn as_spectroscopy(&self) -> Option<&SpectroscopyMode> {
        match &self.kind {
            ModeKind::Spectroscopy(mode) => Some(mode),
            ModeKind::Imaging(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spectroscopy_record(units: &[FocalPlaneUnit]) -> ModeRecord {
        ModeRecord {
            instrument: "GMOS-S".to_string(),
            wavelength_optimal: 0.76,
            wavelength_min: 0.52,
            wavelength_max: 1.03,
            adaptive_optics: false,
            capabilities: BTreeSet::new(),
            min_exposure: 0.0,
            image_quality_min: 0.0,
            kind: ModeKind::Spectroscopy(SpectroscopyMode {
                wavelength_range: 0.46,
                resolution: 959.0,
                slit_length: 330.0,
                slit_width: 1.0,
                filter: Some("GG455".to_string()),
                focal_plane_units: units.iter().copied().collect(),
                disperser: "R400".to_string(),
            }),
        }
    }

    #[test]
    fn test_focal_plane_unit_aliases() {
        assert_eq!(
            "longslit".parse::<FocalPlaneUnit>().unwrap(),
            FocalPlaneUnit::SingleSlit
        );
        assert_eq!(
            " MOS ".parse::<FocalPlaneUnit>().unwrap(),
            FocalPlaneUnit::MultiSlit
        );
        assert_eq!("IFU".parse::<FocalPlaneUnit>().unwrap(), FocalPlaneUnit::Ifu);
        assert!("echelle".parse::<FocalPlaneUnit>().is_err());
    }

    #[test]
    fn test_capability_aliases() {
        assert_eq!(
            "Nod&Shuffle".parse::<Capability>().unwrap(),
            Capability::NodShuffle
        );
        assert_eq!("n&s".parse::<Capability>().unwrap(), Capability::NodShuffle);
        assert_eq!(
            "Speckle".parse::<Capability>().unwrap(),
            Capability::Speckle
        );
        // "none" is an empty set, not a capability
        assert!("none".parse::<Capability>().is_err());
    }

    #[test]
    fn test_extended_units() {
        assert!(!spectroscopy_record(&[FocalPlaneUnit::SingleSlit])
            .as_spectroscopy()
            .unwrap()
            .has_extended_unit());
        assert!(spectroscopy_record(&[FocalPlaneUnit::SingleSlit, FocalPlaneUnit::MultiSlit])
            .as_spectroscopy()
            .unwrap()
            .has_extended_unit());
        assert!(spectroscopy_record(&[FocalPlaneUnit::Ifu])
            .as_spectroscopy()
            .unwrap()
            .has_extended_unit());
    }

    #[test]
    fn test_category_accessors() {
        let record = spectroscopy_record(&[FocalPlaneUnit::Ifu]);
        assert_eq!(record.category(), Category::Spectroscopy);
        assert!(record.as_imaging().is_none());
        assert!(record.as_spectroscopy().is_some());
    }

    #[test]
    fn test_wavelength_coverage_is_inclusive() {
        let record = spectroscopy_record(&[FocalPlaneUnit::SingleSlit]);
        assert!(record.covers_wavelength(0.52));
        assert!(record.covers_wavelength(1.03));
        assert!(!record.covers_wavelength(0.51));
        assert!(!record.covers_wavelength(1.04));
    }
}
