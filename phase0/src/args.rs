use std::collections::BTreeSet;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::error::RequestError;
use crate::modes::{Capability, Category, FocalPlaneUnit};
use crate::request::{
    ImagingRequest, Request, SpectroscopyRequest, DEFAULT_FIELD_OF_VIEW, DEFAULT_IMAGE_QUALITY,
    DEFAULT_RESOLUTION, DEFAULT_WAVELENGTH, DEFAULT_WAVELENGTH_RANGE,
};

/// Output format for the recommendation list
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

/// Select and rank instrument configurations for an observation
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Phase0Args {
    /// Observing mode
    #[arg(long, value_enum)]
    pub mode: Category,

    /// Acceptable imaging filters (comma-separated or repeated)
    #[arg(long, value_delimiter = ',')]
    pub filter: Vec<String>,

    /// Minimum field of view or slit length in arcseconds
    #[arg(long, default_value_t = DEFAULT_FIELD_OF_VIEW)]
    pub fov: f64,

    /// Target wavelength in microns
    #[arg(long, default_value_t = DEFAULT_WAVELENGTH)]
    pub wave: f64,

    /// Minimum spectral resolving power
    #[arg(long, default_value_t = DEFAULT_RESOLUTION)]
    pub res: f64,

    /// Minimum simultaneous wavelength coverage in microns
    #[arg(long, default_value_t = DEFAULT_WAVELENGTH_RANGE)]
    pub range: f64,

    /// Expected image quality in arcseconds
    #[arg(long, default_value_t = DEFAULT_IMAGE_QUALITY)]
    pub iq: f64,

    /// Focal plane unit for spectroscopy
    #[arg(long, value_enum, default_value_t = FocalPlaneUnit::SingleSlit)]
    pub fpu: FocalPlaneUnit,

    /// Special capabilities (comma-separated or repeated)
    #[arg(long, value_enum, value_delimiter = ',')]
    pub capability: Vec<Capability>,

    /// Narrowest acceptable imaging bandwidth in microns
    #[arg(long)]
    pub min_bandwidth: Option<f64>,

    /// Widest acceptable imaging bandwidth in microns
    #[arg(long)]
    pub max_bandwidth: Option<f64>,

    /// Shortest exposure the program needs in seconds
    #[arg(long)]
    pub min_exposure: Option<f64>,

    /// Imaging catalog CSV (built-in catalog if omitted)
    #[arg(long)]
    pub imaging_catalog: Option<PathBuf>,

    /// Spectroscopy catalog CSV (built-in catalog if omitted)
    #[arg(long)]
    pub spectroscopy_catalog: Option<PathBuf>,

    /// Matching configuration JSON file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// List eligible imaging modes in catalog order without scores
    #[arg(long, default_value_t = false)]
    pub catalog_order: bool,

    /// Enable debug output
    #[arg(long, default_value_t = false)]
    pub verbose: bool,
}

impl Phase0Args {
    /// Flags set away from their defaults that the selected mode does not use.
    pub fn ignored_flags(&self) -> Vec<&'static str> {
        let mut ignored = Vec::new();
        match self.mode {
            Category::Imaging => {
                if self.res != DEFAULT_RESOLUTION {
                    ignored.push("--res");
                }
                if self.range != DEFAULT_WAVELENGTH_RANGE {
                    ignored.push("--range");
                }
                if self.fpu != FocalPlaneUnit::SingleSlit {
                    ignored.push("--fpu");
                }
            }
            Category::Spectroscopy => {
                if !self.filter.is_empty() {
                    ignored.push("--filter");
                }
                if self.min_bandwidth.is_some() {
                    ignored.push("--min-bandwidth");
                }
                if self.max_bandwidth.is_some() {
                    ignored.push("--max-bandwidth");
                }
            }
        }
        ignored
    }

    /// Build a validated request from the parsed flags.
    ///
    /// Flags that do not apply to the selected mode are ignored with a warning
    /// when they were given a non-default value.
    pub fn to_request(&self) -> Result<Request, RequestError> {
        for flag in self.ignored_flags() {
            log::warn!("{flag} is ignored for {}", self.mode);
        }

        let capabilities: BTreeSet<Capability> = self.capability.iter().copied().collect();

        match self.mode {
            Category::Imaging => Request::imaging(ImagingRequest {
                field_of_view: self.fov,
                filters: self.filter.iter().cloned().collect(),
                wavelength: self.wave,
                image_quality: self.iq,
                capabilities,
                min_bandwidth: self.min_bandwidth,
                max_bandwidth: self.max_bandwidth,
                exposure_time: self.min_exposure,
            }),
            Category::Spectroscopy => Request::spectroscopy(SpectroscopyRequest {
                focal_plane_unit: self.fpu,
                wavelength: self.wave,
                resolution: self.res,
                wavelength_range: self.range,
                field_of_view: self.fov,
                image_quality: self.iq,
                capabilities,
                exposure_time: self.min_exposure,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::RequestParams;

    #[test]
    fn test_imaging_flags() {
        let args = Phase0Args::try_parse_from([
            "phase0", "--mode", "imaging", "--filter", "r,g", "--filter", "i", "--fov", "60",
            "--iq", "0.1",
        ])
        .unwrap();

        assert_eq!(args.mode, Category::Imaging);
        assert_eq!(args.filter, vec!["r", "g", "i"]);
        assert_eq!(args.format, OutputFormat::Table);

        let request = args.to_request().unwrap();
        match request.params() {
            RequestParams::Imaging(p) => {
                assert_eq!(p.filters.len(), 3);
                assert_eq!(p.field_of_view, 60.0);
                assert_eq!(p.image_quality, 0.1);
                assert_eq!(p.wavelength, DEFAULT_WAVELENGTH);
            }
            RequestParams::Spectroscopy(_) => panic!("expected imaging"),
        }
    }

    #[test]
    fn test_spectroscopy_flags() {
        let args = Phase0Args::try_parse_from([
            "phase0",
            "--mode",
            "spectroscopy",
            "--fpu",
            "ifu",
            "--wave",
            "2.2",
            "--res",
            "3000",
            "--capability",
            "nodshuffle,coronagraph",
            "--format",
            "json",
        ])
        .unwrap();

        assert_eq!(args.format, OutputFormat::Json);
        let request = args.to_request().unwrap();
        match request.params() {
            RequestParams::Spectroscopy(p) => {
                assert_eq!(p.focal_plane_unit, FocalPlaneUnit::Ifu);
                assert_eq!(p.resolution, 3000.0);
                // nod & shuffle is dropped at 2.2 um
                assert_eq!(
                    p.capabilities.iter().copied().collect::<Vec<_>>(),
                    vec![Capability::Coronagraph]
                );
            }
            RequestParams::Imaging(_) => panic!("expected spectroscopy"),
        }
    }

    #[test]
    fn test_ignored_flags() {
        let args = Phase0Args::try_parse_from([
            "phase0", "--mode", "imaging", "--filter", "r", "--res", "3000", "--fpu", "ifu",
        ])
        .unwrap();
        assert_eq!(args.ignored_flags(), vec!["--res", "--fpu"]);

        // defaults passed explicitly do not count
        let args = Phase0Args::try_parse_from([
            "phase0", "--mode", "imaging", "--filter", "r", "--range", "0",
        ])
        .unwrap();
        assert!(args.ignored_flags().is_empty());

        let args = Phase0Args::try_parse_from([
            "phase0",
            "--mode",
            "spectroscopy",
            "--filter",
            "r",
            "--max-bandwidth",
            "0.3",
        ])
        .unwrap();
        assert_eq!(args.ignored_flags(), vec!["--filter", "--max-bandwidth"]);
    }

    #[test]
    fn test_min_exposure_flag() {
        let args = Phase0Args::try_parse_from([
            "phase0",
            "--mode",
            "imaging",
            "--filter",
            "K",
            "--min-exposure",
            "2",
        ])
        .unwrap();
        assert_eq!(args.to_request().unwrap().exposure_time(), Some(2.0));
    }

    #[test]
    fn test_mode_is_required() {
        assert!(Phase0Args::try_parse_from(["phase0", "--filter", "r"]).is_err());
    }

    #[test]
    fn test_unknown_enum_values_rejected() {
        assert!(Phase0Args::try_parse_from(["phase0", "--mode", "photometry"]).is_err());
        assert!(
            Phase0Args::try_parse_from(["phase0", "--mode", "spectroscopy", "--fpu", "fiber"])
                .is_err()
        );
        assert!(Phase0Args::try_parse_from([
            "phase0",
            "--mode",
            "imaging",
            "--capability",
            "polarimetry"
        ])
        .is_err());
    }

    #[test]
    fn test_bandwidth_bounds() {
        let args = Phase0Args::try_parse_from([
            "phase0",
            "--mode",
            "imaging",
            "--filter",
            "r",
            "--min-bandwidth",
            "0.2",
            "--max-bandwidth",
            "0.1",
        ])
        .unwrap();
        assert_eq!(args.min_bandwidth, Some(0.2));
        assert_eq!(
            args.to_request().unwrap_err(),
            RequestError::InvertedBandwidth { min: 0.2, max: 0.1 }
        );
    }

    #[test]
    fn test_imaging_without_filters_fails_validation() {
        let args = Phase0Args::try_parse_from(["phase0", "--mode", "imaging"]).unwrap();
        assert_eq!(args.to_request().unwrap_err(), RequestError::NoFilters);
    }
}
