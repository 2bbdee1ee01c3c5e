//! PHASE0 - instrument mode selection for observing proposals
//!
//! Matches an observer's imaging or spectroscopy request against a catalog
//! of instrument configurations. Rows that violate a hard constraint are
//! filtered out, the survivors are scored, and the result is ranked by
//! descending score:
//!
//! ```text
//! Catalog + Request -> filters -> scoring -> ranking -> report
//! ```

pub mod args;
pub mod catalog;
pub mod config;
pub mod error;
pub mod filters;
pub mod modes;
pub mod ranking;
pub mod report;
pub mod request;
pub mod scoring;

// Re-export commonly used types for external use
pub use crate::catalog::Catalog;
pub use crate::config::{MatchConfig, ScoreWeights};
pub use crate::error::{CatalogError, ConfigError, RequestError};
pub use crate::filters::{eligible_modes, Rejection};
pub use crate::modes::{Capability, Category, FocalPlaneUnit, ModeKind, ModeRecord};
pub use crate::ranking::{recommend, Recommendation};
pub use crate::request::{ImagingRequest, Request, SpectroscopyRequest};
pub use crate::scoring::ScoreTerms;
