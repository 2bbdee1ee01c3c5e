//! Console and JSON rendering of recommendations.

use std::collections::BTreeSet;
use std::fmt::Write;

use serde::Serialize;

use crate::catalog::Catalog;
use crate::modes::{Category, FocalPlaneUnit, ModeKind, ModeRecord};
use crate::ranking::Recommendation;

pub const NO_MATCH_MESSAGE: &str = "No matching configuration found.";

/// Display fields for one recommendation, as written by [`render_json`].
#[derive(Debug, Clone, Serialize)]
pub struct ReportRow {
    pub rank: usize,
    pub instrument: String,
    pub category: Category,
    pub adaptive_optics: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focal_plane_units: Option<Vec<FocalPlaneUnit>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disperser: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<f64>,
    pub score: f64,
}

impl ReportRow {
    pub fn new(rank: usize, record: &ModeRecord, score: f64) -> Self {
        let mut row = Self {
            rank,
            instrument: record.instrument.clone(),
            category: record.category(),
            adaptive_optics: record.adaptive_optics,
            filters: None,
            focal_plane_units: None,
            disperser: None,
            filter: None,
            resolution: None,
            score,
        };
        match &record.kind {
            ModeKind::Imaging(mode) => {
                row.filters = Some(mode.filters.iter().cloned().collect());
            }
            ModeKind::Spectroscopy(mode) => {
                row.focal_plane_units = Some(mode.focal_plane_units.iter().copied().collect());
                row.disperser = Some(mode.disperser.clone());
                row.filter = Some(filter_label(&mode.filter).to_string());
                row.resolution = Some(mode.resolution);
            }
        }
        row
    }
}

fn filter_label(filter: &Option<String>) -> &str {
    filter.as_deref().unwrap_or("none")
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

fn join<T: ToString>(items: &BTreeSet<T>) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// Render a ranked table for one observing mode.
pub fn render_table(
    catalog: &Catalog,
    category: Category,
    recommendations: &[Recommendation],
) -> String {
    if recommendations.is_empty() {
        return format!("{NO_MATCH_MESSAGE}\n");
    }

    let mut out = String::new();
    let _ = writeln!(out, "Recommendations:");
    match category {
        Category::Imaging => {
            let _ = writeln!(
                out,
                "{:<14} {:<36} {:<3} {:>6}",
                "Instrument", "Filters", "AO", "Score"
            );
        }
        Category::Spectroscopy => {
            let _ = writeln!(
                out,
                "{:<14} {:<20} {:<12} {:<10} {:>7} {:<3} {:>6}",
                "Instrument", "FPU", "Disperser", "Filter", "R", "AO", "Score"
            );
        }
    }

    for rec in recommendations {
        let Some(record) = catalog.get(rec.index) else {
            continue;
        };
        match &record.kind {
            ModeKind::Imaging(mode) => {
                let _ = writeln!(
                    out,
                    "{:<14} {:<36} {:<3} {:>6.2}",
                    record.instrument,
                    join(&mode.filters),
                    yes_no(record.adaptive_optics),
                    rec.score
                );
            }
            ModeKind::Spectroscopy(mode) => {
                let _ = writeln!(
                    out,
                    "{:<14} {:<20} {:<12} {:<10} {:>7.0} {:<3} {:>6.2}",
                    record.instrument,
                    join(&mode.focal_plane_units),
                    mode.disperser,
                    filter_label(&mode.filter),
                    mode.resolution,
                    yes_no(record.adaptive_optics),
                    rec.score
                );
            }
        }
    }
    out
}

/// List eligible instruments in catalog order, without scores.
pub fn render_catalog_order(catalog: &Catalog, indices: &[usize]) -> String {
    if indices.is_empty() {
        return format!("{NO_MATCH_MESSAGE}\n");
    }

    let mut out = String::from("Options:\n");
    for record in indices.iter().filter_map(|&i| catalog.get(i)) {
        let _ = writeln!(out, "{}", record.instrument);
    }
    out
}

pub fn report_rows(catalog: &Catalog, recommendations: &[Recommendation]) -> Vec<ReportRow> {
    recommendations
        .iter()
        .filter_map(|rec| catalog.get(rec.index).map(|record| (record, rec.score)))
        .enumerate()
        .map(|(i, (record, score))| ReportRow::new(i + 1, record, score))
        .collect()
}

pub fn render_json(
    catalog: &Catalog,
    recommendations: &[Recommendation],
) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&report_rows(catalog, recommendations))
}
