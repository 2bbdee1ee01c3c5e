//! In-memory instrument mode catalog and its CSV loaders.
//!
//! Two table layouts are supported, one per [`Category`]. Both are plain CSV
//! with a header row; multi-valued cells (filters, focal plane units,
//! capabilities) are quoted, comma-separated lists. Every cell is parsed into
//! a typed value once, at load time, and a bad cell aborts the load with an
//! error naming the row and column. A header with a missing, unknown or
//! repeated column is rejected. The `min_exposure` and `iq_min` columns are
//! optional; an absent column or empty cell means the mode has no limit.
//!
//! ```text
//! instrument,wavelength_optimal,wavelength_min,wavelength_max,bandwidth,fov,filters,ao,capabilities,min_exposure,iq_min
//! GMOS-N,0.63,0.36,1.03,0.15,330,"u,g,r,i,z",no,none,1.0,0.25
//! ```

use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use log::{debug, info};

use crate::error::CatalogError;
use crate::modes::{Category, ImagingMode, ModeKind, ModeRecord, SpectroscopyMode};

const IMAGING_TABLE: &str = include_str!("../data/imaging_modes.csv");
const SPECTROSCOPY_TABLE: &str = include_str!("../data/spectroscopy_modes.csv");

const IMAGING_COLUMNS: [&str; 9] = [
    "instrument",
    "wavelength_optimal",
    "wavelength_min",
    "wavelength_max",
    "bandwidth",
    "fov",
    "filters",
    "ao",
    "capabilities",
];

/// Columns either table may carry; an absent one reads as 0 (no limit).
const OPTIONAL_COLUMNS: [&str; 2] = ["min_exposure", "iq_min"];

const SPECTROSCOPY_COLUMNS: [&str; 13] = [
    "instrument",
    "wavelength_optimal",
    "wavelength_min",
    "wavelength_max",
    "wavelength_range",
    "resolution",
    "slit_length",
    "slit_width",
    "filter",
    "focal_plane",
    "disperser",
    "ao",
    "capabilities",
];

/// Read-only table of instrument modes.
///
/// Row indices are stable for the lifetime of the catalog and are what the
/// filter and ranking stages hand around.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    modes: Vec<ModeRecord>,
}

impl Catalog {
    pub fn from_records(modes: Vec<ModeRecord>) -> Self {
        Self { modes }
    }

    /// Both built-in Gemini tables, imaging rows first.
    pub fn builtin() -> Result<Self, CatalogError> {
        let imaging = Self::builtin_table(Category::Imaging)?;
        let spectroscopy = Self::builtin_table(Category::Spectroscopy)?;
        Ok(imaging.merge(spectroscopy))
    }

    /// The built-in table for a single category.
    pub fn builtin_table(category: Category) -> Result<Self, CatalogError> {
        let table = match category {
            Category::Imaging => IMAGING_TABLE,
            Category::Spectroscopy => SPECTROSCOPY_TABLE,
        };
        Self::from_reader(table.as_bytes(), category)
    }

    /// Load one table variant from a CSV file.
    pub fn load_from_file(path: &Path, category: Category) -> Result<Self, CatalogError> {
        let file = File::open(path).map_err(|source| CatalogError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::from_reader(file, category)?;
        info!(
            "Loaded {} {} modes from {}",
            catalog.len(),
            category,
            path.display()
        );
        Ok(catalog)
    }

    /// Parse one table variant from any CSV source.
    pub fn from_reader<R: Read>(reader: R, category: Category) -> Result<Self, CatalogError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let required: &[&'static str] = match category {
            Category::Imaging => &IMAGING_COLUMNS,
            Category::Spectroscopy => &SPECTROSCOPY_COLUMNS,
        };
        let columns = ColumnIndex::new(csv_reader.headers()?, required, category)?;

        let mut modes = Vec::new();
        for (i, result) in csv_reader.records().enumerate() {
            let record = result?;
            let row = RowReader {
                record: &record,
                columns: &columns,
                row: i + 1,
            };
            let mode = match category {
                Category::Imaging => parse_imaging_row(&row)?,
                Category::Spectroscopy => parse_spectroscopy_row(&row)?,
            };
            modes.push(mode);
        }

        Ok(Self { modes })
    }

    /// Append `other`'s rows after this catalog's rows.
    pub fn merge(mut self, other: Catalog) -> Self {
        self.modes.extend(other.modes);
        self
    }

    pub fn get(&self, index: usize) -> Option<&ModeRecord> {
        self.modes.get(index)
    }

    pub fn modes(&self) -> &[ModeRecord] {
        &self.modes
    }

    /// Iterate rows together with their catalog index.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &ModeRecord)> {
        self.modes.iter().enumerate()
    }

    pub fn len(&self) -> usize {
        self.modes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modes.is_empty()
    }

    /// Number of rows belonging to `category`.
    pub fn count(&self, category: Category) -> usize {
        self.modes
            .iter()
            .filter(|mode| mode.category() == category)
            .count()
    }
}

/// Maps lower-cased header names to field positions.
///
/// Every header must be a required or optional column of the table variant,
/// and each may appear only once.
struct ColumnIndex {
    positions: HashMap<String, usize>,
}

impl ColumnIndex {
    fn new(
        headers: &csv::StringRecord,
        required: &[&'static str],
        category: Category,
    ) -> Result<Self, CatalogError> {
        let mut positions = HashMap::new();
        for (i, header) in headers.iter().enumerate() {
            let name = header.trim().to_ascii_lowercase();
            let known = required
                .iter()
                .chain(OPTIONAL_COLUMNS.iter())
                .any(|c| *c == name.as_str());
            if !known {
                return Err(CatalogError::UnexpectedColumn {
                    category,
                    column: header.trim().to_string(),
                });
            }
            if positions.insert(name.clone(), i).is_some() {
                return Err(CatalogError::DuplicateColumn {
                    category,
                    column: name,
                });
            }
        }

        if let Some(column) = required
            .iter()
            .copied()
            .find(|c| !positions.contains_key(*c))
        {
            return Err(CatalogError::MissingColumn { category, column });
        }

        for column in OPTIONAL_COLUMNS {
            if !positions.contains_key(column) {
                debug!("{category} catalog has no '{column}' column, treating it as unlimited");
            }
        }

        Ok(Self { positions })
    }

    fn contains(&self, column: &str) -> bool {
        self.positions.contains_key(column)
    }
}

/// Typed accessors over one CSV record.
struct RowReader<'a> {
    record: &'a csv::StringRecord,
    columns: &'a ColumnIndex,
    row: usize,
}

impl RowReader<'_> {
    fn text(&self, column: &'static str) -> &str {
        self.columns
            .positions
            .get(column)
            .and_then(|&i| self.record.get(i))
            .unwrap_or("")
            .trim()
    }

    fn required_text(&self, column: &'static str) -> Result<String, CatalogError> {
        let value = self.text(column);
        if value.is_empty() {
            return Err(CatalogError::EmptyField {
                row: self.row,
                column,
            });
        }
        Ok(value.to_string())
    }

    fn number(&self, column: &'static str) -> Result<f64, CatalogError> {
        let value = self.text(column);
        value
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| CatalogError::InvalidNumber {
                row: self.row,
                column,
                value: value.to_string(),
            })
    }

    /// Read an optional numeric column; an absent column or empty cell gives 0.
    fn limit(&self, column: &'static str) -> Result<f64, CatalogError> {
        if !self.columns.contains(column) || self.text(column).is_empty() {
            return Ok(0.0);
        }
        let value = self.number(column)?;
        if value < 0.0 {
            return Err(CatalogError::InvalidNumber {
                row: self.row,
                column,
                value: self.text(column).to_string(),
            });
        }
        Ok(value)
    }

    fn flag(&self, column: &'static str) -> Result<bool, CatalogError> {
        let value = self.text(column);
        match value.to_ascii_lowercase().as_str() {
            "yes" => Ok(true),
            "no" => Ok(false),
            _ => Err(CatalogError::InvalidFlag {
                row: self.row,
                column,
                value: value.to_string(),
            }),
        }
    }

    /// Split a comma-separated cell; `none` or an empty cell yields no items.
    fn list(&self, column: &'static str) -> Vec<&str> {
        let value = self.text(column);
        if value.is_empty() || value.eq_ignore_ascii_case("none") {
            return Vec::new();
        }
        value
            .split(',')
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .collect()
    }

    fn token_set<T>(&self, column: &'static str) -> Result<BTreeSet<T>, CatalogError>
    where
        T: FromStr<Err = String> + Ord,
    {
        self.list(column)
            .into_iter()
            .map(|token| {
                token.parse::<T>().map_err(|reason| CatalogError::InvalidToken {
                    row: self.row,
                    column,
                    reason,
                })
            })
            .collect()
    }

    /// Fields common to both table variants.
    fn common(&self, kind: ModeKind) -> Result<ModeRecord, CatalogError> {
        let wavelength_min = self.number("wavelength_min")?;
        let wavelength_max = self.number("wavelength_max")?;
        if wavelength_min > wavelength_max {
            return Err(CatalogError::InvalidRange {
                row: self.row,
                min: wavelength_min,
                max: wavelength_max,
            });
        }

        Ok(ModeRecord {
            instrument: self.required_text("instrument")?,
            wavelength_optimal: self.number("wavelength_optimal")?,
            wavelength_min,
            wavelength_max,
            adaptive_optics: self.flag("ao")?,
            capabilities: self.token_set("capabilities")?,
            min_exposure: self.limit("min_exposure")?,
            image_quality_min: self.limit("iq_min")?,
            kind,
        })
    }
}

fn parse_imaging_row(row: &RowReader<'_>) -> Result<ModeRecord, CatalogError> {
    let imaging = ImagingMode {
        bandwidth: row.number("bandwidth")?,
        field_of_view: row.number("fov")?,
        filters: row
            .list("filters")
            .into_iter()
            .map(str::to_string)
            .collect(),
    };
    row.common(ModeKind::Imaging(imaging))
}

fn parse_spectroscopy_row(row: &RowReader<'_>) -> Result<ModeRecord, CatalogError> {
    let focal_plane_units = row.token_set("focal_plane")?;
    if focal_plane_units.is_empty() {
        return Err(CatalogError::EmptyField {
            row: row.row,
            column: "focal_plane",
        });
    }

    let filter = match row.text("filter") {
        "" => None,
        f if f.eq_ignore_ascii_case("none") => None,
        f => Some(f.to_string()),
    };

    let spectroscopy = SpectroscopyMode {
        wavelength_range: row.number("wavelength_range")?,
        resolution: row.number("resolution")?,
        slit_length: row.number("slit_length")?,
        slit_width: row.number("slit_width")?,
        filter,
        focal_plane_units,
        disperser: row.required_text("disperser")?,
    };
    row.common(ModeKind::Spectroscopy(spectroscopy))
}
