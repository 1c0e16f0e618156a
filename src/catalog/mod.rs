use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::coords::{AngleFormat, Coordinate, format_sexagesimal, normalize_sexagesimal};
use crate::error::{ControlError, CoordinateError};
use crate::service::commands::TargetRequest;
use crate::service::event_log::EventLog;

/// Catalog coordinate, either decimal (hours for RA, degrees for Dec) or
/// already in sexagesimal form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CatalogCoordinate {
    Decimal(f64),
    Formatted(String),
}

impl CatalogCoordinate {
    fn format(&self, format: AngleFormat) -> String {
        match self {
            CatalogCoordinate::Decimal(value) => format_sexagesimal(*value, format),
            CatalogCoordinate::Formatted(value) => normalize_sexagesimal(value, format)
                .unwrap_or_else(|_| value.trim().to_string()),
        }
    }

    fn check_right_ascension(&self) -> Result<(), CoordinateError> {
        match self {
            CatalogCoordinate::Decimal(hours) if (0.0..24.0).contains(hours) => Ok(()),
            CatalogCoordinate::Decimal(hours) => Err(
                CoordinateError::RightAscensionOutOfRange(hours.to_string()),
            ),
            CatalogCoordinate::Formatted(value) => {
                normalize_sexagesimal(value, AngleFormat::Hours).map(|_| ())
            }
        }
    }

    fn check_declination(&self) -> Result<(), CoordinateError> {
        match self {
            CatalogCoordinate::Decimal(degrees) if (-90.0..=90.0).contains(degrees) => Ok(()),
            CatalogCoordinate::Decimal(degrees) => Err(
                CoordinateError::DeclinationOutOfRange(degrees.to_string()),
            ),
            CatalogCoordinate::Formatted(value) => {
                normalize_sexagesimal(value, AngleFormat::Signed).map(|_| ())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: String,
    #[serde(default)]
    pub ngc: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type", default)]
    pub object_type: String,
    #[serde(default)]
    pub constellation: Option<String>,
    #[serde(default)]
    pub magnitude: Option<f64>,
    pub ra: CatalogCoordinate,
    pub dec: CatalogCoordinate,
}

impl CatalogEntry {
    /// `M31 (Andromeda Galaxy)`, or just the id for unnamed objects
    pub fn display_name(&self) -> String {
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => format!("{} ({})", self.id, name),
            _ => self.id.clone(),
        }
    }

    /// Coordinates in the field widths the mount expects
    pub fn target(&self) -> Coordinate {
        if let (CatalogCoordinate::Decimal(ra), CatalogCoordinate::Decimal(dec)) =
            (&self.ra, &self.dec)
        {
            return Coordinate::from_decimal(*ra, *dec);
        }

        Coordinate::new(
            self.ra.format(AngleFormat::Hours),
            self.dec.format(AngleFormat::Signed),
        )
    }

    /// Reject coordinates the mount could never accept as a target
    pub fn check(&self) -> Result<(), CoordinateError> {
        self.ra.check_right_ascension()?;
        self.dec.check_declination()
    }

    fn matches(&self, term: &str) -> bool {
        self.display_name().to_lowercase().contains(term)
            || self.object_type.to_lowercase().contains(term)
            || self
                .constellation
                .as_deref()
                .is_some_and(|c| c.to_lowercase().contains(term))
    }
}

/// Read-only list of selectable deep-sky objects
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    /// Load a JSON array of catalog entries
    pub async fn load(path: &Path) -> Result<Self, ControlError> {
        let contents = tokio::fs::read_to_string(path).await?;
        let entries: Vec<CatalogEntry> = serde_json::from_str(&contents)
            .map_err(|e| ControlError::Catalog(format!("{}: {}", path.display(), e)))?;

        for entry in &entries {
            entry.check().map_err(|e| {
                ControlError::Catalog(format!("{}: {}: {}", path.display(), entry.id, e))
            })?;
        }

        tracing::info!("Loaded {} catalog objects from {}", entries.len(), path.display());
        Ok(Self::new(entries))
    }

    /// Load the catalog at `path`, falling back to the built-in objects
    pub async fn load_or_fallback(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::fallback();
        };

        match Self::load(path).await {
            Ok(catalog) => catalog,
            Err(e) => {
                tracing::warn!("Failed to load catalog, using fallback objects: {}", e);
                Self::fallback()
            }
        }
    }

    pub fn fallback() -> Self {
        Self::new(vec![
            fallback_entry(
                "M31",
                "Andromeda Galaxy",
                "Galaxy",
                "Andromeda",
                3.44,
                ("00:42:44", "+41:16:09"),
            ),
            fallback_entry(
                "M42",
                "Orion Nebula",
                "Nebula",
                "Orion",
                4.0,
                ("05:35:17", "-05:23:14"),
            ),
            fallback_entry(
                "M13",
                "Hercules Cluster",
                "Globular cluster",
                "Hercules",
                5.8,
                ("16:41:41", "+36:27:37"),
            ),
        ])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up an entry by id, ignoring case
    pub fn get(&self, id: &str) -> Option<&CatalogEntry> {
        self.entries
            .iter()
            .find(|entry| entry.id.eq_ignore_ascii_case(id.trim()))
    }

    /// Case-insensitive match on display name, type or constellation
    pub fn search(&self, term: &str) -> Vec<&CatalogEntry> {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return self.entries.iter().collect();
        }

        self.entries.iter().filter(|e| e.matches(&term)).collect()
    }
}

fn fallback_entry(
    id: &str,
    name: &str,
    object_type: &str,
    constellation: &str,
    magnitude: f64,
    (ra, dec): (&str, &str),
) -> CatalogEntry {
    CatalogEntry {
        id: id.to_string(),
        ngc: None,
        name: Some(name.to_string()),
        object_type: object_type.to_string(),
        constellation: Some(constellation.to_string()),
        magnitude: Some(magnitude),
        ra: CatalogCoordinate::Formatted(ra.to_string()),
        dec: CatalogCoordinate::Formatted(dec.to_string()),
    }
}

/// Turn a catalog pick into target input for a later set-target command
pub fn select(entry: &CatalogEntry, log: &EventLog) -> TargetRequest {
    log.info(format!("Selected {} as target", entry.display_name()));
    TargetRequest::from(entry.target())
}
