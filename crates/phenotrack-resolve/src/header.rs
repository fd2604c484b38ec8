//! Tray-scan header mapping
//!
//! A static table maps each header label to the record field it fills.
//! The header row is validated once; rows are then mapped positionally.

use crate::diagnostics::{Diagnostics, Warning};
use crate::error::ResolveError;
use phenotrack_graph::{vocab, Iri};

/// One tray-scan row, every field trimmed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct TrayScanRecord {
    pub year: String,
    pub project_number: String,
    pub project_id: String,
    pub experiment_number: String,
    pub experiment_id: String,
    pub genus: String,
    pub species: String,
    pub pot_number: String,
    pub tray_number: String,
    pub pot_number_tray: String,
    pub column_number_tray: String,
    pub column_letter: String,
    pub row_number_tray: String,
    pub row_number_rep: String,
    pub column_number_rep: String,
    pub column_number: String,
    pub tray_id: String,
    pub tray_notes: String,
    pub tray_row_number: String,
    pub tray_type_name: String,
    pub position: String,
    pub plant_id: String,
    pub plant_line_number: String,
    pub plant_name: String,
    pub plant_notes: String,
    pub pot_type: String,
    pub control: String,
    pub replicate_number: String,
    pub pot_replicate_number: String,
}

type Setter = fn(&mut TrayScanRecord, String);

struct Column {
    label: &'static str,
    set: Setter,
}

macro_rules! columns {
    ($($label:literal => $field:ident),* $(,)?) => {
        const COLUMNS: &[Column] = &[
            $(Column {
                label: $label,
                set: {
                    fn set(record: &mut TrayScanRecord, value: String) {
                        record.$field = value;
                    }
                    set
                },
            }),*
        ];
    };
}

columns! {
    "Year" => year,
    "ProjectNumber" => project_number,
    "ProjectID" => project_id,
    "ExperimentNumber" => experiment_number,
    "ExperimentID" => experiment_id,
    "Genus" => genus,
    "Species" => species,
    "PotNumber" => pot_number,
    "TrayNumber" => tray_number,
    "PotNumberTray" => pot_number_tray,
    "ColumnNumberTray" => column_number_tray,
    "ColumnLetter" => column_letter,
    "RowNumberTray" => row_number_tray,
    "RowNumberRep" => row_number_rep,
    "ColumnNumberRep" => column_number_rep,
    "ColumnNumber" => column_number,
    "TrayID" => tray_id,
    "TrayNotes" => tray_notes,
    "TrayRowNumber" => tray_row_number,
    "TrayTypeName" => tray_type_name,
    "Position" => position,
    "PlantID" => plant_id,
    "PlantLineNumber" => plant_line_number,
    "PlantName" => plant_name,
    "PlantNotes" => plant_notes,
    "PotType" => pot_type,
    "Control" => control,
    "ReplicateNumber" => replicate_number,
    "PotReplicateNumber" => pot_replicate_number,
}

/// Headers every tray-scan file must carry
pub const REQUIRED_HEADERS: &[&str] = &[
    "ProjectID",
    "ExperimentID",
    "TrayID",
    "TrayNotes",
    "TrayTypeName",
    "Position",
    "PlantID",
    "PlantName",
    "PlantNotes",
];

/// Every header label understood, in canonical order
pub fn known_headers() -> impl Iterator<Item = &'static str> {
    COLUMNS.iter().map(|c| c.label)
}

/// Validated header row
#[derive(Debug, Clone)]
pub struct HeaderMap {
    setters: Vec<Option<Setter>>,
}

impl HeaderMap {
    /// Validate a header row
    ///
    /// Blank header cells are tolerated and their column ignored.
    ///
    /// # Errors
    /// - [`ResolveError::NoHeader`] if the row is empty or entirely blank
    /// - [`ResolveError::UnrecognisedHeader`] on the first unknown label
    /// - [`ResolveError::MissingHeaders`] listing every absent required label
    pub fn new<S: AsRef<str>>(headers: &[S]) -> Result<Self, ResolveError> {
        if headers.iter().all(|h| h.as_ref().trim().is_empty()) {
            return Err(ResolveError::NoHeader);
        }

        let mut setters = Vec::with_capacity(headers.len());
        let mut seen = Vec::with_capacity(headers.len());
        for header in headers {
            let label = header.as_ref().trim();
            if label.is_empty() {
                setters.push(None);
                continue;
            }
            let column = COLUMNS
                .iter()
                .find(|c| c.label == label)
                .ok_or_else(|| ResolveError::UnrecognisedHeader {
                    header: label.to_string(),
                })?;
            setters.push(Some(column.set));
            seen.push(column.label);
        }

        let missing: Vec<String> = REQUIRED_HEADERS
            .iter()
            .filter(|r| !seen.contains(*r))
            .map(|r| (*r).to_string())
            .collect();
        if !missing.is_empty() {
            return Err(ResolveError::MissingHeaders { missing });
        }

        Ok(Self { setters })
    }

    /// Number of header columns
    #[inline]
    #[must_use]
    pub fn width(&self) -> usize {
        self.setters.len()
    }

    /// Map one row
    ///
    /// A row whose length differs from the header is reported as
    /// [`Warning::FieldCountMismatch`] and mapped best-effort over the
    /// overlapping columns.
    pub fn record<S: AsRef<str>>(&self, row: usize, fields: &[S], diagnostics: &Diagnostics) -> TrayScanRecord {
        if fields.len() != self.setters.len() {
            diagnostics.warn(Warning::FieldCountMismatch {
                row,
                expected: self.setters.len(),
                found: fields.len(),
            });
        }
        let mut record = TrayScanRecord::default();
        for (setter, value) in self.setters.iter().zip(fields) {
            if let Some(set) = setter {
                set(&mut record, value.as_ref().trim().to_string());
            }
        }
        record
    }
}

/// Whether a material is a control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlFlag {
    /// Control plant
    Yes,
    /// Treated plant
    No,
    /// Not recorded
    Unknown,
}

impl ControlFlag {
    /// Case-insensitive parse of `yes`, `no` or `unknown`
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("yes") {
            Some(Self::Yes)
        } else if raw.eq_ignore_ascii_case("no") {
            Some(Self::No)
        } else if raw.eq_ignore_ascii_case("unknown") {
            Some(Self::Unknown)
        } else {
            None
        }
    }

    /// Parse, mapping anything unrecognised to `Unknown` with a warning
    pub fn parse_or_warn(raw: &str, diagnostics: &Diagnostics) -> Self {
        Self::parse(raw).unwrap_or_else(|| {
            diagnostics.warn(Warning::UnrecognisedControl {
                value: raw.to_string(),
            });
            Self::Unknown
        })
    }

    /// Vocabulary individual for this flag
    #[must_use]
    pub fn iri(self) -> &'static Iri {
        match self {
            Self::Yes => &vocab::HAS_CONTROL_YES,
            Self::No => &vocab::HAS_CONTROL_NO,
            Self::Unknown => &vocab::HAS_CONTROL_UNKNOWN,
        }
    }
}
