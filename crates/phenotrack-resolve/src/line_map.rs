//! Randomisation line number to client line name mapping
//!
//! A two-column table supplied alongside tray scans. Parsed on its own; the
//! first mapping of a line number wins.

use crate::diagnostics::{Diagnostics, Warning};
use crate::error::ResolveError;
use indexmap::IndexMap;

/// Required header row, in order
pub const LINE_MAPPING_HEADERS: [&str; 2] = ["Randomisation line number", "Client line name"];

/// Parsed line-name table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineNameMapping {
    names: IndexMap<String, String>,
}

impl LineNameMapping {
    /// Parse a header row and its data rows
    ///
    /// Rows without exactly two fields are reported and mapped over the
    /// fields present; a row lacking either value is dropped.
    ///
    /// # Errors
    /// - [`ResolveError::NoHeader`] if the header row is empty
    /// - [`ResolveError::InvalidLineMappingHeaders`] unless the header is
    ///   exactly [`LINE_MAPPING_HEADERS`]
    /// - [`ResolveError::NoValidRows`] if no mapping was read
    pub fn parse<H, R, S>(headers: &[H], rows: &[R], diagnostics: &Diagnostics) -> Result<Self, ResolveError>
    where
        H: AsRef<str>,
        R: AsRef<[S]>,
        S: AsRef<str>,
    {
        let found: Vec<String> = headers.iter().map(|h| h.as_ref().trim().to_string()).collect();
        if found.iter().all(String::is_empty) {
            return Err(ResolveError::NoHeader);
        }
        if found.len() != 2 || found[0] != LINE_MAPPING_HEADERS[0] || found[1] != LINE_MAPPING_HEADERS[1] {
            return Err(ResolveError::InvalidLineMappingHeaders {
                expected: LINE_MAPPING_HEADERS,
                found,
            });
        }

        let mut names = IndexMap::new();
        for (idx, row) in rows.iter().enumerate() {
            let fields = row.as_ref();
            if fields.len() != 2 {
                diagnostics.warn(Warning::FieldCountMismatch {
                    row: idx + 1,
                    expected: 2,
                    found: fields.len(),
                });
            }
            let mut cells = fields.iter().map(|f| f.as_ref().trim());
            let (Some(line), Some(name)) = (cells.next(), cells.next()) else {
                continue;
            };
            if line.is_empty() {
                continue;
            }
            match names.entry(line.to_string()) {
                indexmap::map::Entry::Vacant(slot) => {
                    slot.insert(name.to_string());
                }
                indexmap::map::Entry::Occupied(kept) => {
                    diagnostics.warn(Warning::DuplicateLineMapping {
                        line_number: line.to_string(),
                        kept: kept.get().clone(),
                        rejected: name.to_string(),
                    });
                }
            }
        }

        if names.is_empty() {
            return Err(ResolveError::NoValidRows);
        }
        tracing::debug!("read {} line name mappings", names.len());
        Ok(Self { names })
    }

    /// Client name for a randomisation line number
    #[must_use]
    pub fn get(&self, line_number: &str) -> Option<&str> {
        self.names.get(line_number.trim()).map(String::as_str)
    }

    /// Mappings in file order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.names.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of mappings
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// True if empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
