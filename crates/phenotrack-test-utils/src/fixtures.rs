use indexmap::IndexMap;
use phenotrack_resolve::known_headers;

pub const EXAMPLE_PROJECT: &str = "Project#2013-0015";
pub const EXAMPLE_EXPERIMENT: &str = "Project#2013-0015_Experiment#0001";

/// Every known header in canonical order
pub fn scan_headers() -> Vec<&'static str> {
    known_headers().collect()
}

/// One tray-scan row, keyed by header label
#[derive(Debug, Clone)]
pub struct ScanRow {
    values: IndexMap<&'static str, String>,
}

impl ScanRow {
    /// Rice pot `POT-07` in tray `TRAY-01`, a control plant of line `LineA`
    pub fn example() -> Self {
        let mut values: IndexMap<&'static str, String> = known_headers().map(|h| (h, String::new())).collect();
        for (label, value) in [
            ("Year", "2013"),
            ("ProjectNumber", "15"),
            ("ProjectID", EXAMPLE_PROJECT),
            ("ExperimentNumber", "1"),
            ("ExperimentID", EXAMPLE_EXPERIMENT),
            ("Genus", "Oryza"),
            ("Species", "sativa"),
            ("PotNumber", "7"),
            ("TrayNumber", "1"),
            ("PotNumberTray", "7"),
            ("ColumnNumberTray", "3"),
            ("ColumnLetter", "C"),
            ("RowNumberTray", "2"),
            ("RowNumberRep", "2"),
            ("ColumnNumberRep", "3"),
            ("ColumnNumber", "3"),
            ("TrayID", "TRAY-01"),
            ("TrayNotes", "Rice salinity tray"),
            ("TrayRowNumber", "1"),
            ("TrayTypeName", "Standard 20 pot"),
            ("Position", "B3"),
            ("PlantID", "POT-07"),
            ("PlantLineNumber", "42"),
            ("PlantName", "LineA"),
            ("PlantNotes", ""),
            ("PotType", "Small"),
            ("Control", "Yes"),
            ("ReplicateNumber", "1"),
            ("PotReplicateNumber", "7"),
        ] {
            values.insert(label, value.to_string());
        }
        Self { values }
    }

    /// Replace one column
    pub fn with(mut self, label: &'static str, value: impl Into<String>) -> Self {
        assert!(self.values.contains_key(label), "unknown header {label}");
        self.values.insert(label, value.into());
        self
    }

    /// Fields in the order of [`scan_headers`]
    pub fn fields(&self) -> Vec<String> {
        self.values.values().cloned().collect()
    }

    /// Fields in the order of `headers`
    pub fn fields_for(&self, headers: &[&str]) -> Vec<String> {
        headers
            .iter()
            .map(|h| self.values.get(*h).cloned().unwrap_or_default())
            .collect()
    }
}
