//! Vocabulary constants
//!
//! Standard RDF/RDFS/OWL/XSD terms plus the PODD base and science ontology
//! terms used to describe phenomics entities.

use crate::term::Iri;
use once_cell::sync::Lazy;

/// RDF namespace
pub const RDF_NS: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
/// RDFS namespace
pub const RDFS_NS: &str = "http://www.w3.org/2000/01/rdf-schema#";
/// OWL namespace
pub const OWL_NS: &str = "http://www.w3.org/2002/07/owl#";
/// XML Schema datatypes namespace
pub const XSD_NS: &str = "http://www.w3.org/2001/XMLSchema#";
/// PODD base ontology namespace
pub const PODD_BASE_NS: &str = "http://purl.org/podd/ns/poddBase#";
/// PODD science ontology namespace
pub const PODD_SCIENCE_NS: &str = "http://purl.org/podd/ns/poddScience#";

macro_rules! vocab {
    ($ns:literal { $($(#[$meta:meta])* $name:ident => $local:literal),* $(,)? }) => {
        $(
            $(#[$meta])*
            pub static $name: Lazy<Iri> =
                Lazy::new(|| Iri::from_static(concat!($ns, $local)));
        )*
    };
}

vocab!("http://www.w3.org/1999/02/22-rdf-syntax-ns#" {
    /// `rdf:type`
    RDF_TYPE => "type",
});

vocab!("http://www.w3.org/2000/01/rdf-schema#" {
    /// `rdfs:label`
    RDFS_LABEL => "label",
    /// `rdfs:comment`
    RDFS_COMMENT => "comment",
});

vocab!("http://www.w3.org/2002/07/owl#" {
    /// `owl:Ontology`
    OWL_ONTOLOGY => "Ontology",
    /// `owl:versionIRI`
    OWL_VERSION_IRI => "versionIRI",
});

vocab!("http://www.w3.org/2001/XMLSchema#" {
    /// `xsd:string`
    XSD_STRING => "string",
});

vocab!("http://purl.org/podd/ns/poddBase#" {
    /// Links an artifact to its top object
    HAS_TOP_OBJECT => "artifactHasTopObject",
});

vocab!("http://purl.org/podd/ns/poddScience#" {
    /// Project class
    PROJECT => "Project",
    /// Experiment class
    EXPERIMENT => "Experiment",
    /// Tray class
    TRAY => "Tray",
    /// Pot class
    POT => "Pot",
    /// Genotype class
    GENOTYPE => "Genotype",
    /// Material class
    MATERIAL => "Material",

    /// Project to experiment
    HAS_EXPERIMENT => "hasExperiment",
    /// Experiment to tray
    HAS_TRAY => "hasTray",
    /// Tray to pot
    HAS_POT => "hasPot",
    /// Pot to material
    HAS_MATERIAL => "hasMaterial",
    /// Project to genotype
    HAS_GENOTYPE => "hasGenotype",
    /// Material to genotype
    REFERS_TO_GENOTYPE => "refersToGenotype",

    /// Barcode literal
    HAS_BARCODE => "hasBarcode",
    /// Tray type name
    HAS_TRAY_TYPE => "hasTrayType",
    /// Tray number
    HAS_TRAY_NUMBER => "hasTrayNumber",
    /// Tray row number
    HAS_TRAY_ROW_NUMBER => "hasTrayRowNumber",
    /// Pot number
    HAS_POT_NUMBER => "hasPotNumber",
    /// Pot type
    HAS_POT_TYPE => "hasPotType",
    /// Overall column number
    HAS_POT_COLUMN_NUMBER_OVERALL => "hasPotColumnNumberOverall",
    /// Column number within the replicate
    HAS_POT_COLUMN_NUMBER_REPLICATE => "hasPotColumnNumberReplicate",
    /// Column number within the tray
    HAS_POT_COLUMN_NUMBER_TRAY => "hasPotColumnNumberTray",
    /// Column letter within the tray
    HAS_POT_COLUMN_LETTER_TRAY => "hasPotColumnLetterTray",
    /// Position within the tray
    HAS_POT_POSITION_TRAY => "hasPotPositionTray",
    /// Pot number within the tray
    HAS_POT_NUMBER_TRAY => "hasPotNumberTray",
    /// Pot number within the replicate
    HAS_POT_NUMBER_REPLICATE => "hasPotNumberReplicate",
    /// Replicate number
    HAS_REPLICATE => "hasReplicate",
    /// Row number within the replicate
    HAS_POT_ROW_NUMBER_REPLICATE => "hasPotRowNumberReplicate",
    /// Row number within the tray
    HAS_POT_ROW_NUMBER_TRAY => "hasPotRowNumberTray",

    /// Genus literal
    HAS_GENUS => "hasGenus",
    /// Species literal
    HAS_SPECIES => "hasSpecies",
    /// Line name literal
    HAS_LINE => "hasLine",
    /// Line number literal
    HAS_LINE_NUMBER => "hasLineNumber",

    /// Control flag
    HAS_CONTROL => "hasControl",
    /// Control flag individual: yes
    HAS_CONTROL_YES => "HasControl_Yes",
    /// Control flag individual: no
    HAS_CONTROL_NO => "HasControl_No",
    /// Control flag individual: unknown
    HAS_CONTROL_UNKNOWN => "HasControl_Unknown",
});
