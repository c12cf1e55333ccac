//! Loading and saving instrument and tuning documents.
//!
//! Two encodings are supported: the XML schemas of [`xml`] and the serde JSON
//! representation of the same types. Files pick their format by extension.

pub mod xml;

use std::fs;
use std::path::Path;

use crate::{DesignerError, Instrument, Result, Tuning};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Xml,
    Json,
}

impl DocumentFormat {
    /// Format implied by a file extension, case-insensitively.
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|extension| extension.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("xml") => Ok(DocumentFormat::Xml),
            Some("json") => Ok(DocumentFormat::Json),
            _ => Err(DesignerError::document(format!(
                "cannot tell the format of {}; expected a .xml or .json file",
                path.display()
            ))),
        }
    }
}

pub fn parse_instrument(source: &str, format: DocumentFormat) -> Result<Instrument> {
    match format {
        DocumentFormat::Xml => xml::parse_instrument(source),
        DocumentFormat::Json => Ok(serde_json::from_str(source)?),
    }
}

pub fn parse_tuning(source: &str, format: DocumentFormat) -> Result<Tuning> {
    match format {
        DocumentFormat::Xml => xml::parse_tuning(source),
        DocumentFormat::Json => Ok(serde_json::from_str(source)?),
    }
}

pub fn instrument_to_string(instrument: &Instrument, format: DocumentFormat) -> Result<String> {
    match format {
        DocumentFormat::Xml => Ok(xml::write_instrument(instrument)),
        DocumentFormat::Json => Ok(serde_json::to_string_pretty(instrument)?),
    }
}

pub fn tuning_to_string(tuning: &Tuning, format: DocumentFormat) -> Result<String> {
    match format {
        DocumentFormat::Xml => Ok(xml::write_tuning(tuning)),
        DocumentFormat::Json => Ok(serde_json::to_string_pretty(tuning)?),
    }
}

pub fn load_instrument(path: &Path) -> Result<Instrument> {
    let format = DocumentFormat::from_path(path)?;
    let instrument = parse_instrument(&fs::read_to_string(path)?, format)?;
    tracing::debug!(path = %path.display(), name = %instrument.name, "loaded instrument");
    Ok(instrument)
}

pub fn load_tuning(path: &Path) -> Result<Tuning> {
    let format = DocumentFormat::from_path(path)?;
    let tuning = parse_tuning(&fs::read_to_string(path)?, format)?;
    tracing::debug!(
        path = %path.display(),
        fingerings = tuning.fingerings.len(),
        "loaded tuning"
    );
    Ok(tuning)
}

pub fn save_instrument(instrument: &Instrument, path: &Path) -> Result<()> {
    let format = DocumentFormat::from_path(path)?;
    fs::write(path, instrument_to_string(instrument, format)?)?;
    Ok(())
}

pub fn save_tuning(tuning: &Tuning, path: &Path) -> Result<()> {
    let format = DocumentFormat::from_path(path)?;
    fs::write(path, tuning_to_string(tuning, format)?)?;
    Ok(())
}
