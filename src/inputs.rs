//! The six required input spreadsheets and their fill state.
//!
//! An [`InputSet`] always has exactly one entry per [`Slot`]. A slot is
//! either empty or holds one [`InputFile`]; nothing is validated at
//! assignment time, [`InputSet::validate`] runs right before upload.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Extension every input must carry, compared case-insensitively.
pub const REQUIRED_EXTENSION: &str = ".xlsx";

/// Logical role of an input file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    Centrale,
    Succursale,
    TabellaAule,
    TabellaClassi,
    TabellaMaterie,
    TabellaSostegno,
}

impl Slot {
    /// Every slot, in submission order.
    pub const ALL: [Slot; 6] = [
        Slot::Centrale,
        Slot::Succursale,
        Slot::TabellaAule,
        Slot::TabellaClassi,
        Slot::TabellaMaterie,
        Slot::TabellaSostegno,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Slot::Centrale => "centrale",
            Slot::Succursale => "succursale",
            Slot::TabellaAule => "tabella_aule",
            Slot::TabellaClassi => "tabella_classi",
            Slot::TabellaMaterie => "tabella_materie",
            Slot::TabellaSostegno => "tabella_sostegno",
        }
    }

    /// The role-based filename the server expects for this slot, whatever
    /// the user's file was called.
    pub fn standard_filename(self) -> &'static str {
        match self {
            Slot::Centrale => "centrale.xlsx",
            Slot::Succursale => "succursale.xlsx",
            Slot::TabellaAule => "tabella_aule.xlsx",
            Slot::TabellaClassi => "tabella_classi.xlsx",
            Slot::TabellaMaterie => "tabella_materie.xlsx",
            Slot::TabellaSostegno => "tabella_sostegno.xlsx",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A file picked by the user: its original name plus contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFile {
    name: String,
    data: Vec<u8>,
}

impl InputFile {
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    /// Reads a file from disk, keeping its file name for display and
    /// extension checks.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let data = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self { name, data })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn size_bytes(&self) -> u64 {
        self.data.len() as u64
    }

    fn has_required_extension(&self) -> bool {
        self.name.to_lowercase().ends_with(REQUIRED_EXTENSION)
    }
}

/// One part of the upload body: a file renamed to its slot's standard name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPart {
    pub slot: Slot,
    pub filename: &'static str,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputSet {
    slots: [Option<InputFile>; 6],
}

impl InputSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces exactly one slot. `None` clears it.
    pub fn set_slot(&mut self, slot: Slot, file: Option<InputFile>) {
        self.slots[slot.index()] = file;
    }

    pub fn get(&self, slot: Slot) -> Option<&InputFile> {
        self.slots[slot.index()].as_ref()
    }

    pub fn clear(&mut self) {
        self.slots = Default::default();
    }

    pub fn is_complete(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    pub fn filled(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Checks presence first, then extensions, reporting the first offending
    /// slot in submission order.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for slot in Slot::ALL {
            let Some(file) = self.get(slot) else {
                return Err(ValidationError::MissingInput(slot));
            };
            if !file.has_required_extension() {
                return Err(ValidationError::BadExtension {
                    slot,
                    filename: file.name().to_string(),
                });
            }
        }
        Ok(())
    }

    /// Builds the six upload parts after a successful [`validate`](Self::validate).
    pub fn upload_parts(&self) -> Result<Vec<UploadPart>, ValidationError> {
        self.validate()?;
        Ok(Slot::ALL
            .iter()
            .filter_map(|&slot| {
                self.get(slot).map(|file| UploadPart {
                    slot,
                    filename: slot.standard_filename(),
                    data: file.data().to_vec(),
                })
            })
            .collect())
    }
}

#[cfg(test)]
pub(crate) fn complete_set() -> InputSet {
    let mut set = InputSet::new();
    for slot in Slot::ALL {
        set.set_slot(
            slot,
            Some(InputFile::new(
                format!("My {} export.XLSX", slot.key()),
                slot.key().as_bytes().to_vec(),
            )),
        );
    }
    set
}
