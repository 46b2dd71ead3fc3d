//! The loaded Btrieve file.

use crate::acs::AcsTable;
use crate::config::LoadOptions;
use crate::error::{BtrieveError, BtrieveResult};
use crate::header::Header;
use crate::key::{definition, Key, KeyValue};
use crate::page::allocation;
use crate::record::{free_list, loader, Record};
use crate::types::FormatVersion;
use btrv_storage::{FileBackend, StorageBackend, StorageError};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A non-fatal problem found while loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadWarning {
    /// A record was skipped because its variable-length tail was unreadable.
    CorruptedRecord {
        /// Absolute offset of the skipped record.
        offset: u32,
        /// Why it could not be read.
        reason: String,
    },
    /// The header record count disagrees with the records recovered.
    RecordCountMismatch {
        /// Count declared by the header.
        expected: u32,
        /// Records actually recovered.
        actual: usize,
    },
    /// The v5 free-record chain loops back on itself.
    FreeListCycle {
        /// Offset that was reached twice.
        offset: u32,
    },
}

impl fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CorruptedRecord { offset, reason } => {
                write!(f, "skipped corrupted record at {offset:#x}: {reason}")
            }
            Self::RecordCountMismatch { expected, actual } => {
                write!(f, "header declares {expected} records but {actual} were read")
            }
            Self::FreeListCycle { offset } => {
                write!(f, "free record chain loops at {offset:#x}")
            }
        }
    }
}

/// An immutable, fully decoded Btrieve file.
#[derive(Debug, Clone)]
pub struct BtrieveFile {
    path: Option<PathBuf>,
    data: Vec<u8>,
    header: Header,
    acs: Option<Arc<AcsTable>>,
    keys: BTreeMap<u16, Key>,
    records: Vec<Record>,
    free_offsets: HashSet<u32>,
    warnings: Vec<LoadWarning>,
}

impl BtrieveFile {
    /// Loads the file at `path`.
    ///
    /// With [`LoadOptions::template_fallback`] a missing file is first
    /// created by copying its template sibling.
    ///
    /// # Errors
    ///
    /// Returns [`BtrieveError::MissingFile`] if neither the file nor a usable
    /// template exists, or any load error from [`BtrieveFile::from_bytes`].
    pub fn open(path: impl AsRef<Path>, options: &LoadOptions) -> BtrieveResult<Self> {
        let path = path.as_ref();

        if options.template_fallback && !path.exists() {
            let template = path.with_extension(&options.template_extension);
            if template.is_file() {
                fs::copy(&template, path)?;
                warn!(
                    path = %path.display(),
                    template = %template.display(),
                    "created file from template for first use"
                );
            }
        }

        let backend = match FileBackend::open(path) {
            Ok(backend) => backend,
            Err(StorageError::NotFound { .. }) => return Err(BtrieveError::missing_file(path)),
            Err(e) => return Err(e.into()),
        };

        let mut file = Self::from_backend(&backend, options)?;
        file.path = Some(path.to_path_buf());
        info!(
            path = %path.display(),
            version = %file.header.version,
            keys = file.keys.len(),
            records = file.records.len(),
            "loaded btrieve file"
        );
        Ok(file)
    }

    /// Loads from any storage backend with a single whole-file read.
    ///
    /// # Errors
    ///
    /// Fails on storage errors or any load error.
    pub fn from_backend<B: StorageBackend + ?Sized>(backend: &B, options: &LoadOptions) -> BtrieveResult<Self> {
        let data = backend.read_all()?;
        Self::from_bytes(data, options)
    }

    /// Decodes a file image.
    ///
    /// # Errors
    ///
    /// Returns [`BtrieveError::InvalidFormat`] for structural problems and
    /// [`BtrieveError::RecordDecode`] for an unreadable record unless
    /// [`LoadOptions::allow_corrupted_records`] is set.
    pub fn from_bytes(data: Vec<u8>, options: &LoadOptions) -> BtrieveResult<Self> {
        let header = Header::parse(&data)?;
        debug!(
            version = %header.version,
            page_length = header.page_length,
            keys = header.key_count,
            records = header.record_count,
            variable = header.variable_length,
            "parsed file control record"
        );

        let page_length = usize::from(header.page_length);
        let mut warnings = Vec::new();
        let mut free_offsets = HashSet::new();

        let acs = match header.version {
            FormatVersion::V6 => {
                let inventory = allocation::enumerate(&data, page_length)?;
                let mut acs = None;
                for page in inventory.acs_pages {
                    if acs.is_some() {
                        return Err(BtrieveError::invalid_format(
                            "multiple alternate collating sequences are not supported",
                        ));
                    }
                    acs = Some(AcsTable::from_v6_page(&data, page_length, page)?);
                }
                acs
            }
            FormatVersion::V5 => {
                let chain = free_list::walk(&data, header.free_list_head)?;
                if let Some(offset) = chain.cycle_at {
                    warnings.push(LoadWarning::FreeListCycle { offset });
                }
                free_offsets = chain.offsets;
                AcsTable::load_v5(&data, page_length)
            }
        }
        .map(Arc::new);

        if let Some(acs) = &acs {
            debug!(name = acs.name(), "loaded alternate collating sequence");
        }

        let keys = definition::load_keys(&data, &header, acs.as_ref())?;

        let records = if header.record_count > 0 {
            loader::load_records(&data, &header, &free_offsets, options, &mut warnings)?
        } else {
            Vec::new()
        };

        Ok(Self {
            path: None,
            data,
            header,
            acs,
            keys,
            records,
            free_offsets,
            warnings,
        })
    }

    /// Path the file was opened from, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// The raw file image.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// The parsed FCR.
    #[must_use]
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Format generation.
    #[must_use]
    pub fn version(&self) -> FormatVersion {
        self.header.version
    }

    /// Page size in bytes.
    #[must_use]
    pub fn page_length(&self) -> u16 {
        self.header.page_length
    }

    /// Number of pages after the first.
    #[must_use]
    pub fn page_count(&self) -> usize {
        self.header.page_count(self.data.len())
    }

    /// Logical record length.
    #[must_use]
    pub fn record_length(&self) -> u16 {
        self.header.record_length
    }

    /// Stored record length.
    #[must_use]
    pub fn physical_record_length(&self) -> u16 {
        self.header.physical_record_length
    }

    /// Number of keys declared by the header.
    #[must_use]
    pub fn key_count(&self) -> u16 {
        self.header.key_count
    }

    /// Number of records declared by the header.
    #[must_use]
    pub fn record_count(&self) -> u32 {
        self.header.record_count
    }

    /// Records carry variable-length tails.
    #[must_use]
    pub fn is_variable_length(&self) -> bool {
        self.header.variable_length
    }

    /// Variable-length tails may be truncated.
    #[must_use]
    pub fn is_variable_truncation(&self) -> bool {
        self.header.variable_truncation
    }

    /// A log key is present.
    #[must_use]
    pub fn log_key_present(&self) -> bool {
        self.header.log_key_present
    }

    /// The file's alternate collating sequence.
    #[must_use]
    pub fn acs(&self) -> Option<&Arc<AcsTable>> {
        self.acs.as_ref()
    }

    /// Keys by number.
    #[must_use]
    pub fn keys(&self) -> &BTreeMap<u16, Key> {
        &self.keys
    }

    /// The key numbered `number`.
    #[must_use]
    pub fn key(&self, number: u16) -> Option<&Key> {
        self.keys.get(&number)
    }

    /// Records in page order.
    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Slot offsets found on the free-record chain.
    #[must_use]
    pub fn free_offsets(&self) -> &HashSet<u32> {
        &self.free_offsets
    }

    /// Non-fatal problems found while loading.
    #[must_use]
    pub fn warnings(&self) -> &[LoadWarning] {
        &self.warnings
    }

    /// Records sorted by `key`, duplicates kept in page order.
    ///
    /// # Errors
    ///
    /// Fails if the key cannot be extracted from some record.
    pub fn records_ordered_by(&self, key: &Key) -> BtrieveResult<Vec<&Record>> {
        let mut keyed: Vec<(KeyValue, &Record)> = self
            .records
            .iter()
            .map(|record| Ok((key.extract(record.data())?, record)))
            .collect::<BtrieveResult<_>>()?;
        keyed.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(keyed.into_iter().map(|(_, record)| record).collect())
    }
}
