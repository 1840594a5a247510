//! JSONL journal reader - sequential reader for replay

use crate::error::JournalError;
use engex_ledger::CreditTransaction;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Sequential journal reader for startup replay
pub struct JournalReader {
    files: Vec<std::path::PathBuf>,
}

impl JournalReader {
    /// Create a new reader from a directory
    pub fn from_directory(path: impl AsRef<Path>) -> Result<Self, JournalError> {
        let path = path.as_ref();
        let mut files = Vec::new();

        if path.exists() {
            for entry in std::fs::read_dir(path)? {
                let entry = entry?;
                let file_path = entry.path();
                if file_path.extension().map_or(false, |ext| ext == "jsonl") {
                    files.push(file_path);
                }
            }
        }

        files.sort();

        Ok(Self { files })
    }

    /// Read all records from all files in append order
    pub fn read_all(&self) -> Result<Vec<CreditTransaction>, JournalError> {
        let mut records = Vec::new();

        for file_path in &self.files {
            let file = File::open(file_path)?;
            let reader = BufReader::new(file);

            for line in reader.lines() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                let tx: CreditTransaction = serde_json::from_str(&line)?;
                records.push(tx);
            }
        }

        Ok(records)
    }

    /// Count total records across all files
    pub fn count(&self) -> Result<usize, JournalError> {
        let mut count = 0;

        for file_path in &self.files {
            let file = File::open(file_path)?;
            let reader = BufReader::new(file);

            for line in reader.lines() {
                let line = line?;
                if !line.trim().is_empty() {
                    count += 1;
                }
            }
        }

        Ok(count)
    }
}
