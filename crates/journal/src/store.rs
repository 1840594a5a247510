//! JSONL journal writer - append-only

use crate::error::JournalError;
use chrono::Utc;
use engex_ledger::CreditTransaction;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Append-only JSONL store for committed credit transactions.
///
/// Files rotate per UTC date (`YYYY-MM-DD.jsonl`). The journal is the
/// durable record; in-memory projections are rebuilt from it on startup.
pub struct JournalStore {
    base_path: PathBuf,
    current_file: Option<BufWriter<File>>,
    current_date: Option<String>,
}

impl JournalStore {
    /// Create a new journal store at the given path
    pub fn new(base_path: impl AsRef<Path>) -> Result<Self, JournalError> {
        let base_path = base_path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path)?;

        Ok(Self {
            base_path,
            current_file: None,
            current_date: None,
        })
    }

    /// Append a committed transaction to the journal
    pub fn append(&mut self, tx: &CreditTransaction) -> Result<(), JournalError> {
        let date = tx.created_at.format("%Y-%m-%d").to_string();

        // Rotate file if date changed
        if self.current_date.as_ref() != Some(&date) {
            self.rotate_file(&date)?;
        }

        if let Some(ref mut writer) = self.current_file {
            let json = serde_json::to_string(tx)?;
            writeln!(writer, "{}", json)?;
            writer.flush()?;
        }

        debug!(user = %tx.user_id, sequence = tx.sequence, "journaled transaction");
        Ok(())
    }

    /// Rotate to a new file for the given date
    fn rotate_file(&mut self, date: &str) -> Result<(), JournalError> {
        if let Some(ref mut writer) = self.current_file {
            writer.flush()?;
        }

        let file_path = self.base_path.join(format!("{}.jsonl", date));
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&file_path)?;

        self.current_file = Some(BufWriter::new(file));
        self.current_date = Some(date.to_string());

        Ok(())
    }

    /// Get the path to today's file
    pub fn today_file_path(&self) -> PathBuf {
        let date = Utc::now().format("%Y-%m-%d").to_string();
        self.base_path.join(format!("{}.jsonl", date))
    }

    /// List all JSONL files in the journal
    pub fn list_files(&self) -> Result<Vec<PathBuf>, JournalError> {
        let mut files = Vec::new();

        for entry in fs::read_dir(&self.base_path)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().map_or(false, |ext| ext == "jsonl") {
                files.push(path);
            }
        }

        files.sort();
        Ok(files)
    }

    /// Flush and close the current file
    pub fn close(&mut self) -> Result<(), JournalError> {
        if let Some(ref mut writer) = self.current_file {
            writer.flush()?;
        }
        self.current_file = None;
        self.current_date = None;
        Ok(())
    }
}

impl Drop for JournalStore {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::JournalReader;
    use engex_core::{Credits, UserId};
    use engex_ledger::{CreditLedger, TransactionKind};

    #[test]
    fn test_append_and_list() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JournalStore::new(dir.path()).unwrap();

        let ledger = CreditLedger::new();
        let alice = UserId::new("alice").unwrap();
        let tx = ledger
            .apply_transaction(&alice, Credits::new(10), TransactionKind::Bonus, "b", None)
            .unwrap();

        store.append(&tx).unwrap();
        store.close().unwrap();

        let files = store.list_files().unwrap();
        assert_eq!(files.len(), 1);

        let reader = JournalReader::from_directory(dir.path()).unwrap();
        let records = reader.read_all().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0], tx);
    }
}
