//! Historique des téléchargements, plafonné à 100 enregistrements.
//!
//! Le shell pilote les téléchargements actifs lui-même ; ce store ne reçoit
//! que leurs états successifs, upsertés par id — l'enregistrement "en cours"
//! est remplacé par son état final quand le moteur signale la fin.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::profile;
use crate::storage;

const DOWNLOADS_FILE: &str = "downloads.json";
const MAX_RECORDS: usize = 100;

/// État d'un téléchargement tel que rapporté par le moteur.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadState {
    Progressing,
    Completed,
    Cancelled,
    Interrupted,
}

/// Un téléchargement enregistré.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadRecord {
    pub id: i64,
    pub filename: String,
    pub url: String,
    pub save_path: String,
    pub total_bytes: u64,
    pub received_bytes: u64,
    pub state: DownloadState,
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
}

/// Store des téléchargements terminés (ou en cours, en attente d'upsert
/// final).
pub struct DownloadStore {
    path: PathBuf,
    records: Vec<DownloadRecord>,
}

impl DownloadStore {
    pub fn open_in_profile() -> Self {
        Self::open(profile::file(DOWNLOADS_FILE))
    }

    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let records: Vec<DownloadRecord> = storage::load_json(&path);
        info!(path = %path.display(), records = records.len(), "Download store opened");
        Self { path, records }
    }

    /// Upsert par id : remplace l'enregistrement existant, sinon insère en
    /// tête.
    pub fn record(&mut self, record: DownloadRecord) {
        match self.records.iter_mut().find(|r| r.id == record.id) {
            Some(existing) => *existing = record,
            None => {
                self.records.insert(0, record);
                self.records.truncate(MAX_RECORDS);
            }
        }
        self.persist();
    }

    /// Tous les enregistrements, les plus récents d'abord.
    pub fn all(&self) -> &[DownloadRecord] {
        &self.records
    }

    pub fn delete(&mut self, id: i64) {
        self.records.retain(|r| r.id != id);
        self.persist();
    }

    pub fn clear(&mut self) {
        self.records.clear();
        self.persist();
    }

    fn persist(&self) {
        storage::save_json(&self.path, &self.records);
    }
}
