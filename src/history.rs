//! Historique de navigation, nouveau-en-premier, plafonné à 1000 entrées.
//!
//! Persisté en JSON dans le profil (`history.json`). Chaque mutation écrit
//! immédiatement ; l'état en mémoire reste la référence si l'écriture échoue.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::profile;
use crate::storage;

const HISTORY_FILE: &str = "history.json";
const MAX_ENTRIES: usize = 1000;

/// Une visite enregistrée.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: i64,
    pub url: String,
    pub title: String,
    #[serde(default)]
    pub favicon: String,
    pub visited_at: DateTime<Utc>,
}

/// Fenêtre temporelle pour l'effacement : retire les entrées plus
/// **récentes** que la borne.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearRange {
    LastHour,
    LastDay,
    LastWeek,
    LastFourWeeks,
    All,
}

impl ClearRange {
    /// Borne inférieure de la fenêtre ; `None` = tout effacer.
    fn cutoff(self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            ClearRange::LastHour => Some(now - Duration::hours(1)),
            ClearRange::LastDay => Some(now - Duration::days(1)),
            ClearRange::LastWeek => Some(now - Duration::weeks(1)),
            ClearRange::LastFourWeeks => Some(now - Duration::weeks(4)),
            ClearRange::All => None,
        }
    }
}

/// Store d'historique. Une instance par process, détenue par la racine
/// applicative.
pub struct HistoryStore {
    path: PathBuf,
    entries: Vec<HistoryEntry>,
}

impl HistoryStore {
    /// Ouvre le store du profil.
    pub fn open_in_profile() -> Self {
        Self::open(profile::file(HISTORY_FILE))
    }

    /// Ouvre le store sur un chemin explicite. Fichier absent ou invalide =
    /// store vide.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let entries: Vec<HistoryEntry> = storage::load_json(&path);
        info!(path = %path.display(), entries = entries.len(), "History store opened");
        Self { path, entries }
    }

    /// Enregistre une visite en tête de liste. Titre vide → l'URL fait
    /// office de titre.
    pub fn add(&mut self, url: &str, title: &str, favicon: &str) -> &HistoryEntry {
        let entry = HistoryEntry {
            id: storage::next_id(),
            url: url.to_owned(),
            title: if title.is_empty() { url } else { title }.to_owned(),
            favicon: favicon.to_owned(),
            visited_at: Utc::now(),
        };
        self.entries.insert(0, entry);
        self.entries.truncate(MAX_ENTRIES);
        self.persist();
        &self.entries[0]
    }

    /// Toutes les entrées, les plus récentes d'abord.
    pub fn all(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// Supprime l'entrée portant cet id.
    pub fn delete(&mut self, id: i64) {
        self.entries.retain(|e| e.id != id);
        self.persist();
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.persist();
    }

    /// Efface les entrées visitées plus récemment que la fenêtre donnée
    /// (la sémantique "effacer la dernière heure" des navigateurs).
    pub fn clear_range(&mut self, range: ClearRange) {
        match range.cutoff(Utc::now()) {
            Some(cutoff) => self.entries.retain(|e| e.visited_at < cutoff),
            None => self.entries.clear(),
        }
        self.persist();
    }

    /// Recherche en sous-chaîne, insensible à la casse, sur l'URL et le
    /// titre.
    pub fn search(&self, query: &str) -> Vec<&HistoryEntry> {
        let query = query.to_lowercase();
        self.entries
            .iter()
            .filter(|e| {
                e.url.to_lowercase().contains(&query) || e.title.to_lowercase().contains(&query)
            })
            .collect()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) {
        storage::save_json(&self.path, &self.entries);
    }
}
