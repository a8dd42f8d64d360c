//! Favoris, nouveau-en-premier, dédupliqués par URL.
//!
//! Persistés en JSON dans le profil (`bookmarks.json`).

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::profile;
use crate::storage;

const BOOKMARKS_FILE: &str = "bookmarks.json";

/// Un favori.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    pub id: i64,
    pub url: String,
    pub title: String,
    #[serde(default)]
    pub favicon: String,
    pub created_at: DateTime<Utc>,
}

/// Résultat d'un ajout : l'URL était peut-être déjà enregistrée.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    AlreadyBookmarked,
}

/// Store de favoris.
pub struct BookmarkStore {
    path: PathBuf,
    bookmarks: Vec<Bookmark>,
}

impl BookmarkStore {
    pub fn open_in_profile() -> Self {
        Self::open(profile::file(BOOKMARKS_FILE))
    }

    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let bookmarks: Vec<Bookmark> = storage::load_json(&path);
        info!(path = %path.display(), bookmarks = bookmarks.len(), "Bookmark store opened");
        Self { path, bookmarks }
    }

    /// Ajoute en tête de liste, sauf si l'URL est déjà enregistrée.
    pub fn add(&mut self, url: &str, title: &str, favicon: &str) -> AddOutcome {
        if self.contains(url) {
            return AddOutcome::AlreadyBookmarked;
        }
        self.bookmarks.insert(
            0,
            Bookmark {
                id: storage::next_id(),
                url: url.to_owned(),
                title: if title.is_empty() { url } else { title }.to_owned(),
                favicon: favicon.to_owned(),
                created_at: Utc::now(),
            },
        );
        self.persist();
        AddOutcome::Added
    }

    /// Retire le favori portant cette URL (l'action "étoile" de la barre
    /// d'adresse).
    pub fn remove_by_url(&mut self, url: &str) {
        self.bookmarks.retain(|b| b.url != url);
        self.persist();
    }

    /// Supprime par id (l'action du panneau de favoris).
    pub fn delete(&mut self, id: i64) {
        self.bookmarks.retain(|b| b.id != id);
        self.persist();
    }

    pub fn contains(&self, url: &str) -> bool {
        self.bookmarks.iter().any(|b| b.url == url)
    }

    /// Tous les favoris, les plus récents d'abord.
    pub fn all(&self) -> &[Bookmark] {
        &self.bookmarks
    }

    fn persist(&self) {
        storage::save_json(&self.path, &self.bookmarks);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, BookmarkStore) {
        let dir = tempfile::tempdir().unwrap();
        let s = BookmarkStore::open(dir.path().join("bookmarks.json"));
        (dir, s)
    }

    #[test]
    fn test_add_and_contains() {
        let (_d, mut s) = store();
        assert_eq!(s.add("https://a.example/", "A", ""), AddOutcome::Added);
        assert!(s.contains("https://a.example/"));
        assert!(!s.contains("https://b.example/"));
    }

    #[test]
    fn test_duplicate_url_reports_already_bookmarked() {
        let (_d, mut s) = store();
        s.add("https://a.example/", "A", "");
        assert_eq!(
            s.add("https://a.example/", "A again", ""),
            AddOutcome::AlreadyBookmarked
        );
        assert_eq!(s.all().len(), 1);
        assert_eq!(s.all()[0].title, "A");
    }

    #[test]
    fn test_newest_first() {
        let (_d, mut s) = store();
        s.add("https://a.example/", "A", "");
        s.add("https://b.example/", "B", "");
        assert_eq!(s.all()[0].url, "https://b.example/");
    }

    #[test]
    fn test_remove_by_url() {
        let (_d, mut s) = store();
        s.add("https://a.example/", "A", "");
        s.remove_by_url("https://a.example/");
        assert!(!s.contains("https://a.example/"));
        assert!(s.all().is_empty());
    }

    #[test]
    fn test_delete_by_id() {
        let (_d, mut s) = store();
        s.add("https://a.example/", "A", "");
        let id = s.all()[0].id;
        s.delete(id);
        assert!(s.all().is_empty());
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bookmarks.json");
        {
            let mut s = BookmarkStore::open(&path);
            s.add("https://a.example/", "A", "icon.png");
        }
        let s = BookmarkStore::open(&path);
        assert_eq!(s.all().len(), 1);
        assert_eq!(s.all()[0].favicon, "icon.png");
    }
}
