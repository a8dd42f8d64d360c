//! Suggestions unifiées de la barre d'adresse.
//!
//! Fusionne les favoris (prioritaires) puis l'historique, dédupliqués par
//! URL, et termine toujours par une entrée "rechercher sur le web". Huit
//! entrées au maximum, recherche comprise.

use std::collections::HashSet;

use crate::bookmarks::BookmarkStore;
use crate::history::HistoryStore;

const MAX_SUGGESTIONS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuggestionKind {
    Bookmark,
    History,
    /// Déléguer la requête au moteur de recherche ; `url` est vide.
    Search,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub kind: SuggestionKind,
    pub url: String,
    pub title: String,
    pub favicon: String,
}

/// Construit la liste de suggestions pour une saisie. Requête vide → liste
/// vide.
pub fn build(query: &str, bookmarks: &BookmarkStore, history: &HistoryStore) -> Vec<Suggestion> {
    if query.is_empty() {
        return Vec::new();
    }
    let needle = query.to_lowercase();
    let mut suggestions = Vec::new();
    let mut seen = HashSet::new();

    for b in bookmarks.all() {
        if suggestions.len() >= MAX_SUGGESTIONS - 1 {
            break;
        }
        if (b.url.to_lowercase().contains(&needle) || b.title.to_lowercase().contains(&needle))
            && seen.insert(b.url.clone())
        {
            suggestions.push(Suggestion {
                kind: SuggestionKind::Bookmark,
                url: b.url.clone(),
                title: b.title.clone(),
                favicon: b.favicon.clone(),
            });
        }
    }

    for e in history.all() {
        if suggestions.len() >= MAX_SUGGESTIONS - 1 {
            break;
        }
        if (e.url.to_lowercase().contains(&needle) || e.title.to_lowercase().contains(&needle))
            && seen.insert(e.url.clone())
        {
            suggestions.push(Suggestion {
                kind: SuggestionKind::History,
                url: e.url.clone(),
                title: e.title.clone(),
                favicon: e.favicon.clone(),
            });
        }
    }

    suggestions.push(Suggestion {
        kind: SuggestionKind::Search,
        url: String::new(),
        title: format!("Search for \"{query}\""),
        favicon: String::new(),
    });
    suggestions
}
