//! Compteurs de requêtes bloquées.
//!
//! Un total process-wide plus un compteur par surface de contenu (webview).
//! Les hooks réseau du moteur arrivent depuis ses threads IO, donc tout est
//! `Send + Sync` : atomique pour le total, mutex pour la map par surface.
//! Volontairement non persistant — des statistiques de session, pas un
//! journal d'audit.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identifiant opaque d'une surface de contenu (l'id de webview du moteur).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId(pub u64);

impl std::fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Instantané des compteurs, pour la requête de stats de l'UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockStats {
    pub total: u64,
    pub per_surface: HashMap<SurfaceId, u64>,
}

/// État mutable des compteurs. Une instance par process, détenue par la
/// racine applicative et partagée par référence.
#[derive(Debug, Default)]
pub struct BlockCounters {
    total: AtomicU64,
    per_surface: Mutex<HashMap<SurfaceId, u64>>,
}

impl BlockCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enregistre un blocage pour `surface` et retourne le nouveau total.
    pub fn increment(&self, surface: SurfaceId) -> u64 {
        let new_total = self.total.fetch_add(1, Ordering::SeqCst) + 1;
        let mut map = self.per_surface.lock().unwrap();
        *map.entry(surface).or_insert(0) += 1;
        new_total
    }

    pub fn total(&self) -> u64 {
        self.total.load(Ordering::SeqCst)
    }

    pub fn surface_count(&self, surface: SurfaceId) -> u64 {
        self.per_surface
            .lock()
            .unwrap()
            .get(&surface)
            .copied()
            .unwrap_or(0)
    }

    /// Remet à zéro le compteur d'une surface (navigation ou fermeture
    /// d'onglet). Le total n'est pas affecté.
    pub fn reset_surface(&self, surface: SurfaceId) {
        self.per_surface.lock().unwrap().insert(surface, 0);
    }

    pub fn snapshot(&self) -> BlockStats {
        BlockStats {
            total: self.total(),
            per_surface: self.per_surface.lock().unwrap().clone(),
        }
    }
}
