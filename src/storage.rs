//! Plomberie commune des stores de profil JSON plat.
//!
//! Même posture que le chargement de settings : un fichier absent donne un
//! store vide, un fichier illisible ou invalide logue un warning et donne un
//! store vide. Les échecs d'écriture sont logués, l'état en mémoire reste
//! la référence.

use std::fs;
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;

/// Charge une liste d'entrées depuis `path`. Jamais d'erreur, jamais de
/// panique.
pub(crate) fn load_json<T: DeserializeOwned>(path: &Path) -> Vec<T> {
    if !path.is_file() {
        return Vec::new();
    }
    match fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str(&content) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Invalid store file, starting empty");
                Vec::new()
            }
        },
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Cannot read store file, starting empty");
            Vec::new()
        }
    }
}

/// Écrit la liste complète sur disque. Un échec est logué, pas propagé.
pub(crate) fn save_json<T: Serialize>(path: &Path, entries: &[T]) {
    let write = || -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(entries).map_err(std::io::Error::other)?;
        fs::write(path, content)
    };
    if let Err(e) = write() {
        warn!(path = %path.display(), error = %e, "Cannot persist store file");
    }
}

/// Id d'entrée de store : epoch millisecondes, comme l'application d'origine.
pub(crate) fn next_id() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
