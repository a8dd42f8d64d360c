//! # Aegis Core — cœur main-process du navigateur
//!
//! Bibliothèque embarquée par le shell Aegis (chrome de fenêtre, IPC,
//! rendu de panneaux — tous externes). Deux sous-systèmes :
//!
//! ## Filtrage réseau
//!
//! - [`rules`] : Classification pure (URL, type de ressource) → blocage,
//!   sur une table de règles curatée à la compilation.
//!
//! - [`interceptor`] : Les trois hooks branchés sur le pipeline réseau de
//!   chaque session (pre-request, pre-send-headers, headers-received) —
//!   annulation des requêtes bloquées, spoof anti-hotlink des en-têtes
//!   sortants, strip CORP/COEP des réponses.
//!
//! - [`counters`] : Total bloqué process-wide + compteur par surface
//!   (badge d'onglet). En mémoire seulement.
//!
//! - [`adblock`] : La racine [`adblock::AdBlocker`] — drapeau on/off,
//!   fan-out d'événements vers l'UI, fabrique d'intercepteurs par session.
//!
//! ## Stores de profil
//!
//! - [`settings`] : Settings TOML, fusion fichier-partiel-sur-défauts.
//! - [`history`] / [`bookmarks`] / [`downloads`] : Stores JSON plats,
//!   nouveau-en-premier, plafonnés.
//! - [`suggestions`] : Fusion favoris + historique pour la barre d'adresse.
//! - [`profile`] : Résolution du dossier de profil.
//!
//! ## Câblage typique
//!
//! ```no_run
//! use aegis_core::adblock::AdBlocker;
//! use aegis_core::interceptor::SessionKind;
//! use aegis_core::settings::Settings;
//!
//! aegis_core::logging::init();
//! let settings = Settings::load();
//! let blocker = AdBlocker::from_settings(&settings);
//! let persistent = blocker.attach(SessionKind::Persistent);
//! let incognito = blocker.attach(SessionKind::Incognito);
//! // → brancher les hooks de `persistent`/`incognito` sur le moteur.
//! ```

pub mod adblock;
pub mod bookmarks;
pub mod counters;
pub mod downloads;
pub mod history;
pub mod interceptor;
pub mod logging;
pub mod profile;
pub mod rules;
pub mod settings;
mod storage;
pub mod suggestions;
