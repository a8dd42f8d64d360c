//! Racine du bloqueur de publicités.
//!
//! [`AdBlocker`] détient les quatre singletons du cœur — jeu de règles,
//! drapeau d'activation, compteurs, registre d'observateurs — derrière un
//! `Arc` cloné vers chaque intercepteur de session. Pas de singleton au
//! niveau module : l'instance appartient à la racine applicative.
//!
//! Le fan-out de notifications est un registre subscribe/unsubscribe : la
//! couche IPC du shell s'abonne une fois par fenêtre et se désabonne à sa
//! fermeture, plutôt que de ré-énumérer les fenêtres vivantes à chaque
//! événement.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tracing::{debug, info};

use crate::counters::{BlockCounters, BlockStats, SurfaceId};
use crate::interceptor::{SessionInterceptor, SessionKind};
use crate::rules::RuleSet;
use crate::settings::Settings;

/// Événement poussé vers l'UI à chaque requête bloquée.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdBlockedEvent {
    pub url: String,
    pub surface: SurfaceId,
    pub total_blocked: u64,
}

/// Réponse à la requête de statut de l'UI (et au toggle).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdBlockStatus {
    pub enabled: bool,
    pub total_blocked: u64,
}

/// Handle d'un observateur abonné, à passer à [`AdBlocker::unsubscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObserverId(u64);

type Observer = Arc<dyn Fn(&AdBlockedEvent) + Send + Sync>;

struct Inner {
    rules: RuleSet,
    enabled: AtomicBool,
    counters: BlockCounters,
    observers: Mutex<Vec<(ObserverId, Observer)>>,
    next_observer: AtomicU64,
}

/// Point d'entrée du cœur de filtrage. Clonable (clone d'`Arc`).
#[derive(Clone)]
pub struct AdBlocker {
    inner: Arc<Inner>,
}

impl AdBlocker {
    /// Creates the blocker with the built-in rule table.
    pub fn new(enabled: bool) -> Self {
        Self::with_rules(RuleSet::builtin(), enabled)
    }

    pub fn with_rules(rules: RuleSet, enabled: bool) -> Self {
        info!(rules = rules.len(), enabled, "Ad blocker initialized");
        Self {
            inner: Arc::new(Inner {
                rules,
                enabled: AtomicBool::new(enabled),
                counters: BlockCounters::new(),
                observers: Mutex::new(Vec::new()),
                next_observer: AtomicU64::new(0),
            }),
        }
    }

    /// Creates the blocker from persisted settings (`privacy.adblock_enabled`).
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.privacy.adblock_enabled)
    }

    // ── Activation ─────────────────────────────────────────────────────

    pub fn is_enabled(&self) -> bool {
        self.inner.enabled.load(Ordering::SeqCst)
    }

    /// Inverse le drapeau et retourne le nouveau statut. La bascule est
    /// visible immédiatement par tous les hooks en vol (SeqCst).
    pub fn toggle(&self) -> AdBlockStatus {
        let was = self.inner.enabled.fetch_xor(true, Ordering::SeqCst);
        let status = AdBlockStatus {
            enabled: !was,
            total_blocked: self.inner.counters.total(),
        };
        info!(enabled = status.enabled, "Ad blocker toggled");
        status
    }

    pub fn status(&self) -> AdBlockStatus {
        AdBlockStatus {
            enabled: self.is_enabled(),
            total_blocked: self.inner.counters.total(),
        }
    }

    // ── Compteurs ──────────────────────────────────────────────────────

    pub fn total_blocked(&self) -> u64 {
        self.inner.counters.total()
    }

    pub fn stats(&self) -> BlockStats {
        self.inner.counters.snapshot()
    }

    /// Remise à zéro du badge d'une surface (navigation / fermeture d'onglet).
    pub fn reset_surface(&self, surface: SurfaceId) {
        self.inner.counters.reset_surface(surface);
    }

    // ── Fan-out ────────────────────────────────────────────────────────

    /// Abonne un observateur aux événements de blocage.
    pub fn subscribe(&self, observer: impl Fn(&AdBlockedEvent) + Send + Sync + 'static) -> ObserverId {
        let id = ObserverId(self.inner.next_observer.fetch_add(1, Ordering::Relaxed));
        self.inner
            .observers
            .lock()
            .unwrap()
            .push((id, Arc::new(observer)));
        id
    }

    /// Désabonne. Un id inconnu (surface déjà fermée) est ignoré sans erreur.
    pub fn unsubscribe(&self, id: ObserverId) {
        self.inner
            .observers
            .lock()
            .unwrap()
            .retain(|(oid, _)| *oid != id);
    }

    // ── Sessions ───────────────────────────────────────────────────────

    /// Fabrique l'intercepteur d'une session (une instance par session,
    /// créée à la création de la session).
    pub fn attach(&self, session: SessionKind) -> SessionInterceptor {
        debug!(session = session.as_str(), "Interceptor attached");
        SessionInterceptor::new(self.clone(), session)
    }

    // ── Interne (appelé par l'intercepteur) ────────────────────────────

    pub(crate) fn rules(&self) -> &RuleSet {
        &self.inner.rules
    }

    /// Incrémente les compteurs et notifie tous les observateurs vivants.
    pub(crate) fn record_blocked(&self, url: &str, surface: SurfaceId) {
        let total = self.inner.counters.increment(surface);
        let event = AdBlockedEvent {
            url: url.to_owned(),
            surface,
            total_blocked: total,
        };
        // Copie de la liste hors du verrou : un observateur peut se
        // désabonner (ou basculer le drapeau) depuis son callback sans
        // deadlock.
        let observers: Vec<Observer> = self
            .inner
            .observers
            .lock()
            .unwrap()
            .iter()
            .map(|(_, o)| Arc::clone(o))
            .collect();
        for observer in observers {
            observer(&event);
        }
    }
}
