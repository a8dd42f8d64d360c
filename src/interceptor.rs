//! Intercepteur de requêtes par session.
//!
//! Une instance par session de navigation (persistante ou incognito),
//! fabriquée par [`AdBlocker::attach`]. La glue moteur du shell branche les
//! trois hooks sur le pipeline réseau de sa session :
//!
//! 1. `on_before_request` — classification ; annule la requête si bloquée.
//! 2. `on_before_send_headers` — spoof Referer/Origin/Sec-Fetch pour les
//!    ressources embarquées (contourne les protections anti-hotlink).
//! 3. `on_headers_received` — retire CORP/COEP de la réponse pour que le
//!    moteur accepte les ressources cross-origin.
//!
//! Les étapes 2 et 3 s'appliquent à toute requête autorisée, **même bloqueur
//! désactivé** : la compatibilité d'embedding est une fonctionnalité
//! indépendante de l'ad-blocking.
//!
//! Chaque hook est enveloppé dans `catch_unwind` : un hook qui panique sans
//! résoudre la requête la laisserait pendue indéfiniment dans le moteur, donc
//! on retombe toujours sur le résultat pass-through.

use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};

use tracing::debug;
use url::Url;

use crate::adblock::AdBlocker;
use crate::counters::SurfaceId;
use crate::rules::ResourceType;

/// Partition de session à laquelle l'intercepteur est lié. Comportement
/// identique des deux côtés ; l'identité ne sert qu'aux logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionKind {
    Persistent,
    Incognito,
}

impl SessionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionKind::Persistent => "persistent",
            SessionKind::Incognito => "incognito",
        }
    }
}

/// Requête sortante telle que décrite par le moteur.
#[derive(Debug, Clone)]
pub struct WebRequest {
    pub url: String,
    pub resource_type: ResourceType,
    /// Surface (webview) à l'origine de la requête.
    pub surface: SurfaceId,
}

/// Verdict du hook pre-request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestDecision {
    Allow,
    /// Terminal : aucune activité réseau, aucune réponse livrée.
    Cancel,
}

impl RequestDecision {
    pub fn is_cancel(self) -> bool {
        self == RequestDecision::Cancel
    }
}

/// Types de ressources dont les en-têtes sortants sont spoofés.
fn spoofs_headers(rt: ResourceType) -> bool {
    matches!(
        rt,
        ResourceType::Image | ResourceType::Stylesheet | ResourceType::Font | ResourceType::Media
    )
}

/// Hooks réseau d'une session. Cheap à cloner (clone d'`Arc` interne).
#[derive(Clone)]
pub struct SessionInterceptor {
    blocker: AdBlocker,
    session: SessionKind,
}

impl SessionInterceptor {
    pub(crate) fn new(blocker: AdBlocker, session: SessionKind) -> Self {
        Self { blocker, session }
    }

    pub fn session(&self) -> SessionKind {
        self.session
    }

    /// Étape 1 : classification. Bloqueur désactivé → toujours `Allow` sans
    /// consulter les règles. Sur blocage : compteurs incrémentés, fan-out
    /// notifié, requête annulée.
    pub fn on_before_request(&self, request: &WebRequest) -> RequestDecision {
        catch_unwind(AssertUnwindSafe(|| self.classify(request)))
            .unwrap_or(RequestDecision::Allow)
    }

    fn classify(&self, request: &WebRequest) -> RequestDecision {
        if !self.blocker.is_enabled() {
            return RequestDecision::Allow;
        }
        let decision = self
            .blocker
            .rules()
            .classify(&request.url, request.resource_type);
        if !decision.matched {
            return RequestDecision::Allow;
        }
        if let Some(id) = decision.rule {
            debug!(
                url = %request.url,
                surface = %request.surface,
                rule = %self.blocker.rules().rule(id).pattern,
                session = self.session.as_str(),
                "Request blocked"
            );
        }
        self.blocker.record_blocked(&request.url, request.surface);
        RequestDecision::Cancel
    }

    /// Étape 2 : en-têtes sortants. Pour image/stylesheet/font/media, aligne
    /// Referer et Origin sur l'origine de la ressource elle-même et pose des
    /// en-têtes Sec-Fetch same-origin/no-cors. Les autres types passent tels
    /// quels. URL imparsable → en-têtes d'origine inchangés.
    pub fn on_before_send_headers(
        &self,
        request: &WebRequest,
        headers: HashMap<String, String>,
    ) -> HashMap<String, String> {
        let original = headers.clone();
        catch_unwind(AssertUnwindSafe(|| spoof_request_headers(request, headers)))
            .unwrap_or(original)
    }

    /// Étape 3 : en-têtes de réponse. Retire Cross-Origin-Resource-Policy et
    /// Cross-Origin-Embedder-Policy quelle que soit la casse, pour toute
    /// requête autorisée.
    pub fn on_headers_received(
        &self,
        headers: HashMap<String, Vec<String>>,
    ) -> HashMap<String, Vec<String>> {
        let original = headers.clone();
        catch_unwind(AssertUnwindSafe(|| strip_response_headers(headers))).unwrap_or(original)
    }
}

fn spoof_request_headers(
    request: &WebRequest,
    mut headers: HashMap<String, String>,
) -> HashMap<String, String> {
    if !spoofs_headers(request.resource_type) {
        return headers;
    }
    let Ok(url) = Url::parse(&request.url) else {
        return headers;
    };
    let origin = url.origin();
    if !origin.is_tuple() {
        // Origine opaque (data:, blob:…) — rien à spoofer.
        return headers;
    }
    let origin = origin.ascii_serialization();

    headers.insert("Referer".to_owned(), format!("{origin}/"));
    headers.insert("Origin".to_owned(), origin);
    headers.insert("Sec-Fetch-Site".to_owned(), "same-origin".to_owned());
    headers.insert("Sec-Fetch-Mode".to_owned(), "no-cors".to_owned());
    headers.insert(
        "Sec-Fetch-Dest".to_owned(),
        request.resource_type.as_str().to_owned(),
    );
    headers
}

fn strip_response_headers(
    mut headers: HashMap<String, Vec<String>>,
) -> HashMap<String, Vec<String>> {
    headers.retain(|name, _| {
        !name.eq_ignore_ascii_case("cross-origin-resource-policy")
            && !name.eq_ignore_ascii_case("cross-origin-embedder-policy")
    });
    headers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{FilterRule, RuleSet};

    const TEST_RULES: &[FilterRule] = &[
        FilterRule::domain("ads.example.net"),
        FilterRule::substring("/tracking/"),
    ];

    fn interceptor(enabled: bool) -> (AdBlocker, SessionInterceptor) {
        let blocker = AdBlocker::with_rules(RuleSet::from_static(TEST_RULES), enabled);
        let i = blocker.attach(SessionKind::Persistent);
        (blocker, i)
    }

    fn req(url: &str, rt: ResourceType) -> WebRequest {
        WebRequest {
            url: url.to_owned(),
            resource_type: rt,
            surface: SurfaceId(1),
        }
    }

    #[test]
    fn test_blocked_request_cancelled_and_counted() {
        let (blocker, i) = interceptor(true);
        let d = i.on_before_request(&req("https://ads.example.net/banner.js", ResourceType::Script));
        assert_eq!(d, RequestDecision::Cancel);
        assert_eq!(blocker.total_blocked(), 1);
        assert_eq!(blocker.stats().per_surface.get(&SurfaceId(1)), Some(&1));
    }

    #[test]
    fn test_allowed_request_not_counted() {
        let (blocker, i) = interceptor(true);
        let d = i.on_before_request(&req("https://cdn.example.com/logo.png", ResourceType::Image));
        assert_eq!(d, RequestDecision::Allow);
        assert_eq!(blocker.total_blocked(), 0);
    }

    #[test]
    fn test_disabled_flag_bypasses_classification() {
        let (blocker, i) = interceptor(true);
        blocker.toggle(); // enabled → disabled
        let d = i.on_before_request(&req("https://ads.example.net/banner.js", ResourceType::Script));
        assert_eq!(d, RequestDecision::Allow);
        assert_eq!(blocker.total_blocked(), 0);

        blocker.toggle(); // re-enabled, same interceptor sees it immediately
        let d = i.on_before_request(&req("https://ads.example.net/banner.js", ResourceType::Script));
        assert_eq!(d, RequestDecision::Cancel);
    }

    #[test]
    fn test_total_equals_number_of_cancels() {
        let (blocker, i) = interceptor(true);
        let urls = [
            ("https://ads.example.net/a.js", ResourceType::Script),
            ("https://ok.example.com/b.js", ResourceType::Script),
            ("https://site.com/tracking/pixel", ResourceType::Image),
            ("https://ok.example.com/c.css", ResourceType::Stylesheet),
        ];
        let mut cancels = 0;
        for (url, rt) in urls {
            if i.on_before_request(&req(url, rt)).is_cancel() {
                cancels += 1;
            }
        }
        assert_eq!(cancels, 2);
        assert_eq!(blocker.total_blocked(), cancels);
    }

    #[test]
    fn test_block_notifies_observers() {
        let (blocker, i) = interceptor(true);
        let seen = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let seen2 = std::sync::Arc::clone(&seen);
        blocker.subscribe(move |e| seen2.lock().unwrap().push(e.clone()));

        i.on_before_request(&req("https://ads.example.net/x", ResourceType::Other));
        let events = seen.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].total_blocked, 1);
    }

    #[test]
    fn test_image_headers_spoofed_to_own_origin() {
        let (_b, i) = interceptor(true);
        let mut headers = HashMap::new();
        headers.insert("Referer".to_owned(), "https://evil.example/page".to_owned());
        headers.insert("Origin".to_owned(), "https://evil.example".to_owned());
        headers.insert("Sec-Fetch-Site".to_owned(), "cross-site".to_owned());

        let out = i.on_before_send_headers(
            &req("https://cdn.example.com/logo.png", ResourceType::Image),
            headers,
        );
        assert_eq!(out.get("Referer").unwrap(), "https://cdn.example.com/");
        assert_eq!(out.get("Origin").unwrap(), "https://cdn.example.com");
        assert_eq!(out.get("Sec-Fetch-Site").unwrap(), "same-origin");
        assert_eq!(out.get("Sec-Fetch-Mode").unwrap(), "no-cors");
        assert_eq!(out.get("Sec-Fetch-Dest").unwrap(), "image");
    }

    #[test]
    fn test_spoof_is_idempotent() {
        let (_b, i) = interceptor(true);
        let r = req("https://cdn.example.com/f.woff2", ResourceType::Font);
        let once = i.on_before_send_headers(&r, HashMap::new());
        let twice = i.on_before_send_headers(&r, once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_script_headers_pass_through() {
        let (_b, i) = interceptor(true);
        let mut headers = HashMap::new();
        headers.insert("Referer".to_owned(), "https://page.example/".to_owned());
        let out = i.on_before_send_headers(
            &req("https://cdn.example.com/lib.js", ResourceType::Script),
            headers.clone(),
        );
        assert_eq!(out, headers);
    }

    #[test]
    fn test_malformed_url_leaves_headers_unchanged() {
        let (_b, i) = interceptor(true);
        let mut headers = HashMap::new();
        headers.insert("Referer".to_owned(), "https://page.example/".to_owned());
        let out = i.on_before_send_headers(&req("not a url", ResourceType::Image), headers.clone());
        assert_eq!(out, headers);
    }

    #[test]
    fn test_spoof_applies_even_when_disabled() {
        let (_b, i) = interceptor(false);
        let out = i.on_before_send_headers(
            &req("https://cdn.example.com/bg.css", ResourceType::Stylesheet),
            HashMap::new(),
        );
        assert_eq!(out.get("Sec-Fetch-Site").unwrap(), "same-origin");
    }

    #[test]
    fn test_response_stripping_both_case_variants() {
        let (_b, i) = interceptor(true);
        let mut headers = HashMap::new();
        headers.insert(
            "Cross-Origin-Resource-Policy".to_owned(),
            vec!["same-origin".to_owned()],
        );
        headers.insert(
            "cross-origin-resource-policy".to_owned(),
            vec!["same-site".to_owned()],
        );
        headers.insert(
            "Cross-Origin-Embedder-Policy".to_owned(),
            vec!["require-corp".to_owned()],
        );
        headers.insert(
            "cross-origin-embedder-policy".to_owned(),
            vec!["require-corp".to_owned()],
        );
        headers.insert("Content-Type".to_owned(), vec!["image/png".to_owned()]);

        let out = i.on_headers_received(headers);
        assert_eq!(out.len(), 1);
        assert!(out.contains_key("Content-Type"));
    }

    #[test]
    fn test_stripping_applies_even_when_disabled() {
        let (_b, i) = interceptor(false);
        let mut headers = HashMap::new();
        headers.insert(
            "CROSS-ORIGIN-RESOURCE-POLICY".to_owned(),
            vec!["same-origin".to_owned()],
        );
        let out = i.on_headers_received(headers);
        assert!(out.is_empty());
    }

    #[test]
    fn test_incognito_session_behaves_identically() {
        let blocker = AdBlocker::with_rules(RuleSet::from_static(TEST_RULES), true);
        let persistent = blocker.attach(SessionKind::Persistent);
        let incognito = blocker.attach(SessionKind::Incognito);
        let r = req("https://ads.example.net/x", ResourceType::Script);
        assert!(persistent.on_before_request(&r).is_cancel());
        assert!(incognito.on_before_request(&r).is_cancel());
        // Both sessions share the same counters.
        assert_eq!(blocker.total_blocked(), 2);
    }
}
