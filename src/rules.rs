//! Classification de requêtes réseau (ad-blocking, tracker blocking).
//!
//! Fonction pure : (URL, type de ressource) → décision de blocage, sans état
//! ni I/O, appelable en parallèle depuis toutes les sessions.
//!
//! La table de règles est curatée à la compilation — pas de compilateur de
//! listes EasyList/ABP ici. Trois formes de motifs :
//!
//! - **Suffixe de domaine** : `doubleclick.net` matche l'hôte exact et tous
//!   ses sous-domaines. Vérifié en premier (moins de faux positifs).
//! - **Sous-chaîne** : matche n'importe où dans l'URL complète.
//! - **Glob de chemin** : motif avec `*` appliqué au chemin de l'URL.
//!
//! Une règle peut être restreinte à un type de ressource ; sans restriction
//! elle s'applique à tous les types.

use url::Url;

/// Category of a network request, as reported by the embedding engine.
///
/// String forms are the lowercase names; they double as the value for the
/// spoofed `Sec-Fetch-Dest` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceType {
    Document,
    Script,
    Stylesheet,
    Image,
    Font,
    Media,
    Xhr,
    Other,
}

impl ResourceType {
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceType::Document => "document",
            ResourceType::Script => "script",
            ResourceType::Stylesheet => "stylesheet",
            ResourceType::Image => "image",
            ResourceType::Font => "font",
            ResourceType::Media => "media",
            ResourceType::Xhr => "xhr",
            ResourceType::Other => "other",
        }
    }

    /// Parses an engine-provided type string. Unknown strings map to `Other`.
    pub fn from_engine_str(s: &str) -> Self {
        match s {
            "document" | "main_frame" | "sub_frame" => ResourceType::Document,
            "script" => ResourceType::Script,
            "stylesheet" => ResourceType::Stylesheet,
            "image" => ResourceType::Image,
            "font" => ResourceType::Font,
            "media" => ResourceType::Media,
            "xhr" | "fetch" => ResourceType::Xhr,
            _ => ResourceType::Other,
        }
    }
}

/// Matching pattern of a single filter rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    /// Matches the host exactly, or any subdomain of it.
    DomainSuffix(&'static str),
    /// Matches anywhere in the full URL string.
    Substring(&'static str),
    /// `*`-glob applied to the URL path (query excluded).
    PathGlob(&'static str),
}

impl std::fmt::Display for Pattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Pattern::DomainSuffix(d) => write!(f, "domain:{d}"),
            Pattern::Substring(s) => write!(f, "substr:{s}"),
            Pattern::PathGlob(g) => write!(f, "path:{g}"),
        }
    }
}

/// One curated filter rule: a pattern plus an optional resource-type
/// restriction. Immutable once loaded.
#[derive(Debug, Clone, Copy)]
pub struct FilterRule {
    pub pattern: Pattern,
    /// `Some(t)` restricts the rule to requests of type `t`.
    pub resource: Option<ResourceType>,
}

impl FilterRule {
    pub const fn domain(suffix: &'static str) -> Self {
        Self {
            pattern: Pattern::DomainSuffix(suffix),
            resource: None,
        }
    }

    pub const fn domain_typed(suffix: &'static str, resource: ResourceType) -> Self {
        Self {
            pattern: Pattern::DomainSuffix(suffix),
            resource: Some(resource),
        }
    }

    pub const fn substring(needle: &'static str) -> Self {
        Self {
            pattern: Pattern::Substring(needle),
            resource: None,
        }
    }

    pub const fn path_glob(glob: &'static str, resource: Option<ResourceType>) -> Self {
        Self {
            pattern: Pattern::PathGlob(glob),
            resource,
        }
    }
}

/// Index of the matching rule inside its [`RuleSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleId(pub usize);

/// Outcome of a classification. Transient, never persisted.
#[derive(Debug, Clone, Copy)]
pub struct BlockDecision {
    pub matched: bool,
    pub rule: Option<RuleId>,
}

impl BlockDecision {
    const ALLOW: BlockDecision = BlockDecision {
        matched: false,
        rule: None,
    };
}

// ─────────────────────────────────────────────────────────────────────────────
// Table de règles intégrée
// ─────────────────────────────────────────────────────────────────────────────

/// Règles curatées : réseaux publicitaires et trackers majeurs.
///
/// Les restrictions de type évitent de casser les domaines à double usage
/// (ex. `connect.facebook.net` héberge aussi des SDK légitimes — seuls les
/// scripts y sont bloqués).
const BUILTIN_RULES: &[FilterRule] = &[
    // Réseaux publicitaires — tous types de ressources
    FilterRule::domain("doubleclick.net"),
    FilterRule::domain("googlesyndication.com"),
    FilterRule::domain("googleadservices.com"),
    FilterRule::domain("adservice.google.com"),
    FilterRule::domain("s0.2mdn.net"),
    FilterRule::domain("imasdk.googleapis.com"),
    FilterRule::domain("ad.youtube.com"),
    FilterRule::domain("fundingchoices.google.com"),
    FilterRule::domain("adnxs.com"),
    FilterRule::domain("criteo.com"),
    FilterRule::domain("taboola.com"),
    FilterRule::domain("outbrain.com"),
    FilterRule::domain("moatads.com"),
    // Analytics / télémétrie
    FilterRule::domain("google-analytics.com"),
    FilterRule::domain("googletagmanager.com"),
    FilterRule::domain("googletagservices.com"),
    FilterRule::domain("scorecardresearch.com"),
    FilterRule::domain("quantserve.com"),
    // Trackers restreints au type script (domaines à double usage)
    FilterRule::domain_typed("connect.facebook.net", ResourceType::Script),
    FilterRule::domain_typed("hotjar.com", ResourceType::Script),
    FilterRule::domain_typed("mouseflow.com", ResourceType::Script),
    FilterRule::domain_typed("mixpanel.com", ResourceType::Script),
    // Chemins publicitaires (YouTube et consorts)
    FilterRule::substring("/pagead/"),
    FilterRule::substring("/api/stats/ads"),
    FilterRule::substring("/ptracking"),
    FilterRule::substring("adsbygoogle"),
    // Globs de chemin
    FilterRule::path_glob("/ads/*", None),
    FilterRule::path_glob("/banners/*", Some(ResourceType::Image)),
    FilterRule::path_glob("/beacon/*", Some(ResourceType::Xhr)),
];

/// Jeu de règles figé, partagé par toutes les sessions.
#[derive(Debug, Clone, Copy)]
pub struct RuleSet {
    rules: &'static [FilterRule],
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::builtin()
    }
}

impl RuleSet {
    /// The curated built-in table.
    pub fn builtin() -> Self {
        Self {
            rules: BUILTIN_RULES,
        }
    }

    /// Builds a set from a caller-provided static table (tests, embedders).
    pub fn from_static(rules: &'static [FilterRule]) -> Self {
        Self { rules }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn rule(&self, id: RuleId) -> &FilterRule {
        &self.rules[id.0]
    }

    /// Classifies one request. `true` in `matched` means block.
    ///
    /// Malformed URLs and non-HTTP(S) schemes (`data:`, `blob:`, `about:`…)
    /// are never blocked. Domain-suffix rules are checked before
    /// substring/path rules.
    pub fn classify(&self, url: &str, resource_type: ResourceType) -> BlockDecision {
        let Ok(parsed) = Url::parse(url) else {
            return BlockDecision::ALLOW;
        };
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return BlockDecision::ALLOW;
        }
        let host = parsed.host_str().unwrap_or("");
        let path = parsed.path();

        // Passe 1 : suffixes de domaine
        for (i, rule) in self.rules.iter().enumerate() {
            if let Pattern::DomainSuffix(suffix) = rule.pattern
                && type_applies(rule, resource_type)
                && domain_matches(host, suffix)
            {
                return BlockDecision {
                    matched: true,
                    rule: Some(RuleId(i)),
                };
            }
        }

        // Passe 2 : sous-chaînes et globs de chemin
        for (i, rule) in self.rules.iter().enumerate() {
            if !type_applies(rule, resource_type) {
                continue;
            }
            let hit = match rule.pattern {
                Pattern::DomainSuffix(_) => false,
                Pattern::Substring(needle) => url.contains(needle),
                Pattern::PathGlob(glob) => glob_matches(glob, path),
            };
            if hit {
                return BlockDecision {
                    matched: true,
                    rule: Some(RuleId(i)),
                };
            }
        }

        BlockDecision::ALLOW
    }
}

fn type_applies(rule: &FilterRule, resource_type: ResourceType) -> bool {
    match rule.resource {
        Some(restricted) => restricted == resource_type,
        None => true,
    }
}

/// `host` matches `suffix` if equal, or if `host` ends with `.suffix`.
/// A plain `ends_with` would wrongly match `notdoubleclick.net`.
fn domain_matches(host: &str, suffix: &str) -> bool {
    host == suffix
        || (host.len() > suffix.len()
            && host.ends_with(suffix)
            && host.as_bytes()[host.len() - suffix.len() - 1] == b'.')
}

/// Star-only glob match (`*` spans any run of characters, `/` included).
fn glob_matches(pattern: &str, text: &str) -> bool {
    let pat = pattern.as_bytes();
    let txt = text.as_bytes();
    let (mut p, mut t) = (0usize, 0usize);
    let mut star: Option<(usize, usize)> = None;

    while t < txt.len() {
        if p < pat.len() && pat[p] == b'*' {
            star = Some((p, t));
            p += 1;
        } else if p < pat.len() && pat[p] == txt[t] {
            p += 1;
            t += 1;
        } else if let Some((sp, st)) = star {
            // Backtrack: let the last star swallow one more character.
            p = sp + 1;
            t = st + 1;
            star = Some((sp, st + 1));
        } else {
            return false;
        }
    }
    while p < pat.len() && pat[p] == b'*' {
        p += 1;
    }
    p == pat.len()
}
