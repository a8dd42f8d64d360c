//! Initialisation du tracing, appelée une fois par le shell au démarrage.
//!
//! Filtrage par `RUST_LOG` (ex. `RUST_LOG=aegis_core=debug`).

use std::sync::Once;

static INIT: Once = Once::new();

/// Installe le subscriber global. Idempotent : les appels suivants sont
/// des no-ops, ce qui permet aux tests de l'appeler librement.
pub fn init() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .init();
    });
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_init_is_idempotent() {
        super::init();
        super::init();
    }
}
