pub mod config;
pub mod error;
pub mod fetcher;
pub mod markdown;
pub mod models;
pub mod orchestrator;
pub mod personas;
pub mod prompt;
pub mod session;
pub mod terminal;
pub mod transport;

use std::sync::Arc;

use crate::config::Config;
use crate::error::Result;
use crate::fetcher::{AdviceFetcher, GeminiAdvisor};
use crate::orchestrator::AdviceOrchestrator;
use crate::personas::preset_personas;
use crate::session::Session;
use crate::transport::{GeminiTransport, Transport};

/// Wire the Gemini transport, fetcher, and orchestrator from configuration
pub fn build_orchestrator(cfg: &Config) -> AdviceOrchestrator {
    let transport = Arc::new(GeminiTransport::with_base(
        cfg.gemini.api_base.clone(),
        cfg.gemini.api_key.clone(),
    ));

    let fetcher = GeminiAdvisor::new(
        transport as Arc<dyn Transport>,
        cfg.gemini.model.clone(),
        cfg.gemini.temperature,
        cfg.gemini.enable_search,
    );

    AdviceOrchestrator::new(Arc::new(fetcher) as Arc<dyn AdviceFetcher>)
        .with_single_flight(cfg.orchestrator.single_flight)
        .with_error_message(cfg.orchestrator.error_message.clone())
}

/// A session over the preset personas with the configured default profile
pub fn build_session(cfg: &Config) -> Result<Session> {
    let orchestrator = Arc::new(build_orchestrator(cfg));
    Session::new(orchestrator, preset_personas(), cfg.profile.to_profile())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_session_uses_configured_profile() {
        let mut cfg = Config::default();
        cfg.profile.age = "15".to_string();
        let session = build_session(&cfg).unwrap();
        assert_eq!(session.profile().age, "15");
        assert_eq!(session.selected().id, "MUSK");
        assert_eq!(session.presets().len(), 4);
    }
}
