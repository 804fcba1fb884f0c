//! Application state: grading prompts, the optional OpenAI client, and the
//! coach session manager.
//!
//! Each grading request is stateless; the only mutable state the service
//! carries is per-session coach tracking inside `SessionManager`.

use tracing::{info, instrument};

use crate::config::{load_coach_config_from_env, Prompts};
use crate::openai::OpenAI;
use crate::session::SessionManager;

pub struct AppState {
    pub openai: Option<OpenAI>,
    pub prompts: Prompts,
    pub sessions: SessionManager,
}

impl AppState {
    /// Build state from env: load prompt config and init OpenAI if keyed.
    #[instrument(level = "info", skip_all)]
    pub fn new() -> Self {
        let prompts = load_coach_config_from_env()
            .map(|c| c.prompts)
            .unwrap_or_default();

        let openai = OpenAI::from_env();
        if let Some(oa) = &openai {
            info!(target: "essaycoach_backend", base_url = %oa.base_url, grading_model = %oa.grading_model, "OpenAI enabled.");
        } else {
            info!(target: "essaycoach_backend", "OpenAI disabled (no OPENAI_API_KEY). Every request uses the strict fallback scorer.");
        }

        Self {
            openai,
            prompts,
            sessions: SessionManager::new(),
        }
    }
}
