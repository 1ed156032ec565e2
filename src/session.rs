//! Selection and profile state driven by the rendering shell.
//!
//! Persona changes request advice immediately. Profile edits only change
//! state; the shell must call [`Session::update_plan`] to fetch for them.

use std::sync::Arc;

use crate::error::{ArchitectError, Result};
use crate::models::{PersonaProfile, UserProfile};
use crate::orchestrator::{AdviceOrchestrator, AdviceView, Display, RequestOutcome};
use crate::personas::find_preset;

pub struct Session {
    orchestrator: Arc<AdviceOrchestrator>,
    presets: Vec<PersonaProfile>,
    selected: PersonaProfile,
    custom_mode: bool,
    profile: UserProfile,
}

impl Session {
    /// Start a session with the first preset selected
    pub fn new(
        orchestrator: Arc<AdviceOrchestrator>,
        presets: Vec<PersonaProfile>,
        profile: UserProfile,
    ) -> Result<Self> {
        let selected = presets
            .first()
            .cloned()
            .ok_or_else(|| {
                ArchitectError::Config("at least one preset persona is required".to_string())
            })?;
        Ok(Self {
            orchestrator,
            presets,
            selected,
            custom_mode: false,
            profile,
        })
    }

    /// Initial request for the persona selected at start-up
    pub async fn start(&self) -> RequestOutcome {
        self.request_current().await
    }

    pub fn presets(&self) -> &[PersonaProfile] {
        &self.presets
    }

    pub fn selected(&self) -> &PersonaProfile {
        &self.selected
    }

    pub fn is_custom_mode(&self) -> bool {
        self.custom_mode
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    /// Select a preset by id. Returns `Ok(None)` when it is already active.
    pub async fn select_preset(&mut self, id: &str) -> Result<Option<RequestOutcome>> {
        let persona = find_preset(&self.presets, id)
            .cloned()
            .ok_or_else(|| ArchitectError::UnknownPersona(id.to_string()))?;

        if !self.custom_mode && persona.id == self.selected.id {
            return Ok(None);
        }
        tracing::info!("Selected preset persona {}", persona.name);
        self.custom_mode = false;
        self.selected = persona;
        Ok(Some(self.request_current().await))
    }

    /// Invite a mentor by name. Blank names are ignored.
    pub async fn submit_custom(&mut self, name: &str) -> Option<RequestOutcome> {
        let persona = PersonaProfile::custom(name)?;
        tracing::info!("Selected custom persona {} ({})", persona.name, persona.id);
        self.custom_mode = true;
        self.selected = persona;
        Some(self.request_current().await)
    }

    pub fn set_age(&mut self, age: impl Into<String>) {
        self.profile.age = age.into();
    }

    pub fn set_gender(&mut self, gender: impl Into<String>) {
        self.profile.gender = gender.into();
    }

    pub fn set_dream(&mut self, dream: impl Into<String>) {
        self.profile.dream = dream.into();
    }

    /// Explicit "update plan" action after profile edits
    pub async fn update_plan(&self) -> RequestOutcome {
        self.request_current().await
    }

    /// Retry after a failure. Failed fetches are never cached, so this re-issues.
    pub async fn retry(&self) -> RequestOutcome {
        self.request_current().await
    }

    pub async fn view(&self) -> AdviceView {
        self.orchestrator
            .current_view(&self.selected, &self.profile)
            .await
    }

    /// Resolve the view into what the shell should show for the active persona
    pub async fn display<T>(&self, f: impl FnOnce(Display<'_>) -> T) -> T {
        let view = self.view().await;
        f(view.display(&self.selected))
    }

    /// Raw roadmap text for the clipboard, if a result is available
    pub async fn copy_plan(&self) -> Option<String> {
        self.view().await.result.map(|r| r.content.clone())
    }

    /// Two caption lines shown while a plan is loading
    pub fn loading_caption(&self) -> (String, String) {
        (
            format!("Connecting to {}...", self.selected.name),
            format!(
                "Customizing plan for a {}-year-old {} enthusiast",
                self.profile.age, self.profile.dream
            ),
        )
    }

    async fn request_current(&self) -> RequestOutcome {
        self.orchestrator
            .request(&self.selected, &self.profile)
            .await
    }
}
