use crate::{Config, integrations::Integrations, model::ModelManager};

#[derive(Debug, Clone)]
pub struct AppState {
    mm: ModelManager,
    integrations: Integrations,
    config: &'static Config,
}

impl AppState {
    pub fn new(mm: ModelManager, integrations: Integrations, config: &'static Config) -> Self {
        Self {
            mm,
            integrations,
            config,
        }
    }

    pub fn config(&self) -> &'static Config {
        self.config
    }

    pub fn pool(&self) -> &ModelManager {
        &self.mm
    }

    pub fn integrations(&self) -> &Integrations {
        &self.integrations
    }
}
