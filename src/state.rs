use std::sync::Arc;

use axum::extract::FromRef;

use crate::{config::AuthSettings, repository::Store};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub auth: AuthSettings,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, auth: AuthSettings) -> Self {
        Self { store, auth }
    }
}

impl FromRef<AppState> for AuthSettings {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}
