use std::sync::OnceLock;

use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::upstream::UpstreamClient;

#[derive(Clone, Debug)]
pub struct AppState {
    pub config: Config,
    pub upstream: UpstreamClient,
    pub shutdown: CancellationToken,
}

static APP_STATE: OnceLock<AppState> = OnceLock::new();

pub fn set_app_state(state: AppState) -> Result<(), String> {
    APP_STATE
        .set(state)
        .map_err(|_| "application state already initialized".to_string())
}

pub fn app_state() -> Option<&'static AppState> {
    APP_STATE.get()
}
