use std::sync::Arc;

use gatehouse_core::{AppConfig, TokenCodec};
use gatehouse_identity::IdentityStore;
use gatehouse_media::{StagingArea, Uploader};

use crate::session::SessionService;

/// Shared application state for all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub identities: Arc<dyn IdentityStore>,
    pub codec: Arc<TokenCodec>,
    pub sessions: SessionService,
    pub uploader: Uploader,
    pub staging: Arc<StagingArea>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        identities: Arc<dyn IdentityStore>,
        uploader: Uploader,
        staging: StagingArea,
    ) -> Self {
        let codec = Arc::new(TokenCodec::new(&config.auth));
        let sessions = SessionService::new(Arc::clone(&identities), Arc::clone(&codec));
        Self {
            config: Arc::new(config),
            identities,
            codec,
            sessions,
            uploader,
            staging: Arc::new(staging),
        }
    }
}
