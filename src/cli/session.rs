use std::error::Error;
use std::path::PathBuf;

use tracing::info;

use crate::api::ApiClient;
use crate::core::auth::{resolve_auth, KeyringTokenStore};
use crate::core::config::Config;
use crate::core::endpoint::resolve_base_url;
use crate::utils::logging::TranscriptLog;

/// Everything a command needs to talk to the backend.
pub struct Session {
    pub client: ApiClient,
    pub transcript: TranscriptLog,
}

impl Session {
    pub fn open(log: Option<PathBuf>) -> Result<Self, Box<dyn Error>> {
        let config = Config::load()?;
        let base_url = resolve_base_url(&config);
        let auth = resolve_auth(&KeyringTokenStore)?;
        let transcript = TranscriptLog::new(log)?;

        info!(
            %base_url,
            logged_in = auth.is_logged_in(),
            transcript = %transcript.status_string(),
            "session ready"
        );

        Ok(Self {
            client: ApiClient::new(base_url, auth),
            transcript,
        })
    }

    pub fn from_parts(client: ApiClient, transcript: TranscriptLog) -> Self {
        Self { client, transcript }
    }
}
