use std::path::Path;
use std::sync::Arc;

use httpkit::TracedClient;
use tracing::debug;
use url::Url;

use crate::config::StudentPortalConfig;
use crate::domain::service::PortalService;
use crate::domain::session::SessionStore;
use crate::infra::http::HttpPortalClient;
use crate::infra::session::FileSessionStore;

/// Wires the HTTP adapter and the file-backed session store into a [`PortalService`].
pub struct StudentPortal;

impl StudentPortal {
    /// Key of this module's entry in the `modules` config bag.
    pub const NAME: &'static str = "student_portal";

    pub fn build(
        config: &StudentPortalConfig,
        home_dir: &Path,
        api_base: Url,
        client: TracedClient,
    ) -> PortalService {
        debug!(api_base = %api_base, "wiring student portal");
        let api = Arc::new(HttpPortalClient::new(client, api_base));
        PortalService::new(api, Self::session_store(config, home_dir))
    }

    /// The session file alone, for commands that never talk to the API.
    pub fn session_store(config: &StudentPortalConfig, home_dir: &Path) -> Arc<dyn SessionStore> {
        let session_path = config.session_path(home_dir);
        debug!(session = %session_path.display(), "opening session store");
        Arc::new(FileSessionStore::new(session_path))
    }
}
