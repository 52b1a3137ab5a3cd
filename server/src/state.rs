use std::sync::Arc;

use crate::config::Config;
use crate::db::Database;
use crate::media::MediaStore;
use crate::services::events::EventStore;
use crate::services::guests::GuestTracker;
use crate::services::media::MediaLibrary;
use crate::services::registrations::RegistrationService;
use crate::services::review::ReviewWorkflow;

/// Shared handles given to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub media: MediaStore,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(db: Database, config: Config) -> Self {
        Self {
            db,
            media: MediaStore::new(config.media_dir.clone()),
            config: Arc::new(config),
        }
    }

    pub fn events(&self) -> EventStore {
        EventStore::new(
            self.db.clone(),
            self.media.clone(),
            self.config.event_utc_offset,
        )
    }

    pub fn registrations(&self) -> RegistrationService {
        RegistrationService::new(self.db.clone())
    }

    pub fn review(&self) -> ReviewWorkflow {
        ReviewWorkflow::new(self.db.clone())
    }

    pub fn guests(&self) -> GuestTracker {
        GuestTracker::new(self.db.clone())
    }

    pub fn media_library(&self) -> MediaLibrary {
        MediaLibrary::new(
            self.db.clone(),
            self.media.clone(),
            self.config.max_upload_bytes,
        )
    }
}
