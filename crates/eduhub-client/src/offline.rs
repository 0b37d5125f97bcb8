//! Offline-first idea submission.
//!
//! While the device is offline, ideas are kept as drafts in the local store
//! under [`DRAFTS_KEY`]. Coming back online pushes every draft once, in the
//! order they were written; drafts that fail stay queued for the next
//! reconnect.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use eduhub_types::api::CreateIdeaRequest;
use eduhub_types::events::Notification;
use eduhub_types::models::Idea;

use crate::error::{ClientError, ClientResult};
use crate::remote::IdeaRemote;
use crate::store::KvStore;
use crate::toast::Toasts;

pub const DRAFTS_KEY: &str = "idea_drafts";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdeaDraft {
    pub local_id: Uuid,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub challenge_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl IdeaDraft {
    /// The local id travels as `draft_id` so a replay after a lost response
    /// does not post the idea twice.
    fn to_request(&self) -> CreateIdeaRequest {
        CreateIdeaRequest {
            title: self.title.clone(),
            description: self.description.clone(),
            challenge_id: self.challenge_id,
            draft_id: Some(self.local_id),
        }
    }
}

#[derive(Debug)]
pub enum Submission {
    Sent(Idea),
    Queued(IdeaDraft),
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SyncReport {
    pub synced: usize,
    pub failed: usize,
}

pub struct OfflineIdeaQueue {
    store: Box<dyn KvStore>,
    remote: Arc<dyn IdeaRemote>,
    toasts: Arc<dyn Toasts>,
    online: bool,
    drafts: Vec<IdeaDraft>,
}

impl OfflineIdeaQueue {
    /// Load any drafts left over from a previous session.
    pub fn new(
        store: Box<dyn KvStore>,
        remote: Arc<dyn IdeaRemote>,
        toasts: Arc<dyn Toasts>,
        online: bool,
    ) -> ClientResult<Self> {
        let drafts = match store.get(DRAFTS_KEY)? {
            Some(value) => serde_json::from_value(value)?,
            None => Vec::new(),
        };
        Ok(Self {
            store,
            remote,
            toasts,
            online,
            drafts,
        })
    }

    pub fn is_online(&self) -> bool {
        self.online
    }

    pub fn drafts(&self) -> &[IdeaDraft] {
        &self.drafts
    }

    /// Blank titles or descriptions are refused before anything is queued.
    pub async fn submit(&mut self, request: CreateIdeaRequest) -> ClientResult<Submission> {
        if request.title.trim().is_empty() {
            return Err(ClientError::Blank("title"));
        }
        if request.description.trim().is_empty() {
            return Err(ClientError::Blank("description"));
        }

        if !self.online {
            let draft = IdeaDraft {
                local_id: request.draft_id.unwrap_or_else(Uuid::new_v4),
                title: request.title,
                description: request.description,
                challenge_id: request.challenge_id,
                created_at: Utc::now(),
            };
            self.drafts.push(draft.clone());
            self.persist()?;
            debug!("Queued draft {} ({} pending)", draft.local_id, self.drafts.len());
            self.toasts.show(Notification::info(
                "You're offline. Your idea was saved and will be posted when you reconnect.",
            ));
            return Ok(Submission::Queued(draft));
        }

        match self.remote.insert_idea(request).await {
            Ok(idea) => {
                self.toasts.show(Notification::success("Idea posted!"));
                Ok(Submission::Sent(idea))
            }
            Err(e) => {
                let message = format!("Could not post your idea: {}", e);
                self.toasts.show(Notification::error(message));
                Err(e)
            }
        }
    }

    /// Record a connectivity change. Only going from offline to online
    /// flushes the queue.
    pub async fn set_online(&mut self, online: bool) -> ClientResult<Option<SyncReport>> {
        let reconnected = online && !self.online;
        self.online = online;
        if reconnected {
            info!("Back online with {} queued drafts", self.drafts.len());
            return self.sync().await.map(Some);
        }
        Ok(None)
    }

    /// Push every queued draft once, oldest first. A store write that fails
    /// along the way does not stop the pass; the first such error is
    /// returned once every draft has been tried.
    pub async fn sync(&mut self) -> ClientResult<SyncReport> {
        if !self.online {
            return Err(ClientError::Offline);
        }

        let mut report = SyncReport::default();
        if self.drafts.is_empty() {
            return Ok(report);
        }

        let mut store_error = None;
        for draft in self.drafts.clone() {
            match self.remote.insert_idea(draft.to_request()).await {
                Ok(_) => {
                    self.drafts.retain(|d| d.local_id != draft.local_id);
                    report.synced += 1;
                    if let Err(e) = self.persist() {
                        warn!("Could not save the draft queue: {}", e);
                        if store_error.is_none() {
                            store_error = Some(e);
                        }
                    }
                }
                Err(e) => {
                    warn!("Draft {} failed to sync, keeping it: {}", draft.local_id, e);
                    report.failed += 1;
                }
            }
        }

        let notification = if report.failed == 0 {
            Notification::success(format!("Posted {} saved idea(s).", report.synced))
        } else {
            Notification::error(format!(
                "Posted {} saved idea(s); {} will retry when you reconnect.",
                report.synced, report.failed
            ))
        };
        self.toasts.show(notification);

        match store_error {
            Some(e) => Err(e),
            None => Ok(report),
        }
    }

    fn persist(&mut self) -> ClientResult<()> {
        if self.drafts.is_empty() {
            return self.store.remove(DRAFTS_KEY);
        }
        let value = serde_json::to_value(&self.drafts)?;
        self.store.set(DRAFTS_KEY, value)
    }
}
