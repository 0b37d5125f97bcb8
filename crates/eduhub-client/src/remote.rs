use std::time::Duration;

use futures_util::future::BoxFuture;
use tracing::debug;

use eduhub_types::api::CreateIdeaRequest;
use eduhub_types::models::Idea;

use crate::error::{ClientError, ClientResult};

/// Remote insert for community-board ideas.
pub trait IdeaRemote: Send + Sync {
    fn insert_idea(&self, request: CreateIdeaRequest) -> BoxFuture<'_, ClientResult<Idea>>;
}

/// Posts ideas to a running EduHub server.
pub struct HttpIdeaRemote {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl HttpIdeaRemote {
    pub fn new(base_url: &str, token: &str) -> ClientResult<Self> {
        let client = reqwest::Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }
}

impl IdeaRemote for HttpIdeaRemote {
    fn insert_idea(&self, request: CreateIdeaRequest) -> BoxFuture<'_, ClientResult<Idea>> {
        Box::pin(async move {
            let url = format!("{}/ideas", self.base_url);
            let response = self
                .client
                .post(&url)
                .bearer_auth(&self.token)
                .json(&request)
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                debug!("POST {} answered {}", url, status);
                return Err(ClientError::Status { status: status.as_u16() });
            }
            Ok(response.json::<Idea>().await?)
        })
    }
}
