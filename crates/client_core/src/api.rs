use std::time::Duration;

use async_trait::async_trait;
use reqwest::{
    header::{self, HeaderMap, HeaderValue},
    Client, Method, Response,
};
use shared::{
    domain::{Profile, RelationshipStatus, Username},
    protocol::{InvitationActionQuery, StatusPayload},
};
use tracing::debug;
use url::Url;

use crate::{
    action::{ActionSpec, HttpMethod},
    config::ClientSettings,
    error::ApiCallError,
};

/// Server-owned source of truth for relationship state.
#[async_trait]
pub trait RelationshipApi: Send + Sync {
    async fn fetch_status(&self, target: &Username) -> Result<RelationshipStatus, ApiCallError>;
    async fn fetch_profile(&self, target: &Username) -> Result<Profile, ApiCallError>;
    async fn execute(&self, target: &Username, action: &ActionSpec) -> Result<(), ApiCallError>;
}

pub struct HttpRelationshipApi {
    http: Client,
    base_url: Url,
    api_prefix: String,
}

impl HttpRelationshipApi {
    pub fn new(server_url: &str) -> Result<Self, ApiCallError> {
        Self::with_client(
            Client::new(),
            server_url,
            shared::protocol::DEFAULT_API_PREFIX,
        )
    }

    pub fn from_settings(settings: &ClientSettings) -> Result<Self, ApiCallError> {
        let mut headers = HeaderMap::new();
        if let Some(cookie) = &settings.session_cookie {
            let value = HeaderValue::from_str(cookie)
                .map_err(|_| ApiCallError::InvalidHeader("session_cookie"))?;
            headers.insert(header::COOKIE, value);
        }
        let user_agent = HeaderValue::from_str(&settings.user_agent)
            .map_err(|_| ApiCallError::InvalidHeader("user_agent"))?;

        let mut builder = Client::builder()
            .default_headers(headers)
            .user_agent(user_agent);
        if let Some(seconds) = settings.request_timeout_seconds {
            builder = builder.timeout(Duration::from_secs(seconds));
        }

        Self::with_client(builder.build()?, &settings.server_url, &settings.api_prefix)
    }

    pub fn with_client(
        http: Client,
        server_url: &str,
        api_prefix: &str,
    ) -> Result<Self, ApiCallError> {
        let base_url = Url::parse(server_url.trim()).map_err(|e| ApiCallError::InvalidUrl {
            url: server_url.to_string(),
            reason: e.to_string(),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ApiCallError::InvalidUrl {
                url: server_url.to_string(),
                reason: "url cannot carry a path".to_string(),
            });
        }

        Ok(Self {
            http,
            base_url,
            api_prefix: api_prefix.trim_matches('/').to_string(),
        })
    }

    /// Joins the API prefix and `segments` onto the base url, escaping each
    /// segment so usernames can never alter the route.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiCallError> {
        let mut url = self.base_url.clone();
        {
            let mut path = url.path_segments_mut().map_err(|_| ApiCallError::InvalidUrl {
                url: self.base_url.to_string(),
                reason: "url cannot carry a path".to_string(),
            })?;
            path.pop_if_empty();
            for prefix_segment in self.api_prefix.split('/').filter(|s| !s.is_empty()) {
                path.push(prefix_segment);
            }
            for segment in segments {
                path.push(segment);
            }
        }
        Ok(url)
    }
}

fn ensure_success(response: Response) -> Result<Response, ApiCallError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    Err(ApiCallError::rejected(status.as_u16()))
}

#[async_trait]
impl RelationshipApi for HttpRelationshipApi {
    async fn fetch_status(&self, target: &Username) -> Result<RelationshipStatus, ApiCallError> {
        let url = self.endpoint(&["relations", "status", target.as_str()])?;
        let response = self.http.get(url).send().await?;
        let payload: StatusPayload = ensure_success(response)?.json().await?;
        debug!(username = %target, status = %payload.status(), "relations: status fetched");
        Ok(payload.status())
    }

    async fn fetch_profile(&self, target: &Username) -> Result<Profile, ApiCallError> {
        let url = self.endpoint(&["users", target.as_str()])?;
        let response = self.http.get(url).send().await?;
        Ok(ensure_success(response)?.json().await?)
    }

    async fn execute(&self, target: &Username, action: &ActionSpec) -> Result<(), ApiCallError> {
        let url = self.endpoint(&["relations", action.resource.path_segment(), target.as_str()])?;
        let method = match action.method {
            HttpMethod::Post => Method::POST,
            HttpMethod::Delete => Method::DELETE,
        };

        let mut request = self.http.request(method, url);
        if let Some(invitation_action) = action.action {
            request = request.query(&InvitationActionQuery {
                action: invitation_action,
            });
        }

        ensure_success(request.send().await?)?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/api_tests.rs"]
mod tests;
