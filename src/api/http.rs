//! HTTP implementation of [`ChatServerApi`] for Synapse homeservers

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use url::Url;

use super::{AccountId, ApiError, ApiResult, ChatServerApi, PresenceStatus, RoomId};
use crate::config::{Credentials, PurgerConfig};
use crate::error::{PurgerError, Result};

const CLIENT_API: &[&str] = &["_matrix", "client", "r0"];
const ADMIN_API: &[&str] = &["_synapse", "admin", "v1"];
const DEVICE_ID: &str = "purger";

#[derive(Deserialize)]
struct LoginResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct AliasResponse {
    room_id: RoomId,
}

#[derive(Deserialize)]
struct MembersResponse {
    members: Vec<AccountId>,
}

#[derive(Deserialize, Default)]
struct MatrixErrorBody {
    #[serde(default)]
    errcode: String,
    #[serde(default)]
    error: String,
}

/// Homeserver client authenticated as an admin user
pub struct HttpChatApi {
    client: Client,
    base_url: Url,
    server_name: String,
    access_token: Option<String>,
}

impl HttpChatApi {
    /// Create an unauthenticated client
    pub fn new(base_url: &str, timeout: Duration) -> ApiResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ApiError::Malformed(format!("invalid base url {:?}: {}", base_url, e)))?;
        let host = base_url
            .host_str()
            .ok_or_else(|| ApiError::Malformed(format!("base url {} has no host", base_url)))?;
        let server_name = match base_url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            server_name,
            access_token: None,
        })
    }

    /// Build a client from configuration and log in; any failure is fatal
    pub async fn connect(config: &PurgerConfig, credentials: &Credentials) -> Result<Self> {
        let mut api = Self::new(&config.server_url, config.request_timeout())
            .map_err(|e| PurgerError::Config(e.to_string()))?;
        api.login(credentials).await.map_err(|e| {
            PurgerError::Authentication(format!(
                "could not log in to {} as {}: {}",
                config.server_url, credentials.username, e
            ))
        })?;
        Ok(api)
    }

    /// Password login; stores the returned bearer token
    pub async fn login(&mut self, credentials: &Credentials) -> ApiResult<()> {
        let url = self.endpoint(CLIENT_API, &["login"])?;
        let body = json!({
            "type": "m.login.password",
            "user": credentials.username,
            "password": credentials.password,
            "device_id": DEVICE_ID,
        });

        let response: LoginResponse = self
            .execute(self.client.post(url).json(&body), "login")
            .await?;
        self.access_token = Some(response.access_token);

        tracing::info!(server = %self.server_name, user = %credentials.username, "Logged in");
        Ok(())
    }

    fn endpoint(&self, api: &[&str], segments: &[&str]) -> ApiResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::Malformed(format!("{} cannot be a base url", self.base_url)))?
            .pop_if_empty()
            .extend(api)
            .extend(segments);
        Ok(url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        target: &str,
    ) -> ApiResult<T> {
        let response = request.send().await.map_err(|e| transport_error(e, target))?;
        let status = response.status();

        if status.is_success() {
            return response
                .json::<T>()
                .await
                .map_err(|e| ApiError::Malformed(format!("{}: {}", target, e)));
        }

        let body: MatrixErrorBody = response.json().await.unwrap_or_default();
        Err(status_error(status, body, target))
    }
}

fn transport_error(err: reqwest::Error, target: &str) -> ApiError {
    if err.is_timeout() {
        ApiError::Timeout(target.to_string())
    } else {
        ApiError::Transport(format!("{}: {}", target, err))
    }
}

fn status_error(status: StatusCode, body: MatrixErrorBody, target: &str) -> ApiError {
    if status == StatusCode::NOT_FOUND || body.errcode == "M_NOT_FOUND" {
        return ApiError::NotFound(target.to_string());
    }
    if status == StatusCode::UNAUTHORIZED {
        return ApiError::Unauthorized(format!("{}: {}", target, body.error));
    }
    ApiError::Server {
        status: status.as_u16(),
        errcode: body.errcode,
        message: body.error,
    }
}

#[async_trait]
impl ChatServerApi for HttpChatApi {
    fn server_name(&self) -> &str {
        &self.server_name
    }

    async fn resolve_room_alias(&self, alias: &str) -> ApiResult<RoomId> {
        let url = self.endpoint(CLIENT_API, &["directory", "room", alias])?;
        let response: AliasResponse = self
            .execute(self.authorized(self.client.get(url)), alias)
            .await?;
        Ok(response.room_id)
    }

    async fn list_room_members(&self, room_id: &str) -> ApiResult<Vec<AccountId>> {
        let url = self.endpoint(ADMIN_API, &["rooms", room_id, "members"])?;
        let response: MembersResponse = self
            .execute(self.authorized(self.client.get(url)), room_id)
            .await?;
        Ok(response.members)
    }

    async fn get_presence(&self, account: &str) -> ApiResult<PresenceStatus> {
        let url = self.endpoint(CLIENT_API, &["presence", account, "status"])?;
        self.execute(self.authorized(self.client.get(url)), account)
            .await
    }

    async fn deactivate_account(&self, account: &str, erase: bool) -> ApiResult<()> {
        let url = self.endpoint(ADMIN_API, &["deactivate", account])?;
        let request = self
            .authorized(self.client.post(url))
            .json(&json!({ "erase": erase }));
        let _: serde_json::Value = self.execute(request, account).await?;
        Ok(())
    }
}
