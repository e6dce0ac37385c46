//! REST transport for the session subsystem.
//!
//! One method per logical remote operation; the access token travels as
//! a bearer header on every authenticated call. Record addresses appear
//! only in paths derived from the token, never as stored literals.

use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::api::Api;
use crate::error::LoginError;
use crate::token::SessionAddress;
use crate::types::{
    ChangePasswordRequest, CreateSessionRequest, CreateSessionResponse, GroupInfo, SessionRecord,
    User,
};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct RestApi {
    client: Client,
    base_url: String,
}

#[derive(Deserialize)]
struct ServerErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct SaltResponse {
    salt: String,
}

#[derive(Deserialize)]
struct EntropyResponse {
    entropy: Option<String>,
}

impl RestApi {
    pub fn new(base_url: &str) -> Result<Self, LoginError> {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|err| LoginError::Connection(err.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn session_path(address: &SessionAddress) -> String {
        format!("/v1/session/{}/{}", address.list_id, address.element_id)
    }

    async fn handle_response<T: DeserializeOwned>(response: Response) -> Result<T, LoginError> {
        let status = response.status();

        if status.is_success() {
            return response.json::<T>().await.map_err(|err| LoginError::Server {
                status: status.as_u16(),
                message: err.to_string(),
            });
        }

        Err(Self::status_error(response, status).await)
    }

    async fn handle_empty_response(response: Response) -> Result<(), LoginError> {
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        Err(Self::status_error(response, status).await)
    }

    async fn status_error(response: Response, status: StatusCode) -> LoginError {
        if status == StatusCode::UNAUTHORIZED {
            return LoginError::Unauthenticated;
        }
        let code = status.as_u16();
        let message = response
            .json::<ServerErrorBody>()
            .await
            .ok()
            .and_then(|body| body.message.or(body.error))
            .unwrap_or_else(|| format!("HTTP {code}"));
        LoginError::Server {
            status: code,
            message,
        }
    }
}

impl Api for RestApi {
    async fn fetch_salt(&self, mail_address: &str) -> Result<Vec<u8>, LoginError> {
        let response = self
            .client
            .get(self.url("/v1/salt"))
            .query(&[("mail_address", mail_address)])
            .send()
            .await?;
        let body: SaltResponse = Self::handle_response(response).await?;
        STANDARD
            .decode(&body.salt)
            .map_err(|_| LoginError::Crypto("malformed salt".into()))
    }

    async fn create_session(
        &self,
        request: &CreateSessionRequest,
    ) -> Result<CreateSessionResponse, LoginError> {
        let response = self
            .client
            .post(self.url("/v1/session"))
            .json(request)
            .send()
            .await?;
        Self::handle_response(response).await
    }

    async fn second_factor_pending(&self, access_token: &str) -> Result<bool, LoginError> {
        #[derive(Deserialize)]
        struct PendingResponse {
            pending: bool,
        }
        let response = self
            .client
            .get(self.url("/v1/session/secondfactor"))
            .bearer_auth(access_token)
            .send()
            .await?;
        let body: PendingResponse = Self::handle_response(response).await?;
        Ok(body.pending)
    }

    async fn notify_receive_info(&self, access_token: &str) -> Result<(), LoginError> {
        let response = self
            .client
            .post(self.url("/v1/receiveinfo"))
            .bearer_auth(access_token)
            .json(&serde_json::json!({}))
            .send()
            .await?;
        Self::handle_empty_response(response).await
    }

    async fn change_password(
        &self,
        access_token: &str,
        request: &ChangePasswordRequest,
    ) -> Result<(), LoginError> {
        let response = self
            .client
            .post(self.url("/v1/password"))
            .bearer_auth(access_token)
            .json(request)
            .send()
            .await?;
        Self::handle_empty_response(response).await
    }

    async fn load_session(
        &self,
        access_token: &str,
        address: &SessionAddress,
    ) -> Result<SessionRecord, LoginError> {
        let response = self
            .client
            .get(self.url(&Self::session_path(address)))
            .bearer_auth(access_token)
            .send()
            .await?;
        Self::handle_response(response).await
    }

    async fn delete_session(
        &self,
        access_token: &str,
        address: &SessionAddress,
    ) -> Result<(), LoginError> {
        let response = self
            .client
            .delete(self.url(&Self::session_path(address)))
            .bearer_auth(access_token)
            .send()
            .await?;
        Self::handle_empty_response(response).await
    }

    async fn load_user(&self, access_token: &str, user_id: &str) -> Result<User, LoginError> {
        let response = self
            .client
            .get(self.url(&format!("/v1/user/{user_id}")))
            .bearer_auth(access_token)
            .send()
            .await?;
        Self::handle_response(response).await
    }

    async fn load_group_info(
        &self,
        access_token: &str,
        group_id: &str,
    ) -> Result<GroupInfo, LoginError> {
        let response = self
            .client
            .get(self.url(&format!("/v1/groupinfo/{group_id}")))
            .bearer_auth(access_token)
            .send()
            .await?;
        Self::handle_response(response).await
    }

    async fn load_entropy(&self, access_token: &str) -> Result<Option<Vec<u8>>, LoginError> {
        let response = self
            .client
            .get(self.url("/v1/entropy"))
            .bearer_auth(access_token)
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let body: EntropyResponse = Self::handle_response(response).await?;
        body.entropy
            .map(|blob| {
                STANDARD
                    .decode(&blob)
                    .map_err(|_| LoginError::Crypto("malformed entropy blob".into()))
            })
            .transpose()
    }

    async fn store_entropy(&self, access_token: &str, blob: &[u8]) -> Result<(), LoginError> {
        let response = self
            .client
            .put(self.url("/v1/entropy"))
            .bearer_auth(access_token)
            .json(&serde_json::json!({ "entropy": STANDARD.encode(blob) }))
            .send()
            .await?;
        Self::handle_empty_response(response).await
    }
}
