//! The login facade: session establishment, resumption and teardown.
//!
//! One facade instance is the single writer of the authenticated-user
//! snapshot and the group-key cache. All operations are async but the
//! facade holds no internal locks: overlapping calls are serialized by
//! the caller, matching the cooperative single-writer model of the rest
//! of the client.
//!
//! Out-of-band notifications (second-factor prompts) travel over an
//! unbounded mpsc channel to whatever shell hosts the facade.

use base64::{engine::general_purpose::STANDARD, Engine};
use tokio::sync::{mpsc, watch};
use zeroize::Zeroizing;

use courier_crypto::{kdf, verifier, wrap, EntropyPool, KeyLength, SymmetricKey, SALT_SIZE};

use crate::api::{Api, EventBus};
use crate::error::LoginError;
use crate::group_keys::GroupKeyCache;
use crate::second_factor::{PollPolicy, SecondFactorPoller};
use crate::token::SessionAddress;
use crate::types::{
    ChangePasswordRequest, Challenge, CreateSessionRequest, CreateSessionResponse, Credentials,
    EntityTypeRef, EntityUpdate, GroupInfo, User,
};

/// User-agent fragment of the legacy browser engine that reports a
/// rejected login as a network failure during session creation.
const LEGACY_USER_AGENT_TOKEN: &str = "Trident";

/// Out-of-band notifications emitted while a login operation is running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginEvent {
    /// The server gated the new session behind one or more second-factor
    /// challenges; the UI should prompt while polling continues.
    SecondFactorPending(Vec<Challenge>),
    /// A pending second factor was approved; the prompt can be dismissed.
    SecondFactorApproved,
}

/// Whether the active session belongs to a registered or an external user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionKind {
    #[default]
    Internal,
    /// Anonymous recipient authenticated through a shared salt.
    External,
}

/// Static configuration of the facade.
#[derive(Debug, Clone)]
pub struct LoginConfig {
    /// Length of derived passphrase keys.
    pub key_length: KeyLength,
    /// Second-factor polling policy.
    pub poll: PollPolicy,
    /// Remap a transport-level connection failure during session
    /// creation to `Unauthenticated`. Legacy workaround for browser
    /// engines that abort a rejected login mid-response.
    pub remap_connection_loss_to_unauthenticated: bool,
}

impl Default for LoginConfig {
    fn default() -> Self {
        Self {
            key_length: KeyLength::Bits256,
            poll: PollPolicy::default(),
            remap_connection_loss_to_unauthenticated: false,
        }
    }
}

impl LoginConfig {
    /// Configuration for a platform identified by its user agent.
    #[must_use]
    pub fn for_user_agent(user_agent: &str) -> Self {
        Self {
            remap_connection_loss_to_unauthenticated: user_agent.contains(LEGACY_USER_AGENT_TOKEN),
            ..Self::default()
        }
    }
}

/// The mutable session state. Populated atomically by a successful
/// establishment flow, cleared completely on logout or failure.
#[derive(Default)]
struct LoginState {
    current_user: Option<User>,
    current_user_group_info: Option<GroupInfo>,
    access_token: Option<String>,
    pending_auth_verifier: Option<String>,
    group_keys: GroupKeyCache,
    persistent_session: bool,
    session_kind: SessionKind,
}

impl LoginState {
    fn clear(&mut self) {
        self.current_user = None;
        self.current_user_group_info = None;
        self.access_token = None;
        self.pending_auth_verifier = None;
        self.group_keys.clear();
        self.persistent_session = false;
        self.session_kind = SessionKind::Internal;
    }
}

/// Orchestrator of the session lifecycle and key hierarchy.
pub struct LoginFacade<A: Api, B: EventBus> {
    api: A,
    bus: B,
    config: LoginConfig,
    events: mpsc::UnboundedSender<LoginEvent>,
    entropy: EntropyPool,
    state: LoginState,
}

impl<A: Api, B: EventBus> LoginFacade<A, B> {
    pub fn new(api: A, bus: B, config: LoginConfig, events: mpsc::UnboundedSender<LoginEvent>) -> Self {
        Self {
            api,
            bus,
            config,
            events,
            entropy: EntropyPool::new(),
            state: LoginState::default(),
        }
    }

    /// Whether a session is currently active.
    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.state.current_user.is_some()
    }

    /// The cached snapshot of the active user, if any.
    #[must_use]
    pub fn current_user(&self) -> Option<&User> {
        self.state.current_user.as_ref()
    }

    /// The cached group-info snapshot of the active user's group.
    #[must_use]
    pub fn current_user_group_info(&self) -> Option<&GroupInfo> {
        self.state.current_user_group_info.as_ref()
    }

    /// Id of the active user's own group.
    #[must_use]
    pub fn user_group_id(&self) -> Option<&str> {
        self.state
            .current_user
            .as_ref()
            .map(|user| user.user_group.group.as_str())
    }

    /// The active session's access token.
    #[must_use]
    pub fn access_token(&self) -> Option<&str> {
        self.state.access_token.as_deref()
    }

    /// Kind of the active session, if any.
    #[must_use]
    pub fn session_kind(&self) -> Option<SessionKind> {
        self.state
            .current_user
            .as_ref()
            .map(|_| self.state.session_kind)
    }

    /// Verifier of a submitted-but-not-yet-adopted password change.
    #[must_use]
    pub fn pending_auth_verifier(&self) -> Option<&str> {
        self.state.pending_auth_verifier.as_deref()
    }

    /// Hand the pending verifier to the transport's request-signing
    /// hook, clearing it.
    pub fn take_pending_auth_verifier(&mut self) -> Option<String> {
        self.state.pending_auth_verifier.take()
    }

    /// The decrypted key of one of the active user's groups, unwrapping
    /// and caching it on first access.
    pub fn group_key(&mut self, group_id: &str) -> Result<SymmetricKey, LoginError> {
        let user = self
            .state
            .current_user
            .as_ref()
            .ok_or(LoginError::Unauthenticated)?;
        Ok(self.state.group_keys.key_for(user, group_id)?.clone())
    }

    /// Establish a session for a registered user.
    ///
    /// When the server gates the session behind second-factor
    /// challenges, a [`LoginEvent::SecondFactorPending`] notification is
    /// emitted and this call completes only after approval. With
    /// `persist`, the returned credentials carry the passphrase
    /// encrypted under a random access key for later resumption.
    pub async fn create_session(
        &mut self,
        mail_address: &str,
        passphrase: &str,
        client_identifier: &str,
        persist: bool,
    ) -> Result<Credentials, LoginError> {
        tracing::debug!(mail_address, "establishing session");
        let salt = self.api.fetch_salt(mail_address).await?;
        let passphrase_key = kdf::derive_passphrase_key(passphrase, &salt, self.config.key_length)?;

        let (request, encrypted_password) = build_session_request(
            Some(mail_address.to_string()),
            None,
            None,
            client_identifier,
            &passphrase_key,
            passphrase,
            persist,
        )?;

        let response = match self.api.create_session(&request).await {
            Ok(response) => response,
            Err(LoginError::Connection(_))
                if self.config.remap_connection_loss_to_unauthenticated =>
            {
                return Err(LoginError::Unauthenticated)
            }
            Err(err) => return Err(err),
        };

        self.wait_for_second_factor(&response).await?;
        self.init_session(
            &response.user_id,
            &response.access_token,
            &passphrase_key,
            SessionKind::Internal,
            persist,
        )
        .await?;

        tracing::info!(user = %response.user_id, "session established");
        Ok(Credentials {
            mail_address: Some(mail_address.to_string()),
            user_id: response.user_id,
            access_token: response.access_token,
            encrypted_password,
        })
    }

    /// Establish a session for an external recipient.
    ///
    /// The passphrase key is derived from the caller-supplied salt, and
    /// the hash of that salt authenticates the request in place of a
    /// registered mail address.
    pub async fn create_external_session(
        &mut self,
        user_id: &str,
        passphrase: &str,
        salt: &[u8],
        client_identifier: &str,
        persist: bool,
    ) -> Result<Credentials, LoginError> {
        tracing::debug!(user = user_id, "establishing external session");
        let passphrase_key = kdf::derive_passphrase_key(passphrase, salt, self.config.key_length)?;

        let (request, encrypted_password) = build_session_request(
            None,
            Some(user_id.to_string()),
            Some(verifier::external_auth_token(salt)),
            client_identifier,
            &passphrase_key,
            passphrase,
            persist,
        )?;

        let response = self.api.create_session(&request).await?;
        self.wait_for_second_factor(&response).await?;
        self.init_session(
            &response.user_id,
            &response.access_token,
            &passphrase_key,
            SessionKind::External,
            persist,
        )
        .await?;

        Ok(Credentials {
            mail_address: None,
            user_id: response.user_id,
            access_token: response.access_token,
            encrypted_password,
        })
    }

    /// Resume a session from persisted credentials.
    ///
    /// The session record is located purely through the token-derived
    /// address; the stored passphrase is decrypted with the record's
    /// access key and the passphrase key re-derived. External sessions
    /// pass the salt they were invited with. The resumed session is
    /// always marked persistent.
    pub async fn resume_session(
        &mut self,
        credentials: &Credentials,
        external_salt: Option<&[u8]>,
    ) -> Result<(), LoginError> {
        let address = SessionAddress::from_access_token(&credentials.access_token)?;
        let record = self
            .api
            .load_session(&credentials.access_token, &address)
            .await?;

        let encrypted_password = credentials.encrypted_password.as_deref().ok_or_else(|| {
            LoginError::Storage("credentials carry no stored password".into())
        })?;
        let access_key_bytes = STANDARD
            .decode(&record.access_key)
            .map_err(|_| LoginError::Crypto("malformed access key".into()))?;
        let access_key = SymmetricKey::from_bytes(&access_key_bytes)?;
        let blob = STANDARD
            .decode(encrypted_password)
            .map_err(|_| LoginError::Crypto("malformed password blob".into()))?;
        let password_bytes = Zeroizing::new(wrap::decrypt_bytes(&access_key, &blob)?);
        let passphrase = std::str::from_utf8(&password_bytes)
            .map_err(|_| LoginError::Crypto("stored password is not valid utf-8".into()))?;

        let (salt, kind) = match external_salt {
            Some(salt) => (salt.to_vec(), SessionKind::External),
            None => {
                let mail_address = credentials.mail_address.as_deref().ok_or_else(|| {
                    LoginError::Storage("credentials carry no mail address".into())
                })?;
                (self.api.fetch_salt(mail_address).await?, SessionKind::Internal)
            }
        };
        let passphrase_key = kdf::derive_passphrase_key(passphrase, &salt, self.config.key_length)?;

        self.init_session(
            &record.user_id,
            &credentials.access_token,
            &passphrase_key,
            kind,
            true,
        )
        .await
    }

    /// Tear down the active session. No-op when logged out.
    ///
    /// The event stream is closed before anything else so no push update
    /// can race the teardown. Entropy persistence and (for
    /// non-persistent sessions) server-side deletion are best-effort;
    /// the state reset is unconditional.
    pub async fn logout(&mut self) -> Result<(), LoginError> {
        if !self.is_logged_in() {
            return Ok(());
        }
        tracing::debug!("logging out");

        self.bus.close().await;

        if let Some(access_token) = self.state.access_token.clone() {
            self.persist_entropy(&access_token).await;

            if !self.state.persistent_session {
                if let Err(err) = self.delete_session(&access_token).await {
                    tracing::warn!(error = %err, "session deletion during logout failed");
                }
            }
        }

        self.state.clear();
        Ok(())
    }

    /// Delete the session identified by `access_token`, which may differ
    /// from the active one. A token the server already invalidated
    /// counts as success; the session is gone either way.
    pub async fn delete_session(&self, access_token: &str) -> Result<(), LoginError> {
        let address = SessionAddress::from_access_token(access_token)?;
        match self.api.delete_session(access_token, &address).await {
            Ok(()) | Err(LoginError::Unauthenticated) => Ok(()),
            Err(err) => Err(err),
        }
    }

    /// Change the active user's password.
    ///
    /// Proves knowledge of the old password through its verifier,
    /// re-wraps the user-group key under the new passphrase key, and
    /// records the new verifier as pending until the transport's
    /// request-signing hook adopts it.
    pub async fn change_password(
        &mut self,
        old_passphrase: &str,
        new_passphrase: &str,
    ) -> Result<(), LoginError> {
        let (salt_b64, user_group_id) = {
            let user = self
                .state
                .current_user
                .as_ref()
                .ok_or(LoginError::Unauthenticated)?;
            (user.salt.clone(), user.user_group.group.clone())
        };
        let access_token = self
            .state
            .access_token
            .clone()
            .ok_or(LoginError::Unauthenticated)?;

        let old_salt = STANDARD
            .decode(&salt_b64)
            .map_err(|_| LoginError::Crypto("malformed user salt".into()))?;
        let old_key = kdf::derive_passphrase_key(old_passphrase, &old_salt, self.config.key_length)?;

        let new_salt: [u8; SALT_SIZE] = courier_crypto::generate_random_bytes();
        let new_key = kdf::derive_passphrase_key(new_passphrase, &new_salt, self.config.key_length)?;
        let new_verifier = verifier::auth_verifier_b64(&new_key);

        let user_group_key = self.group_key(&user_group_id)?;
        let request = ChangePasswordRequest {
            old_verifier: verifier::auth_verifier_b64(&old_key),
            salt: STANDARD.encode(new_salt),
            new_verifier: new_verifier.clone(),
            pwd_enc_user_group_key: STANDARD.encode(wrap::encrypt_key(&new_key, &user_group_key)?),
        };

        self.api.change_password(&access_token, &request).await?;
        self.state.pending_auth_verifier = Some(new_verifier);
        tracing::info!("password changed; new verifier pending adoption");
        Ok(())
    }

    /// React to a server-pushed entity update. Updates naming the active
    /// user's User or GroupInfo record refresh the cached snapshot
    /// wholesale; everything else is the concern of other consumers.
    pub async fn entity_event_received(&mut self, update: &EntityUpdate) -> Result<(), LoginError> {
        match update.type_ref {
            EntityTypeRef::User => {
                let concerns_us = self
                    .state
                    .current_user
                    .as_ref()
                    .is_some_and(|user| user.id == update.id);
                if !concerns_us {
                    return Ok(());
                }
                let access_token = self
                    .state
                    .access_token
                    .clone()
                    .ok_or(LoginError::Unauthenticated)?;
                let user = self.api.load_user(&access_token, &update.id).await?;
                self.state.current_user = Some(user);
            }
            EntityTypeRef::GroupInfo => {
                let concerns_us = self
                    .state
                    .current_user_group_info
                    .as_ref()
                    .is_some_and(|info| info.group == update.id);
                if !concerns_us {
                    return Ok(());
                }
                let access_token = self
                    .state
                    .access_token
                    .clone()
                    .ok_or(LoginError::Unauthenticated)?;
                let info = self.api.load_group_info(&access_token, &update.id).await?;
                self.state.current_user_group_info = Some(info);
            }
            EntityTypeRef::Unknown => {}
        }
        Ok(())
    }

    async fn wait_for_second_factor(
        &self,
        response: &CreateSessionResponse,
    ) -> Result<(), LoginError> {
        if response.challenges.is_empty() {
            return Ok(());
        }
        tracing::info!(
            challenges = response.challenges.len(),
            "session gated behind second factor"
        );
        self.events
            .send(LoginEvent::SecondFactorPending(response.challenges.clone()))
            .ok();

        let poller = SecondFactorPoller::new(self.config.poll);
        let (_cancel_tx, mut cancel_rx) = watch::channel(false);
        poller
            .await_approval(&self.api, &response.access_token, &mut cancel_rx)
            .await?;

        self.events.send(LoginEvent::SecondFactorApproved).ok();
        Ok(())
    }

    /// Shared tail of every establishment flow.
    ///
    /// Steps run strictly in order: user load → group-key unwrap →
    /// group-info load → entropy restore → receive-info notification →
    /// stream connect. Any failure resets the whole state before the
    /// error re-raises; re-entry for a different user is a hard error
    /// that leaves the existing session untouched.
    async fn init_session(
        &mut self,
        user_id: &str,
        access_token: &str,
        passphrase_key: &SymmetricKey,
        kind: SessionKind,
        persistent: bool,
    ) -> Result<(), LoginError> {
        if let Some(active) = &self.state.current_user {
            if active.id != user_id {
                return Err(LoginError::StateConflict {
                    active: active.id.clone(),
                    requested: user_id.to_string(),
                });
            }
            tracing::debug!(user = user_id, "re-initializing active session");
        }

        match self
            .try_init(user_id, access_token, passphrase_key, kind, persistent)
            .await
        {
            Ok(()) => Ok(()),
            Err(err) => {
                tracing::warn!(error = %err, "session initialization failed; resetting state");
                self.reset().await;
                Err(err)
            }
        }
    }

    async fn try_init(
        &mut self,
        user_id: &str,
        access_token: &str,
        passphrase_key: &SymmetricKey,
        kind: SessionKind,
        persistent: bool,
    ) -> Result<(), LoginError> {
        let user = self.api.load_user(access_token, user_id).await?;

        let wrapped = STANDARD
            .decode(&user.user_group.sym_enc_group_key)
            .map_err(|_| LoginError::Crypto("malformed wrapped user-group key".into()))?;
        let user_group_key = wrap::decrypt_key(passphrase_key, &wrapped)?;
        self.state
            .group_keys
            .seed(&user.user_group.group, user_group_key.clone());

        let group_info = self
            .api
            .load_group_info(access_token, &user.user_group.group)
            .await?;

        self.state.access_token = Some(access_token.to_string());
        self.state.session_kind = kind;
        self.state.persistent_session = persistent;
        self.state.current_user = Some(user);
        self.state.current_user_group_info = Some(group_info);

        self.restore_entropy(access_token, &user_group_key).await;

        if kind == SessionKind::Internal {
            self.api.notify_receive_info(access_token).await?;
        }

        self.bus.connect(user_id, access_token).await?;
        Ok(())
    }

    /// Mix persisted entropy into the pool. Entropy is an optimization:
    /// a missing or undecryptable blob is logged and ignored.
    async fn restore_entropy(&mut self, access_token: &str, user_group_key: &SymmetricKey) {
        match self.api.load_entropy(access_token).await {
            Ok(Some(blob)) => match wrap::decrypt_bytes(user_group_key, &blob) {
                Ok(entropy) => self.entropy.feed(&entropy),
                Err(err) => {
                    tracing::warn!(error = %err, "persisted entropy failed to decrypt; ignoring");
                }
            },
            Ok(None) => {}
            Err(err) => tracing::warn!(error = %err, "could not load persisted entropy"),
        }
    }

    /// Encrypt a pool snapshot under the user-group key and store it.
    /// Best-effort: failures are logged, never fatal.
    async fn persist_entropy(&mut self, access_token: &str) {
        let user_group_key = {
            let Some(user) = self.state.current_user.as_ref() else {
                return;
            };
            match self.state.group_keys.key_for(user, &user.user_group.group) {
                Ok(key) => key.clone(),
                Err(err) => {
                    tracing::warn!(error = %err, "user-group key unavailable; skipping entropy persistence");
                    return;
                }
            }
        };

        let snapshot = self.entropy.snapshot();
        match wrap::encrypt_bytes(&user_group_key, &snapshot) {
            Ok(blob) => {
                if let Err(err) = self.api.store_entropy(access_token, &blob).await {
                    tracing::warn!(error = %err, "entropy persistence failed");
                }
            }
            Err(err) => tracing::warn!(error = %err, "entropy snapshot encryption failed"),
        }
    }

    /// Full state reset: close the stream, then drop every piece of
    /// session state.
    async fn reset(&mut self) {
        self.bus.close().await;
        self.state.clear();
    }
}

fn build_session_request(
    mail_address: Option<String>,
    user_id: Option<String>,
    auth_token: Option<String>,
    client_identifier: &str,
    passphrase_key: &SymmetricKey,
    passphrase: &str,
    persist: bool,
) -> Result<(CreateSessionRequest, Option<String>), LoginError> {
    let (access_key, encrypted_password) = if persist {
        let access_key = SymmetricKey::generate(KeyLength::Bits256);
        let blob = wrap::encrypt_bytes(&access_key, passphrase.as_bytes())?;
        (
            Some(STANDARD.encode(access_key.as_bytes())),
            Some(STANDARD.encode(blob)),
        )
    } else {
        (None, None)
    };

    Ok((
        CreateSessionRequest {
            mail_address,
            user_id,
            client_identifier: client_identifier.to_string(),
            auth_verifier: verifier::auth_verifier_b64(passphrase_key),
            access_key,
            auth_token,
        },
        encrypted_password,
    ))
}
