//! Contracts for the external collaborators the facade drives.
//!
//! The facade never talks to the network directly: it consumes an [`Api`]
//! for the logical remote operations and an [`EventBus`] for the push
//! connection. The production implementations live in [`crate::infra`];
//! tests substitute in-memory ones.

use crate::error::LoginError;
use crate::token::SessionAddress;
use crate::types::{
    ChangePasswordRequest, CreateSessionRequest, CreateSessionResponse, GroupInfo, SessionRecord,
    User,
};

/// The logical remote operations of the session subsystem.
///
/// Every authenticated operation takes the access token explicitly; the
/// implementation carries it in a header-equivalent channel. The session
/// record's address is never sent as a stored literal; callers always
/// recompute it from the token via [`SessionAddress::from_access_token`].
#[allow(async_fn_in_trait)]
pub trait Api {
    /// Fetch the passphrase salt registered for a mail address.
    async fn fetch_salt(&self, mail_address: &str) -> Result<Vec<u8>, LoginError>;

    /// Create a session. The response may carry pending second-factor
    /// challenges.
    async fn create_session(
        &self,
        request: &CreateSessionRequest,
    ) -> Result<CreateSessionResponse, LoginError>;

    /// Ask whether a second-factor challenge is still pending.
    async fn second_factor_pending(&self, access_token: &str) -> Result<bool, LoginError>;

    /// One-time mailbox-received notification after login.
    async fn notify_receive_info(&self, access_token: &str) -> Result<(), LoginError>;

    /// Submit a password change.
    async fn change_password(
        &self,
        access_token: &str,
        request: &ChangePasswordRequest,
    ) -> Result<(), LoginError>;

    /// Load the session record stored at the token-derived address.
    async fn load_session(
        &self,
        access_token: &str,
        address: &SessionAddress,
    ) -> Result<SessionRecord, LoginError>;

    /// Delete the session stored at the token-derived address,
    /// authenticating with the very token being deleted.
    async fn delete_session(
        &self,
        access_token: &str,
        address: &SessionAddress,
    ) -> Result<(), LoginError>;

    /// Load a user record.
    async fn load_user(&self, access_token: &str, user_id: &str) -> Result<User, LoginError>;

    /// Load the group-info record of a group.
    async fn load_group_info(
        &self,
        access_token: &str,
        group_id: &str,
    ) -> Result<GroupInfo, LoginError>;

    /// Load the persisted entropy blob, if any.
    async fn load_entropy(&self, access_token: &str) -> Result<Option<Vec<u8>>, LoginError>;

    /// Persist an entropy blob.
    async fn store_entropy(&self, access_token: &str, blob: &[u8]) -> Result<(), LoginError>;
}

/// The push connection. Only its connect/close contract is consumed
/// here; message delivery is the concern of other components, which feed
/// relevant updates back through
/// [`LoginFacade::entity_event_received`](crate::facade::LoginFacade::entity_event_received).
#[allow(async_fn_in_trait)]
pub trait EventBus {
    /// Open the push connection for the given user.
    async fn connect(&mut self, user_id: &str, access_token: &str) -> Result<(), LoginError>;

    /// Close the push connection. Idempotent.
    async fn close(&mut self);
}
