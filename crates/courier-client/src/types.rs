//! Record and wire types for the session subsystem.
//!
//! Records are server-owned; the client holds read-mostly snapshots
//! refreshed wholesale on push updates. All key material inside these
//! types is wrapped (base64 of an encrypted blob), never raw.

use serde::{Deserialize, Serialize};

/// Credentials persisted client-side for session resumption.
///
/// `encrypted_password` is the passphrase encrypted under a random
/// per-login access key. Neither the raw passphrase nor the derived key
/// is ever stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    /// Mail address for internal users; absent for external sessions.
    pub mail_address: Option<String>,
    pub user_id: String,
    pub access_token: String,
    /// Base64 of the wrapped passphrase; present only for persistent logins.
    pub encrypted_password: Option<String>,
}

/// Account classes distinguished by the login flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    Free,
    Paid,
    /// Anonymous recipient authenticated through a shared salt.
    External,
}

/// Group classes a user can be a member of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupType {
    User,
    Admin,
    Mail,
    Contact,
    File,
}

/// Membership of a user in a group. The group key is wrapped under the
/// user-group key (or, for the user group itself, under the passphrase
/// key).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupMembership {
    pub group: String,
    pub group_type: GroupType,
    /// Base64 of the wrapped group key.
    pub sym_enc_group_key: String,
}

/// The user record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    /// Base64 of the salt for passphrase key derivation.
    pub salt: String,
    pub user_group: GroupMembership,
    pub memberships: Vec<GroupMembership>,
    pub account_type: AccountType,
}

/// Metadata record for the user's own group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupInfo {
    pub group: String,
    pub name: String,
    pub mail_address: Option<String>,
}

/// Session-creation request payload.
#[derive(Debug, Clone, Serialize)]
pub struct CreateSessionRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mail_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub client_identifier: String,
    pub auth_verifier: String,
    /// Base64 access key, sent only when credentials are persisted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_key: Option<String>,
    /// Salt-hash token authenticating an external recipient.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
}

/// Session-creation response payload.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSessionResponse {
    pub access_token: String,
    pub user_id: String,
    /// Second-factor challenges still pending; empty when the session is
    /// immediately usable.
    #[serde(default)]
    pub challenges: Vec<Challenge>,
}

/// A pending second-factor challenge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Challenge {
    #[serde(rename = "type")]
    pub challenge_type: String,
}

/// The stored session record, addressed by the token-derived id pair.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionRecord {
    pub user_id: String,
    /// Base64 access key used to decrypt the stored password blob.
    pub access_key: String,
}

/// Password-change request payload.
#[derive(Debug, Clone, Serialize)]
pub struct ChangePasswordRequest {
    pub old_verifier: String,
    /// Base64 of the freshly generated salt.
    pub salt: String,
    pub new_verifier: String,
    /// Base64 of the user-group key re-wrapped under the new passphrase key.
    pub pwd_enc_user_group_key: String,
}

/// Entity classes the facade reacts to on the push channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityTypeRef {
    User,
    GroupInfo,
    /// Anything this component does not consume.
    #[serde(other)]
    Unknown,
}

/// A server-pushed entity update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityUpdate {
    pub type_ref: EntityTypeRef,
    pub id: String,
}
