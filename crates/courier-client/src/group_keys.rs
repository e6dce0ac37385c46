//! Cache of decrypted group keys.
//!
//! Seeded with the user-group key immediately after passphrase-key
//! derivation succeeds; every other entry is unwrapped lazily from the
//! owning membership on first access and kept for the session lifetime.
//! Only the facade writes to this cache.

use std::collections::HashMap;

use base64::{engine::general_purpose::STANDARD, Engine};
use courier_crypto::{wrap, SymmetricKey};

use crate::error::LoginError;
use crate::types::User;

#[derive(Default)]
pub struct GroupKeyCache {
    keys: HashMap<String, SymmetricKey>,
}

impl GroupKeyCache {
    /// Install the user-group key. Must happen before any lookup.
    pub fn seed(&mut self, user_group_id: &str, user_group_key: SymmetricKey) {
        self.keys.insert(user_group_id.to_string(), user_group_key);
    }

    /// Return the key for a group, unwrapping and caching it on first
    /// access. Fails if the group is not among the user's memberships.
    pub fn key_for(&mut self, user: &User, group_id: &str) -> Result<&SymmetricKey, LoginError> {
        if !self.keys.contains_key(group_id) {
            let membership = user
                .memberships
                .iter()
                .find(|m| m.group == group_id)
                .ok_or_else(|| LoginError::UnknownGroup(group_id.to_string()))?;

            let user_group_key = self
                .keys
                .get(&user.user_group.group)
                .ok_or_else(|| LoginError::UnknownGroup(user.user_group.group.clone()))?
                .clone();

            let wrapped = STANDARD
                .decode(&membership.sym_enc_group_key)
                .map_err(|_| LoginError::Crypto("malformed wrapped group key".into()))?;
            let key = wrap::decrypt_key(&user_group_key, &wrapped)?;
            self.keys.insert(group_id.to_string(), key);
        }

        Ok(&self.keys[group_id])
    }

    /// Whether a key for this group is cached.
    pub fn contains(&self, group_id: &str) -> bool {
        self.keys.contains_key(group_id)
    }

    /// Drop all cached keys. Key material zeroizes on drop.
    pub fn clear(&mut self) {
        self.keys.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AccountType, GroupMembership, GroupType};
    use courier_crypto::KeyLength;

    fn user_with_mail_group(user_group_key: &SymmetricKey, mail_key: &SymmetricKey) -> User {
        let wrapped = wrap::encrypt_key(user_group_key, mail_key).unwrap();
        User {
            id: "user-1".into(),
            salt: STANDARD.encode([1u8; 16]),
            user_group: GroupMembership {
                group: "group-user".into(),
                group_type: GroupType::User,
                sym_enc_group_key: String::new(),
            },
            memberships: vec![GroupMembership {
                group: "group-mail".into(),
                group_type: GroupType::Mail,
                sym_enc_group_key: STANDARD.encode(wrapped),
            }],
            account_type: AccountType::Paid,
        }
    }

    #[test]
    fn test_lazy_unwrap_and_cache() {
        let user_group_key = SymmetricKey::generate(KeyLength::Bits256);
        let mail_key = SymmetricKey::generate(KeyLength::Bits256);
        let user = user_with_mail_group(&user_group_key, &mail_key);

        let mut cache = GroupKeyCache::default();
        cache.seed("group-user", user_group_key);
        assert!(!cache.contains("group-mail"));

        let unwrapped = cache.key_for(&user, "group-mail").unwrap();
        assert_eq!(unwrapped.as_bytes(), mail_key.as_bytes());
        assert!(cache.contains("group-mail"));
    }

    #[test]
    fn test_lookup_is_idempotent() {
        let user_group_key = SymmetricKey::generate(KeyLength::Bits256);
        let mail_key = SymmetricKey::generate(KeyLength::Bits256);
        let user = user_with_mail_group(&user_group_key, &mail_key);

        let mut cache = GroupKeyCache::default();
        cache.seed("group-user", user_group_key);
        let first = cache.key_for(&user, "group-mail").unwrap().clone();

        // Cut the membership away: a second lookup must come from the
        // cache, not a re-derivation.
        let mut stripped = user.clone();
        stripped.memberships.clear();
        let second = cache.key_for(&stripped, "group-mail").unwrap();
        assert_eq!(first.as_bytes(), second.as_bytes());
    }

    #[test]
    fn test_unknown_group_fails() {
        let user_group_key = SymmetricKey::generate(KeyLength::Bits256);
        let mail_key = SymmetricKey::generate(KeyLength::Bits256);
        let user = user_with_mail_group(&user_group_key, &mail_key);

        let mut cache = GroupKeyCache::default();
        cache.seed("group-user", user_group_key);
        let result = cache.key_for(&user, "group-calendar");
        assert!(matches!(result, Err(LoginError::UnknownGroup(g)) if g == "group-calendar"));
    }

    #[test]
    fn test_clear_drops_entries() {
        let user_group_key = SymmetricKey::generate(KeyLength::Bits256);
        let mut cache = GroupKeyCache::default();
        cache.seed("group-user", user_group_key);
        cache.clear();
        assert!(!cache.contains("group-user"));
    }
}
