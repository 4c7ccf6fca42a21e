//! Profile caching using Moka.
//!
//! Profiles are read on every authenticated request. Only present profiles
//! are cached, so a newly registered profile is visible immediately, and an
//! entry is dropped whenever the profile's role changes.

use moka::sync::Cache;
use std::time::Duration;

use leavedesk_shared::types::UserId;

use super::Profile;

/// Default cache capacity (number of profiles).
const DEFAULT_CACHE_CAPACITY: u64 = 10_000;

/// Default time-to-live for cache entries (60 seconds).
const DEFAULT_TTL_SECS: u64 = 60;

/// Cache of profiles keyed by user id.
#[derive(Clone)]
pub struct ProfileCache {
    cache: Cache<UserId, Profile>,
}

impl ProfileCache {
    /// Creates a profile cache with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(DEFAULT_CACHE_CAPACITY, DEFAULT_TTL_SECS)
    }

    /// Creates a profile cache with custom capacity and TTL.
    #[must_use]
    pub fn with_config(max_capacity: u64, ttl_secs: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Self { cache }
    }

    /// Returns the cached profile, if any.
    #[must_use]
    pub fn get(&self, user_id: &UserId) -> Option<Profile> {
        self.cache.get(user_id)
    }

    /// Stores a loaded profile.
    pub fn insert(&self, profile: Profile) {
        self.cache.insert(profile.user_id, profile);
    }

    /// Drops a profile, e.g. after its role or organization changed.
    pub fn invalidate(&self, user_id: &UserId) {
        self.cache.invalidate(user_id);
    }
}

impl Default for ProfileCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ProfileCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileCache")
            .field("entries", &self.cache.entry_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::Role;
    use leavedesk_shared::types::OrganizationId;

    fn profile(role: Role) -> Profile {
        Profile {
            user_id: UserId::new(),
            organization_id: OrganizationId::new(),
            role,
            email: "hr@example.com".to_string(),
            full_name: None,
        }
    }

    #[test]
    fn test_miss_then_hit() {
        let cache = ProfileCache::new();
        let profile = profile(Role::Hr);

        assert!(cache.get(&profile.user_id).is_none());
        cache.insert(profile.clone());
        assert_eq!(cache.get(&profile.user_id), Some(profile));
    }

    #[test]
    fn test_invalidate_after_role_change() {
        let cache = ProfileCache::new();
        let mut profile = profile(Role::User);
        cache.insert(profile.clone());

        profile.role = Role::TeamLead;
        cache.invalidate(&profile.user_id);
        assert!(cache.get(&profile.user_id).is_none());

        cache.insert(profile.clone());
        assert_eq!(cache.get(&profile.user_id).map(|p| p.role), Some(Role::TeamLead));
    }
}
