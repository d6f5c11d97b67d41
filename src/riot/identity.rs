use dashmap::DashMap;

use super::{CredentialScope, Puuid};

/// Process-lifetime cache of resolved identifiers.
///
/// Riot encrypts identifiers per API key, so entries are keyed by credential scope and never
/// shared between scopes, even when both scopes happen to use the same key.
#[derive(Default)]
pub struct IdentityCache {
    entries: DashMap<IdentityKey, Puuid>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct IdentityKey {
    game_name: String,
    tag_line: String,
    scope: CredentialScope,
}

impl IdentityKey {
    fn new(game_name: &str, tag_line: &str, scope: CredentialScope) -> Self {
        Self {
            game_name: game_name.to_lowercase(),
            tag_line: tag_line.to_lowercase(),
            scope,
        }
    }
}

impl IdentityCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, game_name: &str, tag_line: &str, scope: CredentialScope) -> Option<Puuid> {
        self.entries
            .get(&IdentityKey::new(game_name, tag_line, scope))
            .map(|entry| entry.value().clone())
    }

    pub fn insert(&self, game_name: &str, tag_line: &str, scope: CredentialScope, puuid: Puuid) {
        self.entries
            .insert(IdentityKey::new(game_name, tag_line, scope), puuid);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookups_ignore_case() {
        let cache = IdentityCache::new();
        cache.insert("Faker", "KR1", CredentialScope::Lol, "puuid-lol".into());
        assert_eq!(
            cache.get("FAKER", "kr1", CredentialScope::Lol).as_deref(),
            Some("puuid-lol")
        );
    }

    #[test]
    fn scopes_never_share_entries() {
        let cache = IdentityCache::new();
        cache.insert("Faker", "KR1", CredentialScope::Lol, "puuid-lol".into());
        assert!(cache.get("Faker", "KR1", CredentialScope::Tft).is_none());

        cache.insert("Faker", "KR1", CredentialScope::Tft, "puuid-tft".into());
        assert_eq!(cache.len(), 2);
        assert_eq!(
            cache.get("Faker", "KR1", CredentialScope::Lol).as_deref(),
            Some("puuid-lol")
        );
        assert_eq!(
            cache.get("Faker", "KR1", CredentialScope::Tft).as_deref(),
            Some("puuid-tft")
        );
    }
}
