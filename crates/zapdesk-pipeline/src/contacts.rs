// SPDX-FileCopyrightText: 2026 Zapdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sticky contact-name resolution.
//!
//! Upstream channels report a contact's display name inconsistently per
//! message: present on one row, null on the next, sometimes never. The
//! resolver caches the first real name seen for each phone number and
//! returns it for the rest of the process lifetime, so the dashboard shows
//! one stable name per contact and never regresses to "unknown" after a
//! name is known.
//!
//! All state sits behind one mutex: stickiness depends on the
//! check-then-set being atomic when concurrent request handlers resolve
//! the same phone.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;
use zapdesk_core::{now_iso, ResolvedContact};

/// Cache counters for diagnostics and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverStats {
    /// Phones with an authoritative name.
    pub resolved: usize,
    /// Phones seen without a name so far.
    pub pending: usize,
}

#[derive(Debug, Default)]
struct ResolverState {
    contacts: HashMap<String, ResolvedContact>,
    pending: HashSet<String>,
}

/// Process-wide contact-name cache keyed by normalized phone number.
///
/// Constructor-injected, never a global: tests and callers own the
/// lifecycle. Entries have no expiry and are removed only by [`clear`].
///
/// [`clear`]: ContactResolver::clear
#[derive(Debug, Default)]
pub struct ContactResolver {
    state: Mutex<ResolverState>,
}

impl ContactResolver {
    pub fn new() -> Self {
        Self::default()
    }

    fn locked(&self) -> MutexGuard<'_, ResolverState> {
        // The state is plain maps; a poisoned lock still holds valid data.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Resolve the display name for a phone, establishing it if new.
    ///
    /// A cached name wins unconditionally (first resolution is sticky).
    /// Otherwise a non-empty `provided_name` becomes the authoritative name
    /// and clears any pending mark. With neither, the phone is marked
    /// pending and a non-persisted fallback is returned: the last 4
    /// characters of the phone (the whole phone if shorter). The fallback
    /// never enters the cache, so a later real name can still stick.
    pub fn resolve(
        &self,
        phone: &str,
        session_id: &str,
        provided_name: Option<&str>,
        resolved_at: Option<&str>,
    ) -> String {
        let mut state = self.locked();

        if let Some(contact) = state.contacts.get(phone) {
            return contact.display_name.clone();
        }

        let provided = provided_name.map(str::trim).filter(|n| !n.is_empty());
        if let Some(name) = provided {
            state.pending.remove(phone);
            state.contacts.insert(
                phone.to_string(),
                ResolvedContact {
                    phone: phone.to_string(),
                    display_name: name.to_string(),
                    resolved_at: resolved_at
                        .filter(|ts| !ts.is_empty())
                        .map(str::to_owned)
                        .unwrap_or_else(now_iso),
                },
            );
            debug!(phone, name, "contact name resolved");
            return name.to_string();
        }

        if state.pending.insert(phone.to_string()) {
            debug!(phone, session_id, "contact awaiting name");
        }
        suffix_fallback(phone)
    }

    /// Unconditionally overwrite the cached name (administrative override,
    /// bypasses stickiness).
    pub fn force_resolve(&self, phone: &str, name: &str) {
        let mut state = self.locked();
        state.pending.remove(phone);
        state.contacts.insert(
            phone.to_string(),
            ResolvedContact {
                phone: phone.to_string(),
                display_name: name.to_string(),
                resolved_at: now_iso(),
            },
        );
    }

    /// Read-only cache lookup; no fallback.
    pub fn resolved_name(&self, phone: &str) -> Option<String> {
        self.locked()
            .contacts
            .get(phone)
            .map(|c| c.display_name.clone())
    }

    /// Whether the phone has been seen but still lacks a name.
    pub fn is_pending(&self, phone: &str) -> bool {
        self.locked().pending.contains(phone)
    }

    pub fn stats(&self) -> ResolverStats {
        let state = self.locked();
        ResolverStats {
            resolved: state.contacts.len(),
            pending: state.pending.len(),
        }
    }

    /// Drop all cached names and pending marks (test isolation).
    pub fn clear(&self) {
        let mut state = self.locked();
        state.contacts.clear();
        state.pending.clear();
    }
}

/// Last 4 characters of the phone, or the whole phone if shorter.
fn suffix_fallback(phone: &str) -> String {
    let chars: Vec<char> = phone.chars().collect();
    if chars.len() <= 4 {
        phone.to_string()
    } else {
        chars[chars.len() - 4..].iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn first_name_wins() {
        let resolver = ContactResolver::new();
        assert_eq!(
            resolver.resolve("5511999998888", "s1", Some("Alice"), None),
            "Alice"
        );
        assert_eq!(
            resolver.resolve("5511999998888", "s1", Some("Bob"), None),
            "Alice"
        );
        assert_eq!(resolver.resolve("5511999998888", "s1", None, None), "Alice");
    }

    #[test]
    fn fallback_is_last_four_characters() {
        let resolver = ContactResolver::new();
        assert_eq!(resolver.resolve("5511999998888", "s1", None, None), "8888");
    }

    #[test]
    fn short_phone_falls_back_whole() {
        let resolver = ContactResolver::new();
        assert_eq!(resolver.resolve("123", "s1", None, None), "123");
        assert_eq!(resolver.resolve("1234", "s1", None, None), "1234");
    }

    #[test]
    fn fallback_does_not_poison_cache() {
        let resolver = ContactResolver::new();
        assert_eq!(resolver.resolve("5511999998888", "s1", None, None), "8888");
        assert_eq!(
            resolver.resolve("5511999998888", "s1", Some("Carol"), None),
            "Carol"
        );
        assert_eq!(
            resolver.resolved_name("5511999998888"),
            Some("Carol".to_string())
        );
    }

    #[test]
    fn whitespace_name_is_no_name() {
        let resolver = ContactResolver::new();
        assert_eq!(
            resolver.resolve("5511999998888", "s1", Some("   "), None),
            "8888"
        );
        assert!(resolver.is_pending("5511999998888"));
    }

    #[test]
    fn provided_name_is_trimmed() {
        let resolver = ContactResolver::new();
        assert_eq!(
            resolver.resolve("5511999998888", "s1", Some("  Dana  "), None),
            "Dana"
        );
    }

    #[test]
    fn pending_cleared_once_named() {
        let resolver = ContactResolver::new();
        resolver.resolve("5511999998888", "s1", None, None);
        assert!(resolver.is_pending("5511999998888"));
        resolver.resolve("5511999998888", "s1", Some("Eve"), None);
        assert!(!resolver.is_pending("5511999998888"));
    }

    #[test]
    fn force_resolve_bypasses_stickiness() {
        let resolver = ContactResolver::new();
        resolver.resolve("5511999998888", "s1", Some("Alice"), None);
        resolver.force_resolve("5511999998888", "Alice Silva");
        assert_eq!(
            resolver.resolved_name("5511999998888"),
            Some("Alice Silva".to_string())
        );
    }

    #[test]
    fn resolved_name_has_no_fallback() {
        let resolver = ContactResolver::new();
        assert_eq!(resolver.resolved_name("5511999998888"), None);
        resolver.resolve("5511999998888", "s1", None, None);
        assert_eq!(resolver.resolved_name("5511999998888"), None);
    }

    #[test]
    fn resolved_at_prefers_caller_timestamp() {
        let resolver = ContactResolver::new();
        resolver.resolve(
            "5511999998888",
            "s1",
            Some("Alice"),
            Some("2024-05-01T10:00:00.000Z"),
        );
        let state = resolver.locked();
        let contact = state.contacts.get("5511999998888").unwrap();
        assert_eq!(contact.resolved_at, "2024-05-01T10:00:00.000Z");
    }

    #[test]
    fn stats_counts_both_sets() {
        let resolver = ContactResolver::new();
        resolver.resolve("5511999998888", "s1", Some("Alice"), None);
        resolver.resolve("5521888887777", "s2", None, None);
        resolver.resolve("5531777776666", "s3", None, None);
        let stats = resolver.stats();
        assert_eq!(stats.resolved, 1);
        assert_eq!(stats.pending, 2);
    }

    #[test]
    fn clear_empties_everything() {
        let resolver = ContactResolver::new();
        resolver.resolve("5511999998888", "s1", Some("Alice"), None);
        resolver.resolve("5521888887777", "s2", None, None);
        resolver.clear();
        let stats = resolver.stats();
        assert_eq!(stats.resolved, 0);
        assert_eq!(stats.pending, 0);
        assert_eq!(resolver.resolved_name("5511999998888"), None);
    }

    #[test]
    fn multibyte_fallback_is_char_safe() {
        let resolver = ContactResolver::new();
        // Not a real phone, but extraction can pass through opaque tokens.
        assert_eq!(resolver.resolve("ação-útil", "s1", None, None), "útil");
    }

    #[test]
    fn concurrent_resolution_yields_one_name() {
        let resolver = Arc::new(ContactResolver::new());
        let mut handles = Vec::new();
        for i in 0..8 {
            let resolver = Arc::clone(&resolver);
            handles.push(std::thread::spawn(move || {
                resolver.resolve("5511999998888", "s1", Some(&format!("Name{i}")), None)
            }));
        }
        let names: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let winner = resolver.resolved_name("5511999998888").unwrap();
        for name in names {
            assert_eq!(name, winner);
        }
    }
}
