//! Freshness policy applied by the expiry monitor

use crate::types::{CredentialSet, EpochMillis, StoredCredentials};

/// Outcome of judging the stored credentials
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Nothing stored
    Absent,
    /// Usable as-is, no network call
    Fresh(CredentialSet),
    /// Within the margin, lapsed, or malformed
    NeedsRefresh,
}

/// Judge stored credentials, in order: absent, fresh, needs refresh.
///
/// A set is fresh while `now <= expires_at - margin_ms`. A set without an
/// identity token or without an expiry is malformed and needs a refresh.
#[must_use]
pub fn evaluate(stored: Option<&StoredCredentials>, now: EpochMillis, margin_ms: i64) -> Verdict {
    let Some(stored) = stored.filter(|s| !s.is_absent()) else {
        return Verdict::Absent;
    };

    match stored.to_credential_set() {
        Some(set) if now <= set.expires_at.saturating_sub(margin_ms) => Verdict::Fresh(set),
        _ => Verdict::NeedsRefresh,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: EpochMillis = 1_700_000_000_000;
    const MARGIN: i64 = 60_000;

    fn stored(expires_at: Option<EpochMillis>) -> StoredCredentials {
        StoredCredentials {
            identity_token: Some("t1".into()),
            access_token: Some("t1".into()),
            refresh_token: Some("r1".into()),
            expires_at,
        }
    }

    #[test]
    fn test_nothing_stored_is_absent() {
        assert_eq!(evaluate(None, NOW, MARGIN), Verdict::Absent);
        let empty = StoredCredentials::default();
        assert_eq!(evaluate(Some(&empty), NOW, MARGIN), Verdict::Absent);
    }

    #[test]
    fn test_just_inside_margin_refreshes() {
        let s = stored(Some(NOW + 59_999));
        assert_eq!(evaluate(Some(&s), NOW, MARGIN), Verdict::NeedsRefresh);
    }

    #[test]
    fn test_just_outside_margin_is_fresh() {
        let s = stored(Some(NOW + 60_001));
        assert!(matches!(evaluate(Some(&s), NOW, MARGIN), Verdict::Fresh(_)));
    }

    #[test]
    fn test_exactly_at_margin_is_fresh() {
        let s = stored(Some(NOW + 60_000));
        assert!(matches!(evaluate(Some(&s), NOW, MARGIN), Verdict::Fresh(_)));
    }

    #[test]
    fn test_lapsed_refreshes() {
        let s = stored(Some(NOW - 1_000));
        assert_eq!(evaluate(Some(&s), NOW, MARGIN), Verdict::NeedsRefresh);
    }

    #[test]
    fn test_missing_expiry_refreshes() {
        let s = stored(None);
        assert_eq!(evaluate(Some(&s), NOW, MARGIN), Verdict::NeedsRefresh);
    }

    #[test]
    fn test_refresh_token_only_refreshes() {
        let s = StoredCredentials {
            refresh_token: Some("r1".into()),
            ..StoredCredentials::default()
        };
        assert_eq!(evaluate(Some(&s), NOW, MARGIN), Verdict::NeedsRefresh);
    }
}
