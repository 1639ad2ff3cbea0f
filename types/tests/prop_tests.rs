use proptest::prelude::*;

use std::time::Duration;
use wicket_types::{Role, Timestamp};

proptest! {
    /// Timestamp ordering: new(a) <= new(b) iff a <= b.
    #[test]
    fn timestamp_ordering(a in 0u64..u64::MAX, b in 0u64..u64::MAX) {
        let ta = Timestamp::new(a);
        let tb = Timestamp::new(b);
        prop_assert_eq!(ta <= tb, a <= b);
        prop_assert_eq!(ta == tb, a == b);
    }

    /// duration_until is the saturating difference.
    #[test]
    fn timestamp_duration_until(base in 0u64..1_000_000, offset in 0u64..1_000_000) {
        let now = Timestamp::new(base);
        let later = Timestamp::new(base + offset);
        prop_assert_eq!(later.duration_until(now), Duration::from_millis(offset));
        prop_assert_eq!(now.duration_until(later), Duration::ZERO);
    }

    /// Expiry is inclusive: t is expired at every instant >= t.
    #[test]
    fn timestamp_expiry_inclusive(t in 0u64..1_000_000, delta in 0u64..1_000_000) {
        let ts = Timestamp::new(t);
        prop_assert!(ts.is_expired_at(Timestamp::new(t + delta)));
        if delta > 0 && t >= delta {
            prop_assert!(!ts.is_expired_at(Timestamp::new(t - delta)));
        }
    }

    /// Adding a duration never decreases a timestamp.
    #[test]
    fn timestamp_add_monotone(t in 0u64..u64::MAX / 2, ms in 0u64..1_000_000_000) {
        let ts = Timestamp::new(t);
        prop_assert!(ts + Duration::from_millis(ms) >= ts);
    }

    /// Timestamp serde round trip (plain integer on the wire).
    #[test]
    fn timestamp_serde_roundtrip(t in 0u64..u64::MAX) {
        let ts = Timestamp::new(t);
        let encoded = serde_json::to_string(&ts).unwrap();
        let expected = t.to_string();
        prop_assert_eq!(encoded.as_str(), expected.as_str());
        let decoded: Timestamp = serde_json::from_str(&encoded).unwrap();
        prop_assert_eq!(decoded, ts);
    }
}

proptest! {
    /// Role parse accepts exactly the three lowercase names.
    #[test]
    fn role_parse_rejects_garbage(s in "[a-z]{1,12}") {
        let parsed = Role::parse(&s);
        match s.as_str() {
            "user" | "admin" | "chief" => prop_assert!(parsed.is_some()),
            _ => prop_assert!(parsed.is_none()),
        }
    }
}
