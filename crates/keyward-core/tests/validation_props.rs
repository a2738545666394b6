//! Property tests for keyward-core constructors.

use keyward_core::{ClientId, LicenseKey, Plan, MAX_CLIENT_ID_LEN, MAX_PLAN_LEN};
use proptest::prelude::*;

proptest! {
    #[test]
    fn plan_accepts_any_non_blank_within_limit(s in "[a-zA-Z0-9_-]{1,50}") {
        let plan = Plan::new(s.clone()).unwrap();
        prop_assert_eq!(plan.as_str(), s.as_str());
    }

    #[test]
    fn plan_rejects_beyond_limit(n in (MAX_PLAN_LEN + 1)..200usize) {
        prop_assert!(Plan::new("p".repeat(n)).is_err());
    }

    #[test]
    fn client_id_is_trimmed(core in "[a-z0-9]{1,40}", pad in 0usize..5) {
        let padded = format!("{}{}{}", " ".repeat(pad), core, " ".repeat(pad));
        let id = ClientId::new(padded).unwrap();
        prop_assert_eq!(id.as_str(), core.as_str());
    }

    #[test]
    fn client_id_rejects_embedded_control_chars(
        head in "[a-z0-9]{1,20}",
        ctrl in proptest::char::range('\u{0}', '\u{8}'),
        tail in "[a-z0-9]{1,20}",
    ) {
        let input = format!("{head}{ctrl}{tail}");
        prop_assert!(ClientId::new(input).is_err());
    }

    #[test]
    fn client_id_rejects_beyond_limit(n in (MAX_CLIENT_ID_LEN + 1)..400usize) {
        prop_assert!(ClientId::new("c".repeat(n)).is_err());
    }

    #[test]
    fn key_rendering_is_injective(a in proptest::array::uniform16(any::<u8>()),
                                  b in proptest::array::uniform16(any::<u8>())) {
        let ka = LicenseKey::from_bytes(&a);
        let kb = LicenseKey::from_bytes(&b);
        prop_assert_eq!(a == b, ka == kb);
    }
}
