// tests/chirp_filter.rs
use chirp_relay::config::FilterLevel;
use chirp_relay::filter::{should_suppress, LOW_VALUE_CHIRPS};

#[test]
fn low_value_categories_follow_filter_level() {
    for cat in LOW_VALUE_CHIRPS {
        assert!(!should_suppress(cat, FilterLevel::Off), "{cat} at Off");
        assert!(should_suppress(cat, FilterLevel::LowValue), "{cat} at LowValue");
        assert!(should_suppress(cat, FilterLevel::LegacyAll), "{cat} at LegacyAll");
    }
}

#[test]
fn other_categories_are_never_suppressed() {
    for cat in ["CHIRP_FIRE_HAZARD", "CHIRP_NO_WATER", "", "chirp_random"] {
        for level in [FilterLevel::Off, FilterLevel::LowValue, FilterLevel::LegacyAll] {
            assert!(!should_suppress(cat, level), "{cat} at {level:?}");
        }
    }
}
