// src/filter.rs
//! Suppression of the host's own built-in chirps.

use crate::config::FilterLevel;

/// Host chirp categories considered noise.
pub const LOW_VALUE_CHIRPS: &[&str] = &[
    "CHIRP_ASSISTIVE_TECHNOLOGIES",
    "CHIRP_ATTRACTIVE_CITY",
    "CHIRP_CHEAP_FLOWERS",
    "CHIRP_DAYCARE_SERVICE",
    "CHIRP_HAPPY_PEOPLE",
    "CHIRP_HIGH_TECH_LEVEL",
    "CHIRP_LOW_CRIME",
    "CHIRP_NEW_FIRE_STATION",
    "CHIRP_NEW_HOSPITAL",
    "CHIRP_NEW_MAP_TILE",
    "CHIRP_NEW_MONUMENT",
    "CHIRP_NEW_PARK",
    "CHIRP_NEW_PLAZA",
    "CHIRP_NEW_POLICE_HQ",
    "CHIRP_NEW_TILE_PLACED",
    "CHIRP_NEW_UNIVERSITY",
    "CHIRP_NEW_WIND_OR_SOLAR_PLANT",
    "CHIRP_ORGANIC_FARMING",
    "CHIRP_POLICY",
    "CHIRP_PUBLIC_TRANSPORT_EFFICIENCY",
    "CHIRP_RANDOM",
    "CHIRP_STUDENT_LODGING",
];

pub fn is_low_value(category: &str) -> bool {
    LOW_VALUE_CHIRPS.contains(&category)
}

/// Whether a host chirp of `category` should be hidden. Only low-value
/// categories are ever suppressed; `Off` keeps everything.
pub fn should_suppress(category: &str, level: FilterLevel) -> bool {
    match level {
        FilterLevel::Off => false,
        FilterLevel::LowValue | FilterLevel::LegacyAll => is_low_value(category),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_has_no_duplicates() {
        let mut v = LOW_VALUE_CHIRPS.to_vec();
        v.sort_unstable();
        v.dedup();
        assert_eq!(v.len(), LOW_VALUE_CHIRPS.len());
    }
}
