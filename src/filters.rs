//! Fixed catalog of visual filters.
//!
//! Each preset carries a declarative transform string in CSS filter syntax,
//! which is what the transcode service receives. Index 0 is the identity.

use serde::Serialize;

/// A named visual filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterPreset {
    pub name: &'static str,
    /// Empty for the identity filter
    pub transform: &'static str,
}

pub const IDENTITY_FILTER: usize = 0;

pub const FILTER_PRESETS: &[FilterPreset] = &[
    FilterPreset {
        name: "Normal",
        transform: "",
    },
    FilterPreset {
        name: "Vivid",
        transform: "saturate(1.5) contrast(1.1)",
    },
    FilterPreset {
        name: "Mono",
        transform: "grayscale(1)",
    },
    FilterPreset {
        name: "Sepia",
        transform: "sepia(0.8)",
    },
    FilterPreset {
        name: "Warm",
        transform: "sepia(0.3) saturate(1.3) hue-rotate(-10deg)",
    },
    FilterPreset {
        name: "Cool",
        transform: "saturate(1.1) hue-rotate(15deg) brightness(1.05)",
    },
    FilterPreset {
        name: "Fade",
        transform: "contrast(0.85) brightness(1.1) saturate(0.8)",
    },
    FilterPreset {
        name: "Drama",
        transform: "contrast(1.4) brightness(0.9) saturate(1.2)",
    },
];

/// Preset at `index`, None when out of range
pub fn preset(index: usize) -> Option<&'static FilterPreset> {
    FILTER_PRESETS.get(index)
}

/// Index of the preset with this name, case-insensitive
pub fn find_by_name(name: &str) -> Option<usize> {
    FILTER_PRESETS
        .iter()
        .position(|p| p.name.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_is_first() {
        let normal = preset(IDENTITY_FILTER).unwrap();
        assert_eq!(normal.name, "Normal");
        assert!(normal.transform.is_empty());
        assert!(FILTER_PRESETS[1..].iter().all(|p| !p.transform.is_empty()));
    }

    #[test]
    fn test_lookup() {
        assert_eq!(FILTER_PRESETS.len(), 8);
        assert_eq!(find_by_name("mono"), Some(2));
        assert_eq!(find_by_name("unknown"), None);
        assert!(preset(FILTER_PRESETS.len()).is_none());
    }
}
