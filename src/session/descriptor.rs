use serde::{Deserialize, Serialize};

const EPSILON: f64 = 1e-6;

/// The non-default edit parameters handed to the transcode service.
///
/// Only fields that differ from the identity edit are set, and unset fields
/// are omitted when serialized.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditDescriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trim_start: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trim_end: Option<f64>,
    /// Declarative transform of the selected filter preset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
}

impl EditDescriptor {
    /// Build from session values, dropping everything at its default
    pub fn from_edit(
        trim_start: f64,
        trim_end: f64,
        duration: f64,
        filter_transform: &str,
        volume: f64,
    ) -> Self {
        Self {
            trim_start: (trim_start.abs() > EPSILON).then_some(trim_start),
            trim_end: ((trim_end - duration).abs() > EPSILON).then_some(trim_end),
            filter: (!filter_transform.is_empty()).then(|| filter_transform.to_string()),
            volume: ((volume - 1.0).abs() > EPSILON).then_some(volume),
        }
    }

    /// True when the edit would leave the source unchanged
    pub fn is_identity(&self) -> bool {
        self.trim_start.is_none()
            && self.trim_end.is_none()
            && self.filter.is_none()
            && self.volume.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_edit() {
        let descriptor = EditDescriptor::from_edit(0.0, 30.0, 30.0, "", 1.0);
        assert!(descriptor.is_identity());
        assert_eq!(serde_json::to_string(&descriptor).unwrap(), "{}");
    }

    #[test]
    fn test_only_changed_fields_are_set() {
        let descriptor = EditDescriptor::from_edit(0.0, 30.0, 30.0, "grayscale(1)", 1.0);
        assert!(!descriptor.is_identity());

        let value = serde_json::to_value(&descriptor).unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), 1);
        assert_eq!(object["filter"], "grayscale(1)");
    }

    #[test]
    fn test_trim_and_volume() {
        let descriptor = EditDescriptor::from_edit(2.5, 20.0, 30.0, "", 0.5);
        assert_eq!(descriptor.trim_start, Some(2.5));
        assert_eq!(descriptor.trim_end, Some(20.0));
        assert_eq!(descriptor.volume, Some(0.5));
        assert_eq!(descriptor.filter, None);

        let value = serde_json::to_value(&descriptor).unwrap();
        assert_eq!(value["trimStart"], 2.5);
    }
}
