//! The live selection the wizard edits and the engine reads.

use serde::{Deserialize, Serialize};

use super::store::RuleStore;
use super::types::Dimension;

/// One optional value per dimension, plus free-text overrides for camera,
/// lens and shot type.
///
/// A non-empty custom override takes precedence over the listed value and
/// is never blocked or blocking.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Selection {
    pub subject: Option<String>,
    pub camera: Option<String>,
    pub custom_camera: Option<String>,
    pub lens: Option<String>,
    pub custom_lens: Option<String>,
    pub shot_type: Option<String>,
    pub custom_shot_type: Option<String>,
    pub depth_of_field: Option<String>,
    pub aspect_ratio: Option<String>,
    pub atmosphere: Option<String>,
    pub visual_preset: Option<String>,
    pub lighting: Option<String>,
    pub director: Option<String>,
    pub location: Option<String>,
    pub color_palette: Option<String>,
    pub gaze: Option<String>,
    pub pose: Option<String>,
}

impl Selection {
    /// A fresh selection: neutral depth of field and the default aspect
    /// ratio, everything else unset.
    pub fn with_defaults(store: &RuleStore) -> Self {
        Self {
            depth_of_field: Some(store.defaults().depth_of_field.clone()),
            aspect_ratio: Some(store.defaults().aspect_ratio.clone()),
            ..Self::default()
        }
    }

    fn slot(&self, dimension: Dimension) -> &Option<String> {
        match dimension {
            Dimension::Camera => &self.camera,
            Dimension::Lens => &self.lens,
            Dimension::ShotType => &self.shot_type,
            Dimension::DepthOfField => &self.depth_of_field,
            Dimension::AspectRatio => &self.aspect_ratio,
            Dimension::Atmosphere => &self.atmosphere,
            Dimension::VisualPreset => &self.visual_preset,
            Dimension::Lighting => &self.lighting,
            Dimension::Director => &self.director,
            Dimension::Location => &self.location,
            Dimension::Subject => &self.subject,
            Dimension::ColorPalette => &self.color_palette,
            Dimension::Gaze => &self.gaze,
            Dimension::Pose => &self.pose,
        }
    }

    fn slot_mut(&mut self, dimension: Dimension) -> &mut Option<String> {
        match dimension {
            Dimension::Camera => &mut self.camera,
            Dimension::Lens => &mut self.lens,
            Dimension::ShotType => &mut self.shot_type,
            Dimension::DepthOfField => &mut self.depth_of_field,
            Dimension::AspectRatio => &mut self.aspect_ratio,
            Dimension::Atmosphere => &mut self.atmosphere,
            Dimension::VisualPreset => &mut self.visual_preset,
            Dimension::Lighting => &mut self.lighting,
            Dimension::Director => &mut self.director,
            Dimension::Location => &mut self.location,
            Dimension::Subject => &mut self.subject,
            Dimension::ColorPalette => &mut self.color_palette,
            Dimension::Gaze => &mut self.gaze,
            Dimension::Pose => &mut self.pose,
        }
    }

    fn custom_slot_mut(&mut self, dimension: Dimension) -> Option<&mut Option<String>> {
        match dimension {
            Dimension::Camera => Some(&mut self.custom_camera),
            Dimension::Lens => Some(&mut self.custom_lens),
            Dimension::ShotType => Some(&mut self.custom_shot_type),
            _ => None,
        }
    }

    /// The listed value, ignoring any custom override.
    pub fn get(&self, dimension: Dimension) -> Option<&str> {
        self.slot(dimension).as_deref().filter(|v| !v.is_empty())
    }

    /// The custom free text for camera, lens or shot type.
    pub fn custom(&self, dimension: Dimension) -> Option<&str> {
        let custom = match dimension {
            Dimension::Camera => &self.custom_camera,
            Dimension::Lens => &self.custom_lens,
            Dimension::ShotType => &self.custom_shot_type,
            _ => return None,
        };
        custom.as_deref().map(str::trim).filter(|v| !v.is_empty())
    }

    /// The value the rule engine sees: None when a custom override is
    /// active, since free text is never subject to rules.
    pub fn engine_value(&self, dimension: Dimension) -> Option<&str> {
        if self.custom(dimension).is_some() {
            return None;
        }
        self.get(dimension)
    }

    /// The value as the prompt would use it: custom text first.
    pub fn effective(&self, dimension: Dimension) -> Option<&str> {
        self.custom(dimension).or_else(|| self.get(dimension))
    }

    pub fn is_set(&self, dimension: Dimension) -> bool {
        self.effective(dimension).is_some()
    }

    pub fn set(&mut self, dimension: Dimension, value: Option<String>) {
        *self.slot_mut(dimension) = value;
    }

    /// Set custom free text. Ignored for dimensions without a custom escape.
    pub fn set_custom(&mut self, dimension: Dimension, value: Option<String>) {
        if let Some(slot) = self.custom_slot_mut(dimension) {
            *slot = value;
        }
    }

    /// Clear both the listed value and the custom override.
    pub fn clear(&mut self, dimension: Dimension) {
        self.set(dimension, None);
        self.set_custom(dimension, None);
    }

    /// Copy a dimension (listed value and custom text) from another selection.
    pub fn copy_from(&mut self, other: &Selection, dimension: Dimension) {
        self.set(dimension, other.slot(dimension).clone());
        if dimension.accepts_custom() {
            self.set_custom(dimension, other.custom(dimension).map(str::to_string));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_custom_overrides_listed_value() {
        let mut selection = Selection::default();
        selection.set(Dimension::Camera, Some("Leica M6".to_string()));
        assert_eq!(selection.engine_value(Dimension::Camera), Some("Leica M6"));

        selection.set_custom(Dimension::Camera, Some("homemade pinhole box".to_string()));
        assert_eq!(selection.engine_value(Dimension::Camera), None);
        assert_eq!(
            selection.effective(Dimension::Camera),
            Some("homemade pinhole box")
        );
        assert_eq!(selection.get(Dimension::Camera), Some("Leica M6"));
    }

    #[test]
    fn test_blank_custom_is_ignored() {
        let mut selection = Selection::default();
        selection.set(Dimension::Lens, Some("50mm standard".to_string()));
        selection.set_custom(Dimension::Lens, Some("   ".to_string()));
        assert_eq!(selection.engine_value(Dimension::Lens), Some("50mm standard"));
    }

    #[test]
    fn test_set_custom_ignored_for_other_dimensions() {
        let mut selection = Selection::default();
        selection.set_custom(Dimension::Atmosphere, Some("moody".to_string()));
        assert_eq!(selection.custom(Dimension::Atmosphere), None);
        assert!(!selection.is_set(Dimension::Atmosphere));
    }

    #[test]
    fn test_clear_and_copy() {
        let mut source = Selection::default();
        source.set(Dimension::ShotType, Some("close-up".to_string()));
        source.set_custom(Dimension::ShotType, Some("snorricam".to_string()));

        let mut target = Selection::default();
        target.copy_from(&source, Dimension::ShotType);
        assert_eq!(target, source);

        target.clear(Dimension::ShotType);
        assert!(!target.is_set(Dimension::ShotType));
    }

    #[test]
    fn test_selection_deserialize_partial() {
        let json = r#"{ "camera": "Leica M6", "atmosphere": "film noir" }"#;
        let selection: Selection = serde_json::from_str(json).unwrap();
        assert_eq!(selection.get(Dimension::Camera), Some("Leica M6"));
        assert_eq!(selection.get(Dimension::Atmosphere), Some("film noir"));
        assert!(selection.lens.is_none());
    }
}
