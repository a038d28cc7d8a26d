//! Immutable rule store.
//!
//! `RuleStore` validates a `RulesConfig` once, indexes every domain by name
//! and compiles the declarative tables into directed `ConstraintEdge`s.
//! After construction nothing is mutated, so a store can be shared behind
//! an `Arc` by any number of concurrent resolutions.

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::error::PromptFrameError;

use super::types::*;

type EdgeIndex = HashMap<Dimension, HashMap<String, Vec<ConstraintEdge>>>;

/// How a target value was caught by an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeMatch<'a> {
    /// Blocked by name
    Value,
    /// Blocked because its category is blocked
    Category(&'a str),
}

impl<'a> EdgeMatch<'a> {
    pub fn category(self) -> Option<&'a str> {
        match self {
            EdgeMatch::Value => None,
            EdgeMatch::Category(category) => Some(category),
        }
    }
}

/// Validated, indexed rule tables plus their compiled edges.
#[derive(Debug)]
pub struct RuleStore {
    rules: RulesConfig,
    domains: HashMap<Dimension, Vec<String>>,
    members: HashMap<Dimension, HashSet<String>>,
    cameras: HashMap<String, usize>,
    lenses: HashMap<String, usize>,
    shot_types: HashMap<String, usize>,
    depth_of_field: HashMap<String, usize>,
    atmospheres: HashMap<String, usize>,
    presets: HashMap<String, usize>,
    lighting: HashMap<String, usize>,
    directors: HashMap<String, usize>,
    locations: HashMap<String, usize>,
    subjects: HashMap<String, usize>,
    edges: EdgeIndex,
}

impl RuleStore {
    /// Build a store from parsed rules.
    ///
    /// Dangling references are logged and otherwise ignored.
    ///
    /// # Arguments
    /// * `rules` - Rule configuration (typically from `default_rules()` or `load_rules()`)
    ///
    /// # Returns
    /// * `Ok(RuleStore)` - Validated store with every rule family compiled into edges
    /// * `Err(PromptFrameError::Rules)` - On duplicate names within a dimension, or when
    ///   the default depth of field / aspect ratio are missing from their domains
    pub fn new(rules: RulesConfig) -> Result<Self, PromptFrameError> {
        let domains = collect_domains(&rules);

        let mut members = HashMap::new();
        for (dimension, values) in &domains {
            members.insert(*dimension, unique_names(*dimension, values)?);
        }

        if !members[&Dimension::DepthOfField].contains(&rules.defaults.depth_of_field) {
            return Err(PromptFrameError::Rules(format!(
                "Default depth of field '{}' is not a depth_of_field entry",
                rules.defaults.depth_of_field
            )));
        }
        if !members[&Dimension::AspectRatio].contains(&rules.defaults.aspect_ratio) {
            return Err(PromptFrameError::Rules(format!(
                "Default aspect ratio '{}' is not listed in domains.aspect_ratios",
                rules.defaults.aspect_ratio
            )));
        }

        let edges = compile_edges(&rules);
        let store = Self {
            cameras: position_index(rules.cameras.iter().map(|c| &c.name)),
            lenses: position_index(rules.lenses.iter().map(|l| &l.name)),
            shot_types: position_index(rules.shot_types.iter().map(|s| &s.name)),
            depth_of_field: position_index(rules.depth_of_field.iter().map(|d| &d.name)),
            atmospheres: position_index(rules.atmospheres.iter().map(|a| &a.name)),
            presets: position_index(rules.visual_presets.iter().map(|p| &p.name)),
            lighting: position_index(rules.lighting.iter().map(|l| &l.name)),
            directors: position_index(rules.directors.iter().map(|d| &d.name)),
            locations: position_index(rules.locations.iter().map(|l| &l.name)),
            subjects: position_index(rules.subjects.iter().map(|s| &s.name)),
            rules,
            domains,
            members,
            edges,
        };
        store.check_references();

        let edge_count: usize = store
            .edges
            .values()
            .flat_map(|by_value| by_value.values())
            .map(Vec::len)
            .sum();
        debug!("Compiled {} constraint edges", edge_count);

        Ok(store)
    }

    /// Store built from the embedded default rules.
    pub fn with_default_rules() -> Result<Self, PromptFrameError> {
        Self::new(super::rules::default_rules())
    }

    pub fn rules(&self) -> &RulesConfig {
        &self.rules
    }

    pub fn policy(&self) -> &StackingPolicy {
        &self.rules.stacking
    }

    pub fn defaults(&self) -> &Defaults {
        &self.rules.defaults
    }

    // --- Domains ---

    /// All values of a dimension in authored order.
    pub fn domain(&self, dimension: Dimension) -> &[String] {
        self.domains
            .get(&dimension)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Whether `value` is a known (non-custom) value of `dimension`.
    pub fn contains(&self, dimension: Dimension, value: &str) -> bool {
        self.members
            .get(&dimension)
            .is_some_and(|set| set.contains(value))
    }

    // --- Edges ---

    /// Outgoing edges of a value.
    ///
    /// # Arguments
    /// * `dimension` - Dimension the value belongs to
    /// * `value` - Listed value name
    ///
    /// # Returns
    /// Every compiled edge leaving `value`, across all rule families. Unknown
    /// values have none.
    pub fn lookup(&self, dimension: Dimension, value: &str) -> &[ConstraintEdge] {
        self.edges
            .get(&dimension)
            .and_then(|by_value| by_value.get(value))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Whether `edge` blocks `value` in its target dimension.
    ///
    /// Unknown values are never blocked, and exemptions only lift category
    /// blocks: a value named explicitly stays blocked.
    pub fn match_edge(&self, edge: &ConstraintEdge, value: &str) -> Option<EdgeMatch<'_>> {
        if !self.contains(edge.target, value) {
            return None;
        }
        if edge.values.contains(value) {
            return Some(EdgeMatch::Value);
        }
        if edge.exempt.contains(value) {
            return None;
        }
        self.category_of(edge.target, value)
            .filter(|category| edge.categories.contains(*category))
            .map(EdgeMatch::Category)
    }

    /// Category of a value: camera class, lens class, location category,
    /// atmosphere era or lighting classification.
    pub fn category_of(&self, dimension: Dimension, value: &str) -> Option<&str> {
        match dimension {
            Dimension::Camera => self.camera(value)?.category.as_deref(),
            Dimension::Lens => self.lens(value)?.category.as_deref(),
            Dimension::Location => self.location(value)?.category.as_deref(),
            Dimension::Atmosphere => self.atmosphere(value)?.era.as_deref(),
            Dimension::Lighting => self.lighting(value)?.classification.as_deref(),
            _ => None,
        }
    }

    // --- Typed accessors ---

    pub fn camera(&self, name: &str) -> Option<&CameraSpec> {
        self.cameras.get(name).map(|&i| &self.rules.cameras[i])
    }

    pub fn camera_category(&self, name: &str) -> Option<&CameraCategoryRules> {
        let category = self.camera(name)?.category.as_deref()?;
        self.rules.camera_categories.get(category)
    }

    pub fn lens(&self, name: &str) -> Option<&LensSpec> {
        self.lenses.get(name).map(|&i| &self.rules.lenses[i])
    }

    pub fn shot_type(&self, name: &str) -> Option<&ShotTypeSpec> {
        self.shot_types.get(name).map(|&i| &self.rules.shot_types[i])
    }

    pub fn depth_of_field(&self, name: &str) -> Option<&DepthOfFieldSpec> {
        self.depth_of_field
            .get(name)
            .map(|&i| &self.rules.depth_of_field[i])
    }

    pub fn atmosphere(&self, name: &str) -> Option<&AtmosphereSpec> {
        self.atmospheres.get(name).map(|&i| &self.rules.atmospheres[i])
    }

    pub fn preset(&self, name: &str) -> Option<&VisualPresetSpec> {
        self.presets.get(name).map(|&i| &self.rules.visual_presets[i])
    }

    pub fn lighting(&self, name: &str) -> Option<&LightingSpec> {
        self.lighting.get(name).map(|&i| &self.rules.lighting[i])
    }

    pub fn director(&self, name: &str) -> Option<&DirectorSpec> {
        self.directors.get(name).map(|&i| &self.rules.directors[i])
    }

    pub fn location(&self, name: &str) -> Option<&LocationSpec> {
        self.locations.get(name).map(|&i| &self.rules.locations[i])
    }

    pub fn subject(&self, name: &str) -> Option<&SubjectSpec> {
        self.subjects.get(name).map(|&i| &self.rules.subjects[i])
    }

    // --- Derived rules ---

    /// Style weights asserted by a value, if its dimension carries any.
    pub fn styles(&self, dimension: Dimension, value: &str) -> Option<&StyleWeights> {
        match dimension {
            Dimension::Director => self.director(value).map(|d| &d.styles),
            Dimension::Atmosphere => self.atmosphere(value).map(|a| &a.styles),
            Dimension::VisualPreset => self.preset(value).map(|p| &p.styles),
            Dimension::Lighting => self.lighting(value).map(|l| &l.styles),
            Dimension::DepthOfField => self.depth_of_field(value).map(|d| &d.styles),
            _ => None,
        }
    }

    /// Lens constraint of a camera. Per-camera settings beat the category
    /// default, and a fixed lens beats a zoom at the same level.
    pub fn lens_override(&self, camera: &str) -> LensOverride {
        let Some(spec) = self.camera(camera) else {
            return LensOverride::Free;
        };
        if let Some(lens) = &spec.fixed_lens {
            return LensOverride::Fixed(lens.clone());
        }
        if let Some(zoom) = &spec.zoom_options {
            return LensOverride::Zoom(zoom.clone());
        }
        match self.camera_category(camera) {
            Some(CameraCategoryRules {
                fixed_lens: Some(lens),
                ..
            }) => LensOverride::Fixed(lens.clone()),
            Some(CameraCategoryRules {
                zoom_options: Some(zoom),
                ..
            }) => LensOverride::Zoom(zoom.clone()),
            _ => LensOverride::Free,
        }
    }

    /// Aspect ratios a camera can shoot; None means unrestricted.
    pub fn allowed_aspect_ratios(&self, camera: &str) -> Option<&[String]> {
        let spec = self.camera(camera)?;
        if let Some(ratios) = &spec.aspect_ratios {
            return Some(ratios);
        }
        self.camera_category(camera)?
            .aspect_ratios
            .as_deref()
    }

    /// Whether the location's era rules out the atmosphere's era.
    pub fn era_blocks(&self, location: &str, atmosphere: &str) -> bool {
        let location_era = self.location(location).and_then(|l| l.era.as_deref());
        let atmosphere_era = self.atmosphere(atmosphere).and_then(|a| a.era.as_deref());
        match (location_era, atmosphere_era) {
            (Some(location_era), Some(atmosphere_era)) => self
                .rules
                .era_conflicts
                .get(location_era)
                .is_some_and(|eras| eras.iter().any(|e| e == atmosphere_era)),
            _ => false,
        }
    }

    /// Whether a lighting style's indoor/outdoor requirement contradicts
    /// the location.
    pub fn setting_blocks(&self, location: &str, lighting: &str) -> bool {
        match (self.location(location), self.lighting(lighting)) {
            (Some(location), Some(lighting)) => {
                !location.setting.compatible_with(lighting.setting)
            }
            _ => false,
        }
    }

    pub fn is_neutral_depth_of_field(&self, value: &str) -> bool {
        self.rules.defaults.depth_of_field == value
    }

    pub fn neutral_presets(&self) -> Vec<&str> {
        self.rules
            .visual_presets
            .iter()
            .filter(|p| p.neutral)
            .map(|p| p.name.as_str())
            .collect()
    }

    /// Classify a subject: table entry when known, keyword inference for
    /// free text.
    pub fn subject_profile(&self, subject: &str) -> SubjectProfile {
        if let Some(spec) = self.subject(subject) {
            return SubjectProfile {
                human_like: spec.human_like,
                third_person: spec.third_person,
                settings: spec.settings.clone(),
            };
        }

        let lowered = subject.to_lowercase();
        let words: HashSet<&str> = lowered
            .split(|c: char| !c.is_alphanumeric() && c != '\'')
            .filter(|w| !w.is_empty())
            .collect();
        let inference = &self.rules.subject_inference;
        let first_person = inference
            .first_person_markers
            .iter()
            .any(|m| words.contains(m.as_str()));
        let human_like = first_person
            || inference
                .human_keywords
                .iter()
                .any(|k| words.contains(k.as_str()));

        SubjectProfile {
            human_like,
            third_person: !first_person,
            settings: Vec::new(),
        }
    }

    /// Log references to values or categories the tables don't define.
    fn check_references(&self) {
        for by_value in self.edges.values() {
            for edge in by_value.values().flatten() {
                for value in edge.values.iter().chain(edge.exempt.iter()) {
                    if !self.contains(edge.target, value) {
                        warn!(
                            "{} '{}' references unknown {} '{}'",
                            edge.source, edge.source_value, edge.target, value
                        );
                    }
                }
                let known = self.known_categories(edge.target);
                for category in &edge.categories {
                    if !known.contains(category.as_str()) {
                        warn!(
                            "{} '{}' references unknown {} category '{}'",
                            edge.source, edge.source_value, edge.target, category
                        );
                    }
                }
            }
        }

        for camera in &self.rules.cameras {
            if let Some(category) = &camera.category {
                if !self.rules.camera_categories.contains_key(category) {
                    debug!(
                        "Camera '{}' has category '{}' with no rules table",
                        camera.name, category
                    );
                }
            }
        }
    }

    fn known_categories(&self, dimension: Dimension) -> HashSet<&str> {
        self.domain(dimension)
            .iter()
            .filter_map(|value| self.category_of(dimension, value))
            .collect()
    }
}

fn collect_domains(rules: &RulesConfig) -> HashMap<Dimension, Vec<String>> {
    fn names<T>(items: &[T], name: impl Fn(&T) -> &String) -> Vec<String> {
        items.iter().map(|item| name(item).clone()).collect()
    }

    HashMap::from([
        (Dimension::Camera, names(&rules.cameras, |c| &c.name)),
        (Dimension::Lens, names(&rules.lenses, |l| &l.name)),
        (Dimension::ShotType, names(&rules.shot_types, |s| &s.name)),
        (Dimension::DepthOfField, names(&rules.depth_of_field, |d| &d.name)),
        (Dimension::AspectRatio, rules.domains.aspect_ratios.clone()),
        (Dimension::Atmosphere, names(&rules.atmospheres, |a| &a.name)),
        (Dimension::VisualPreset, names(&rules.visual_presets, |p| &p.name)),
        (Dimension::Lighting, names(&rules.lighting, |l| &l.name)),
        (Dimension::Director, names(&rules.directors, |d| &d.name)),
        (Dimension::Location, names(&rules.locations, |l| &l.name)),
        (Dimension::Subject, names(&rules.subjects, |s| &s.name)),
        (Dimension::ColorPalette, rules.domains.color_palettes.clone()),
        (Dimension::Gaze, rules.domains.gazes.clone()),
        (Dimension::Pose, rules.domains.poses.clone()),
    ])
}

fn unique_names(dimension: Dimension, values: &[String]) -> Result<HashSet<String>, PromptFrameError> {
    let mut seen = HashSet::with_capacity(values.len());
    for value in values {
        if !seen.insert(value.clone()) {
            return Err(PromptFrameError::Rules(format!(
                "Duplicate {} '{}'",
                dimension, value
            )));
        }
    }
    Ok(seen)
}

fn position_index<'a>(names: impl Iterator<Item = &'a String>) -> HashMap<String, usize> {
    names.enumerate().map(|(i, name)| (name.clone(), i)).collect()
}

fn add_edge(edges: &mut EdgeIndex, edge: ConstraintEdge) {
    if edge.is_empty() {
        return;
    }
    edges
        .entry(edge.source)
        .or_default()
        .entry(edge.source_value.clone())
        .or_default()
        .push(edge);
}

fn value_edge(
    source: Dimension,
    source_value: &str,
    target: Dimension,
    kind: EdgeKind,
    values: &[String],
    reason: String,
) -> ConstraintEdge {
    let mut edge = ConstraintEdge::new(source, source_value, target, kind, reason);
    edge.values.extend(
        values
            .iter()
            .filter(|v| source != target || v.as_str() != source_value)
            .cloned(),
    );
    edge
}

fn camera_reverse_edge(
    source: Dimension,
    source_value: &str,
    categories: &[String],
    exempt: &[String],
    reason: String,
) -> ConstraintEdge {
    let mut edge = ConstraintEdge::new(
        source,
        source_value,
        Dimension::Camera,
        EdgeKind::Reverse,
        reason,
    );
    edge.categories.extend(categories.iter().cloned());
    edge.exempt.extend(exempt.iter().cloned());
    edge
}

/// Turn every authored table into outgoing edges keyed by source value.
fn compile_edges(rules: &RulesConfig) -> EdgeIndex {
    use Dimension::*;

    let mut edges = EdgeIndex::new();

    for camera in &rules.cameras {
        let Some(category) = camera.category.as_deref() else {
            continue;
        };
        let Some(category_rules) = rules.camera_categories.get(category) else {
            continue;
        };
        let name = camera.name.as_str();
        add_edge(
            &mut edges,
            value_edge(
                Camera,
                name,
                Atmosphere,
                EdgeKind::CameraCategory,
                &category_rules.blocked_atmospheres,
                format!("{} ({} camera) can't sell this atmosphere", name, category),
            ),
        );
        add_edge(
            &mut edges,
            value_edge(
                Camera,
                name,
                VisualPreset,
                EdgeKind::CameraCategory,
                &category_rules.blocked_presets,
                format!("{} cameras like {} can't render this film look", category, name),
            ),
        );
        add_edge(
            &mut edges,
            value_edge(
                Camera,
                name,
                DepthOfField,
                EdgeKind::CameraCategory,
                &category_rules.blocked_depth_of_field,
                format!("{} ({}) can't produce this depth of field", name, category),
            ),
        );
    }

    for location in &rules.locations {
        let Some(category) = location.category.as_deref() else {
            continue;
        };
        let Some(category_rules) = rules.location_categories.get(category) else {
            continue;
        };
        let name = location.name.as_str();
        add_edge(
            &mut edges,
            value_edge(
                Location,
                name,
                Atmosphere,
                EdgeKind::LocationCategory,
                &category_rules.blocked_atmospheres,
                format!("a {} location like {} doesn't fit this atmosphere", category, name),
            ),
        );
        add_edge(
            &mut edges,
            value_edge(
                Location,
                name,
                Lighting,
                EdgeKind::LocationCategory,
                &category_rules.blocked_lighting,
                format!("{} ({}) has no plausible source for this light", name, category),
            ),
        );
    }

    for director in &rules.directors {
        let name = director.name.as_str();
        let reason = format!("outside {}'s visual language", name);
        for (target, values) in [
            (Atmosphere, &director.blocked_atmospheres),
            (VisualPreset, &director.blocked_presets),
            (Camera, &director.blocked_cameras),
            (Lens, &director.blocked_lenses),
        ] {
            add_edge(
                &mut edges,
                value_edge(Director, name, target, EdgeKind::Director, values, reason.clone()),
            );
        }
    }

    for atmosphere in &rules.atmospheres {
        let name = atmosphere.name.as_str();
        add_edge(
            &mut edges,
            camera_reverse_edge(
                Atmosphere,
                name,
                &atmosphere.blocked_camera_categories,
                &atmosphere.exempt_cameras,
                format!("{{category}} cameras can't sell the {} atmosphere", name),
            ),
        );
        add_edge(
            &mut edges,
            value_edge(
                Atmosphere,
                name,
                Lighting,
                EdgeKind::Atmosphere,
                &atmosphere.redundant_lighting,
                format!("redundant: the {} atmosphere already implies this light", name),
            ),
        );
        add_edge(
            &mut edges,
            value_edge(
                Atmosphere,
                name,
                ShotType,
                EdgeKind::Atmosphere,
                &atmosphere.blocked_shot_types,
                format!("this framing works against the {} atmosphere", name),
            ),
        );
        add_edge(
            &mut edges,
            value_edge(
                Atmosphere,
                name,
                DepthOfField,
                EdgeKind::Atmosphere,
                &atmosphere.blocked_depth_of_field,
                format!("this depth of field works against the {} atmosphere", name),
            ),
        );
    }

    for preset in &rules.visual_presets {
        let name = preset.name.as_str();
        add_edge(
            &mut edges,
            camera_reverse_edge(
                VisualPreset,
                name,
                &preset.blocked_camera_categories,
                &preset.exempt_cameras,
                format!("the {} look can't come from {{category}} cameras", name),
            ),
        );
        add_edge(
            &mut edges,
            value_edge(
                VisualPreset,
                name,
                VisualPreset,
                EdgeKind::PresetExclusion,
                &preset.excludes,
                format!("can't be combined with the {} preset", name),
            ),
        );
    }

    for shot in &rules.shot_types {
        let name = shot.name.as_str();
        let mut lens = ConstraintEdge::new(
            ShotType,
            name,
            Lens,
            EdgeKind::ShotGrammar,
            format!("{{category}} lenses are unusual for the {} framing", name),
        );
        lens.categories.extend(shot.blocked_lens_categories.iter().cloned());
        lens.severity = BlockSeverity::Soft;
        add_edge(&mut edges, lens);

        let mut depth = value_edge(
            ShotType,
            name,
            DepthOfField,
            EdgeKind::ShotGrammar,
            &shot.blocked_depth_of_field,
            format!("this depth of field fights the {} framing", name),
        );
        depth.severity = BlockSeverity::Soft;
        add_edge(&mut edges, depth);
    }

    edges
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compat::default_rules;

    fn make_store() -> RuleStore {
        RuleStore::new(default_rules()).expect("default rules are valid")
    }

    #[test]
    fn test_lookup_unknown_value_is_empty() {
        let store = make_store();
        assert!(store.lookup(Dimension::Camera, "Nonexistent Cam").is_empty());
        assert!(store.lookup(Dimension::Gaze, "eyes closed").is_empty());
    }

    #[test]
    fn test_camera_lookup_carries_category_edges() {
        let store = make_store();
        let edges = store.lookup(Dimension::Camera, "Polaroid SX-70");
        let atmosphere = edges
            .iter()
            .find(|e| e.target == Dimension::Atmosphere)
            .expect("instant cameras block atmospheres");
        assert_eq!(atmosphere.kind, EdgeKind::CameraCategory);
        assert!(atmosphere.values.contains("cyberpunk"));
        assert!(atmosphere.reason.contains("instant"));
    }

    #[test]
    fn test_reverse_edge_respects_exemption() {
        let store = make_store();
        let edge = store
            .lookup(Dimension::Atmosphere, "cyberpunk")
            .iter()
            .find(|e| e.target == Dimension::Camera)
            .unwrap();

        assert_eq!(
            store.match_edge(edge, "Holga 120N"),
            Some(EdgeMatch::Category("vintage-lofi"))
        );
        assert_eq!(store.match_edge(edge, "Lomo LC-A"), None);
        assert_eq!(store.match_edge(edge, "ARRI Alexa 65"), None);
    }

    #[test]
    fn test_match_edge_ignores_unknown_targets() {
        let store = make_store();
        let edge = store
            .lookup(Dimension::Director, "Wes Anderson")
            .iter()
            .find(|e| e.target == Dimension::Camera)
            .unwrap();
        assert_eq!(store.match_edge(edge, "GoPro HERO12"), Some(EdgeMatch::Value));
        assert_eq!(store.match_edge(edge, "my custom rig"), None);
    }

    #[test]
    fn test_shot_grammar_edges_are_soft() {
        let store = make_store();
        let edges = store.lookup(Dimension::ShotType, "extreme close-up");
        assert!(!edges.is_empty());
        assert!(edges.iter().all(|e| e.severity == BlockSeverity::Soft));
        assert!(edges.iter().all(|e| e.kind == EdgeKind::ShotGrammar));
    }

    #[test]
    fn test_preset_exclusion_never_blocks_itself() {
        let store = make_store();
        for preset in store.domain(Dimension::VisualPreset) {
            for edge in store.lookup(Dimension::VisualPreset, preset) {
                assert!(!edge.values.contains(preset), "{} excludes itself", preset);
            }
        }
    }

    #[test]
    fn test_lens_override_priority() {
        let store = make_store();
        assert_eq!(
            store.lens_override("Sony RX1R II"),
            LensOverride::Fixed("35mm Sonnar equivalent".to_string())
        );
        assert_eq!(
            store.lens_override("Fujifilm X100V"),
            LensOverride::Fixed("23mm Fujinon (35mm equivalent)".to_string())
        );
        match store.lens_override("Google Pixel 8 Pro") {
            LensOverride::Zoom(options) => assert!(options.contains(&"5x telephoto".to_string())),
            other => panic!("expected zoom, got {:?}", other),
        }
        assert_eq!(store.lens_override("ARRI Alexa 65"), LensOverride::Free);
        assert_eq!(store.lens_override("unknown"), LensOverride::Free);
    }

    #[test]
    fn test_allowed_aspect_ratios() {
        let store = make_store();
        assert_eq!(
            store.allowed_aspect_ratios("Hasselblad 500C/M"),
            Some(&["1:1".to_string()][..])
        );
        assert_eq!(
            store.allowed_aspect_ratios("Mamiya RZ67").map(|r| r.len()),
            Some(3)
        );
        assert!(store.allowed_aspect_ratios("RED V-Raptor").is_none());
    }

    #[test]
    fn test_era_and_setting_blocks() {
        let store = make_store();
        assert!(store.era_blocks("medieval castle courtyard", "cyberpunk"));
        assert!(!store.era_blocks("medieval castle courtyard", "dreamy"));
        assert!(!store.era_blocks("Sahara desert dunes", "cyberpunk"));

        assert!(store.setting_blocks("cozy coffee shop", "golden hour sun"));
        assert!(store.setting_blocks("Sahara desert dunes", "candlelight"));
        assert!(!store.setting_blocks("Parisian cafe terrace", "candlelight"));
        assert!(!store.setting_blocks("cozy coffee shop", "soft diffused"));
    }

    #[test]
    fn test_category_of() {
        let store = make_store();
        assert_eq!(store.category_of(Dimension::Camera, "Leica M6"), Some("classic-film"));
        assert_eq!(store.category_of(Dimension::Lens, "100mm macro"), Some("macro"));
        assert_eq!(store.category_of(Dimension::Atmosphere, "film noir"), Some("1940s"));
        assert_eq!(store.category_of(Dimension::Atmosphere, "dreamy"), None);
        assert_eq!(store.category_of(Dimension::Camera, "custom rig"), None);
    }

    #[test]
    fn test_subject_profile_inference() {
        let store = make_store();

        let known = store.subject_profile("a red fox in fresh snow");
        assert!(!known.human_like);
        assert_eq!(known.settings, vec![Setting::Outdoor]);

        let first_person = store.subject_profile("I'm running through rain");
        assert!(first_person.human_like);
        assert!(!first_person.third_person);

        let third_person = store.subject_profile("an old man feeding pigeons");
        assert!(third_person.human_like);
        assert!(third_person.third_person);

        let object = store.subject_profile("a rusted lighthouse");
        assert!(!object.human_like);
        assert!(object.third_person);
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let mut rules = default_rules();
        let duplicate = rules.cameras[0].clone();
        rules.cameras.push(duplicate);

        match RuleStore::new(rules) {
            Err(PromptFrameError::Rules(msg)) => assert!(msg.contains("Duplicate camera")),
            other => panic!("expected duplicate error, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_missing_default_depth_of_field_rejected() {
        let mut rules = default_rules();
        rules.defaults.depth_of_field = "bokeh soup".to_string();
        assert!(RuleStore::new(rules).is_err());
    }

    #[test]
    fn test_neutral_presets() {
        let store = make_store();
        let neutral = store.neutral_presets();
        assert!(neutral.contains(&"none"));
        assert!(neutral.contains(&"clean commercial"));
        assert!(!neutral.contains(&"bleach bypass"));
    }
}
