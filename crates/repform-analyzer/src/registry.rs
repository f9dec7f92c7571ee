//! Exercise registry - name → profile constructor
//!
//! Resolved once when a session starts. Lookup is case-insensitive and
//! accepts every alias a profile declares; unknown names fail fast.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use repform_core::{RepformError, RepformResult};

use crate::ExerciseProfile;

/// Builds a fresh profile for each session
pub type ProfileConstructor = Arc<dyn Fn() -> ExerciseProfile + Send + Sync>;

#[derive(Clone)]
pub struct ExerciseRegistry {
    /// Canonical name → constructor
    constructors: BTreeMap<&'static str, ProfileConstructor>,
    /// Normalized name or alias → canonical name
    names: HashMap<String, &'static str>,
}

impl ExerciseRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self {
            constructors: BTreeMap::new(),
            names: HashMap::new(),
        }
    }

    /// Registry with the built-in exercises
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(ExerciseProfile::pushup);
        registry.register(ExerciseProfile::squat);
        registry
    }

    /// Register a profile constructor under the profile's name and aliases.
    ///
    /// A later registration for the same name or alias replaces the earlier one.
    pub fn register<F>(&mut self, constructor: F)
    where
        F: Fn() -> ExerciseProfile + Send + Sync + 'static,
    {
        let sample = constructor();
        let name = sample.name;

        self.names.insert(normalize(name), name);
        for alias in &sample.aliases {
            self.names.insert(normalize(alias), name);
        }
        self.constructors.insert(name, Arc::new(constructor));
    }

    /// Canonical name for `name` or one of its aliases
    pub fn canonical_name(&self, name: &str) -> Option<&'static str> {
        self.names.get(&normalize(name)).copied()
    }

    /// Build the profile registered under `name`
    pub fn resolve(&self, name: &str) -> RepformResult<ExerciseProfile> {
        let canonical = self
            .canonical_name(name)
            .ok_or_else(|| RepformError::UnknownExercise(name.to_string()))?;
        let constructor = self
            .constructors
            .get(canonical)
            .ok_or_else(|| RepformError::UnknownExercise(name.to_string()))?;
        Ok(constructor())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.canonical_name(name).is_some()
    }

    /// Canonical names, sorted
    pub fn names(&self) -> Vec<&'static str> {
        self.constructors.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }
}

impl Default for ExerciseRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl fmt::Debug for ExerciseRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExerciseRegistry")
            .field("exercises", &self.names())
            .finish()
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Thresholds;
    use repform_core::LandmarkId;
    use repform_geometry::AngleSpec;

    fn lunge() -> ExerciseProfile {
        ExerciseProfile::new(
            "lunge",
            AngleSpec::new(
                "front_knee",
                LandmarkId::LeftHip,
                LandmarkId::LeftKnee,
                LandmarkId::LeftAnkle,
            ),
            Thresholds::new(100.0, 160.0, 5.0),
        )
        .with_aliases(&["lunges"])
    }

    #[test]
    fn test_defaults() {
        let registry = ExerciseRegistry::default();
        assert_eq!(registry.names(), vec!["pushup", "squat"]);
    }

    #[test]
    fn test_resolve_aliases_case_insensitive() {
        let registry = ExerciseRegistry::with_defaults();

        for name in ["pushup", "Push-Up", " PUSHUPS ", "push-ups"] {
            assert_eq!(registry.resolve(name).unwrap().name, "pushup", "{}", name);
        }
        assert_eq!(registry.resolve("Squats").unwrap().name, "squat");
    }

    #[test]
    fn test_unknown_exercise_fails_fast() {
        let registry = ExerciseRegistry::with_defaults();
        match registry.resolve("burpee") {
            Err(RepformError::UnknownExercise(name)) => assert_eq!(name, "burpee"),
            other => panic!("unexpected {:?}", other.map(|p| p.name)),
        }
    }

    #[test]
    fn test_register_custom_exercise() {
        let mut registry = ExerciseRegistry::new();
        assert!(registry.is_empty());

        registry.register(lunge);
        assert!(registry.contains("Lunges"));
        assert_eq!(registry.canonical_name("lunges"), Some("lunge"));
        assert_eq!(registry.resolve("lunge").unwrap().primary.name, "front_knee");
        assert!(registry.resolve("pushup").is_err());
    }
}
