use std::path::{Component, Path};

use proptest::prelude::*;
use serde_json::json;

use clod::compile::claude::namespaced_filename;
use clod::security::path_policy::{safe_join, sanitize_relative};
use clod::soundpack::manifest::SoundPackManifest;
use clod::soundpack::repository::validate_slug;
use clod::soundpack::taxonomy;

proptest! {
    // =========================================================================
    // Path Safety Tests
    // =========================================================================

    #[test]
    fn test_sanitize_relative_never_panics(input in ".*") {
        let _ = sanitize_relative(&input);
    }

    #[test]
    fn test_sanitized_paths_stay_relative(input in "[a-z./\\\\]{0,24}") {
        if let Ok(clean) = sanitize_relative(&input) {
            prop_assert!(clean.components().all(|c| matches!(c, Component::Normal(_))));
        }
    }

    #[test]
    fn test_parent_segments_are_always_rejected(
        prefix in "[a-z]{0,8}",
        suffix in "[a-z]{0,8}",
    ) {
        let candidate = format!("{prefix}/../{suffix}");
        prop_assert!(sanitize_relative(&candidate).is_err());
        prop_assert!(safe_join(Path::new("/repo"), &candidate).is_err());
    }

    // =========================================================================
    // Slug and Namespacing Tests
    // =========================================================================

    #[test]
    fn test_plain_slugs_are_valid(slug in "[a-z0-9][a-z0-9_-]{0,30}") {
        prop_assert!(validate_slug(&slug).is_ok());
    }

    #[test]
    fn test_slugs_with_separators_are_invalid(
        head in "[a-z]{1,8}",
        sep in prop::sample::select(vec!["/", "\\", "\0"]),
        tail in "[a-z]{0,8}",
    ) {
        let slug = format!("{head}{sep}{tail}");
        prop_assert!(validate_slug(&slug).is_err());
    }

    #[test]
    fn test_namespaced_filename_keeps_prefix_and_basename(
        slug in "[a-z][a-z0-9-]{0,16}",
        dirs in prop::collection::vec("[a-z]{1,6}", 0..3),
        file in "[a-z]{1,10}\\.wav",
    ) {
        let mut sound_file = dirs.join("/");
        if !sound_file.is_empty() {
            sound_file.push('/');
        }
        sound_file.push_str(&file);

        let name = namespaced_filename(&slug, &sound_file);
        prop_assert_eq!(name, format!("{slug}_{file}"));
    }

    #[test]
    fn test_default_slug_has_no_spaces_or_capitals(name in "[A-Za-z][A-Za-z ]{0,23}") {
        let manifest = SoundPackManifest::from_value(&json!({ "name": name })).unwrap();
        let slug = manifest.default_slug();
        prop_assert!(!slug.contains(' '));
        prop_assert_eq!(slug.to_lowercase(), slug.clone());
    }

    // =========================================================================
    // Manifest Validation Tests
    // =========================================================================

    #[test]
    fn test_manifest_parse_never_panics(input in ".*") {
        let _ = SoundPackManifest::from_json_str(&input);
    }

    #[test]
    fn test_volume_in_range_accepted(volume in 0.0f64..=1.0f64) {
        let doc = json!({
            "name": "Range",
            "events": { "session.idle": { "sound_file": "a.wav", "volume": volume } }
        });
        prop_assert!(SoundPackManifest::from_value(&doc).is_ok());
    }

    #[test]
    fn test_volume_above_one_rejected(volume in 1.000_001f64..100.0f64) {
        let doc = json!({
            "name": "Range",
            "events": { "session.idle": { "sound_file": "a.wav", "volume": volume } }
        });
        let err = SoundPackManifest::from_value(&doc).unwrap_err();
        prop_assert!(err.has_field("events.session.idle.volume"));
    }

    // =========================================================================
    // Taxonomy Determinism Tests
    // =========================================================================

    #[test]
    fn test_reverse_mapping_is_deterministic(
        event in prop::sample::select(taxonomy::opencode_events().to_vec()),
    ) {
        let first = taxonomy::to_claude(event);
        let second = taxonomy::to_claude(event);
        prop_assert_eq!(first, second);
        if let Some(hook) = first {
            prop_assert_eq!(taxonomy::to_opencode(hook), Some(event));
        }
    }
}
