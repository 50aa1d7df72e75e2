//! Integration tests for lm-mask.
//!
//! These tests verify:
//! - Absolute, partial, and wildcard paths select the right fields
//! - Masked containers are elided and siblings survive
//! - Value maskers chain in order
//! - Escaped names are addressable only through their escaped form
//! - One built masker set serves many threads

use std::sync::Arc;

use lm_mask::{
    mask_str, replay_str, EventRecorder, FieldMasker, JsonEvent, JsonWriter, MaskError, MaskValue,
    MaskerSet, MaskerSetBuilder, MaskingConfig, PathBasedFieldMasker, PathPattern, ScalarValue,
};

const NESTED: &str = r#"{"a":{"b":{"c":"x"}},"b":{"c":"y"}}"#;

fn masks(paths: &[&str]) -> MaskerSet {
    MaskerSetBuilder::new()
        .mask_paths(paths.iter().copied())
        .build()
        .unwrap()
}

// ============================================================================
// Path selection
// ============================================================================

mod paths {
    use super::*;

    #[test]
    fn absolute_path_matches_only_root_anchored_field() {
        let out = mask_str(NESTED, &masks(&["/a/b/c"])).unwrap();
        assert_eq!(out, r#"{"a":{"b":{"c":"****"}},"b":{"c":"y"}}"#);
    }

    #[test]
    fn partial_path_matches_every_suffix() {
        let out = mask_str(NESTED, &masks(&["b/c"])).unwrap();
        assert_eq!(out, r#"{"a":{"b":{"c":"****"}},"b":{"c":"****"}}"#);
    }

    #[test]
    fn single_name_matches_at_any_depth() {
        let out = mask_str(NESTED, &masks(&["c"])).unwrap();
        assert_eq!(out, r#"{"a":{"b":{"c":"****"}},"b":{"c":"****"}}"#);
    }

    #[test]
    fn wildcard_matches_any_middle_key() {
        let set = masks(&["a/*/c"]);
        for middle in ["anything", "b", "0", ""] {
            let doc = format!(r#"{{"a":{{"{}":{{"c":"x"}}}}}}"#, middle);
            let want = format!(r#"{{"a":{{"{}":{{"c":"****"}}}}}}"#, middle);
            assert_eq!(mask_str(&doc, &set).unwrap(), want);
        }
    }

    #[test]
    fn wildcard_matches_array_elements() {
        let out = mask_str(
            r#"{"cards":[{"pan":"4111"},{"pan":"5500"}]}"#,
            &masks(&["/cards/*/pan"]),
        )
        .unwrap();
        assert_eq!(out, r#"{"cards":[{"pan":"****"},{"pan":"****"}]}"#);
    }

    #[test]
    fn index_literal_selects_one_element() {
        let out = mask_str(
            r#"{"cards":[{"pan":"4111"},{"pan":"5500"}]}"#,
            &masks(&["/cards/1/pan"]),
        )
        .unwrap();
        assert_eq!(out, r#"{"cards":[{"pan":"4111"},{"pan":"****"}]}"#);
    }

    #[test]
    fn escaped_slash_addresses_literal_name() {
        let doc = r#"{"a/b":1,"a":{"b":2}}"#;
        assert_eq!(
            mask_str(doc, &masks(&["a~1b"])).unwrap(),
            r#"{"a/b":"****","a":{"b":2}}"#
        );
        assert_eq!(
            mask_str(doc, &masks(&["a/b"])).unwrap(),
            r#"{"a/b":1,"a":{"b":"****"}}"#
        );
    }

    #[test]
    fn escaped_tilde_addresses_literal_name() {
        let doc = r#"{"a~b":1}"#;
        assert_eq!(
            mask_str(doc, &masks(&["a~0b"])).unwrap(),
            r#"{"a~b":"****"}"#
        );
        assert!(MaskerSetBuilder::new().mask_path("a~b").build().is_err());
    }

    #[test]
    fn malformed_patterns_fail_at_construction() {
        for bad in ["", "/", "//"] {
            let err = PathPattern::parse(bad).unwrap_err();
            assert!(matches!(err, MaskError::InvalidPattern { .. }), "{:?}", bad);
            assert!(MaskerSetBuilder::new().mask_path(bad).build().is_err());
        }
    }
}

// ============================================================================
// Container elision
// ============================================================================

mod elision {
    use super::*;

    #[test]
    fn masked_container_emits_one_scalar_and_keeps_sibling() {
        let set = masks(&["fieldA"]);
        let mut recorder = EventRecorder::new();
        let mut transducer = set.transducer(&mut recorder);
        replay_str(
            r#"{"fieldA":{"x":1,"y":[1,2,3]},"sibling":"kept"}"#,
            &mut transducer,
        )
        .unwrap();
        assert_eq!(transducer.mask_depth(), 0);
        transducer.finish().unwrap();

        assert_eq!(recorder.field_names(), vec!["fieldA", "sibling"]);
        assert_eq!(
            recorder.scalars(),
            vec![&ScalarValue::from("****"), &ScalarValue::from("kept")]
        );
    }

    #[test]
    fn masking_does_not_leak_across_documents() {
        let set = masks(&["m"]);
        let mut transducer = set.transducer(JsonWriter::new(Vec::new()));
        replay_str(r#"{"m":{"deep":[[[{"m":1}]]]}}"#, &mut transducer).unwrap();
        assert_eq!(transducer.mask_depth(), 0);
        replay_str(r#"{"n":{"m":[1],"k":2}}"#, &mut transducer).unwrap();
        transducer.finish().unwrap();

        let out = String::from_utf8(transducer.into_sink().into_inner()).unwrap();
        assert_eq!(out, "{\"m\":\"****\"}\n{\"n\":{\"m\":\"****\",\"k\":2}}");
    }

    #[test]
    fn mask_value_kinds_are_written_as_given() {
        let set = MaskerSetBuilder::new()
            .mask_paths_with(["n"], MaskValue::Null)
            .mask_paths_with(["z"], MaskValue::Integer(0))
            .mask_paths_with(["f"], MaskValue::Bool(false))
            .build()
            .unwrap();
        let out = mask_str(r#"{"n":"a","z":[1],"f":{"g":1},"s":"null"}"#, &set).unwrap();
        assert_eq!(out, r#"{"n":null,"z":0,"f":false,"s":"null"}"#);
    }

    #[test]
    fn empty_containers_in_masked_field_are_elided() {
        let out = mask_str(r#"[{"a":{}},{"a":[]},{"a":[{}]}]"#, &masks(&["a"])).unwrap();
        assert_eq!(out, r#"[{"a":"****"},{"a":"****"},{"a":"****"}]"#);
    }
}

// ============================================================================
// Value masking
// ============================================================================

mod values {
    use super::*;

    #[test]
    fn value_maskers_chain_in_order() {
        let set = MaskerSetBuilder::new()
            .mask_values_with([r"\d+"], "#")
            .mask_values_with(["secret"], "***")
            .build()
            .unwrap();
        let out = mask_str(r#"{"msg":"id 123 secret"}"#, &set).unwrap();
        assert_eq!(out, r#"{"msg":"id # ***"}"#);
    }

    #[test]
    fn later_masker_sees_earlier_output() {
        let set = MaskerSetBuilder::new()
            .mask_values_with(["secret"], "token")
            .mask_values_with(["token"], "[t]")
            .build()
            .unwrap();
        assert_eq!(
            mask_str(r#"["secret"]"#, &set).unwrap(),
            r#"["[t]"]"#
        );
    }

    #[test]
    fn field_masked_values_skip_value_maskers() {
        let set = MaskerSetBuilder::new()
            .mask_paths_with(["pin"], "PIN")
            .mask_values_with(["PIN"], "leak")
            .build()
            .unwrap();
        assert_eq!(mask_str(r#"{"pin":1234}"#, &set).unwrap(), r#"{"pin":"PIN"}"#);
    }

    #[test]
    fn numbers_and_field_names_are_handled_separately() {
        let set = MaskerSetBuilder::new()
            .mask_values([r"^\d{9}$"])
            .build()
            .unwrap();
        let out = mask_str(r#"{"123456789":123456789,"n":42,"ok":true}"#, &set).unwrap();
        assert_eq!(out, r#"{"123456789":"****","n":42,"ok":true}"#);
    }
}

// ============================================================================
// Configuration and sharing
// ============================================================================

mod sharing {
    use super::*;

    #[test]
    fn masking_is_idempotent() {
        let set = MaskerSetBuilder::new()
            .mask_paths(["password", "/user/ssn", "cards/*/pan"])
            .mask_values([r"\b\d{3}-\d{4}\b"])
            .build()
            .unwrap();
        let doc = r#"{"user":{"ssn":"1","password":{"a":1}},"cards":[{"pan":1}],"note":"call 555-1234"}"#;
        let first = mask_str(doc, &set).unwrap();
        let second = mask_str(doc, &set).unwrap();
        assert_eq!(first, second);
        assert_eq!(mask_str(&first, &set).unwrap(), first);
    }

    #[test]
    fn name_set_and_individual_path_maskers_agree() {
        let names = ["token", "pin", "card"];
        let grouped = masks(&names);

        let mut builder = MaskerSetBuilder::new();
        for name in names {
            let masker: Arc<dyn FieldMasker> =
                Arc::new(PathBasedFieldMasker::parse(name, MaskValue::default()).unwrap());
            builder = builder.field_masker(masker);
        }
        let individual = builder.build().unwrap();

        let doc = r#"{"token":"t","a":{"pin":[1],"card":{"n":"x"}},"list":[{"cards":1}]}"#;
        assert_eq!(
            mask_str(doc, &grouped).unwrap(),
            mask_str(doc, &individual).unwrap()
        );
    }

    #[test]
    fn one_masker_set_serves_many_threads() {
        let set = Arc::new(masks(&["secret"]));
        std::thread::scope(|scope| {
            for i in 0..4 {
                let set = Arc::clone(&set);
                scope.spawn(move || {
                    let doc = format!(r#"{{"id":{},"secret":"s{}"}}"#, i, i);
                    let out = mask_str(&doc, &set).unwrap();
                    assert_eq!(out, format!(r#"{{"id":{},"secret":"****"}}"#, i));
                });
            }
        });
    }

    #[test]
    fn config_file_drives_masking() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("mask.json");
        std::fs::write(
            &path,
            r#####"{"default_mask":"<x>","paths":["password"],"value_masks":[{"values":["\\d{4}$"],"mask":"####"}]}"#####,
        )
        .unwrap();
        let set = MaskingConfig::load(&path).unwrap().builder().build().unwrap();
        let out = mask_str(r#"{"password":"p","card":"card 1234"}"#, &set).unwrap();
        assert_eq!(out, r#"{"password":"<x>","card":"card ####"}"#);
    }

    #[test]
    fn events_after_finish_start_a_new_document() {
        let set = MaskerSet::empty();
        let mut transducer = set.transducer(EventRecorder::new());
        transducer.handle(&JsonEvent::Scalar(ScalarValue::Integer(1))).unwrap();
        transducer.finish().unwrap();
        transducer.handle(&JsonEvent::string("two")).unwrap();
        transducer.finish().unwrap();
        assert_eq!(transducer.sink().scalars().len(), 2);
    }
}
