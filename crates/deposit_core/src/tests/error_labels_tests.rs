use super::*;
use serde_json::json;

fn document(value: serde_json::Value) -> ErrorNode {
    ErrorNode::from(value)
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

#[test]
fn flattens_nested_document_depth_first() {
    let node = document(json!({
        "creators": [
            {"person_or_org": {"name": ["Name is required"]}},
            {"affiliations": [{"message": "Unknown affiliation"}]}
        ],
        "title": "Title is required"
    }));

    assert_eq!(
        flatten_errors(&node),
        strings(&["Name is required", "Unknown affiliation", "Title is required"])
    );
}

#[test]
fn flatten_skips_null_and_scalar_leaves() {
    let node = document(json!({"a": null, "b": [1, false, null], "c": {}}));
    assert!(flatten_errors(&node).is_empty());
    assert!(flatten_errors(&ErrorNode::Unrecognized).is_empty());
}

#[test]
fn labels_single_title_error() {
    let errors = document(json!({"metadata": {"title": ["Title is required"]}}));
    let labelled = label_errors(&errors, &LabelTable::default());

    assert_eq!(labelled.len(), 1);
    assert_eq!(
        labelled.get("Title"),
        Some(strings(&["Title is required"]).as_slice())
    );
}

#[test]
fn colliding_labels_merge_in_encounter_order() {
    let errors = document(json!({"metadata": {"title": ["x"], "additional_titles": ["y"]}}));
    let labelled = label_errors(&errors, &LabelTable::default());

    assert_eq!(labelled.labels(), vec!["Title"]);
    assert_eq!(labelled.get("Title"), Some(strings(&["x", "y"]).as_slice()));
}

#[test]
fn plain_pids_value_is_kept_whole() {
    let errors = document(json!({"pids": "Invalid DOI"}));
    let labelled = label_errors(&errors, &LabelTable::default());

    assert_eq!(labelled.get("PIDS"), Some(strings(&["Invalid DOI"]).as_slice()));
}

#[test]
fn keyed_pids_expand_per_scheme() {
    let errors = document(json!({"pids": {"doi": {"message": "DOI already registered"}}}));
    let labelled = label_errors(&errors, &LabelTable::default());

    assert_eq!(
        labelled.get("DOI"),
        Some(strings(&["DOI already registered"]).as_slice())
    );
}

#[test]
fn unknown_keys_fall_back_instead_of_disappearing() {
    let errors = document(json!({"metadata": {"mystery_field": ["Bad value"]}}));
    let labelled = label_errors(&errors, &LabelTable::default());

    assert_eq!(
        labelled.get(UNKNOWN_FIELD_LABEL),
        Some(strings(&["Bad value"]).as_slice())
    );
}

#[test]
fn covers_files_and_embargo_sections_and_ignores_others() {
    let errors = document(json!({
        "files": {"enabled": ["Missing uploaded files."]},
        "access": {
            "embargo": {"until": ["Embargo date must be in the future."]},
            "record": ["ignored"]
        },
        "custom_fields": {"x": ["ignored"]}
    }));
    let labelled = label_errors(&errors, &LabelTable::default());

    assert_eq!(labelled.labels(), vec!["Files", "Embargo until"]);
}

#[test]
fn absent_sections_contribute_nothing() {
    let labelled = label_errors(&ErrorNode::empty(), &LabelTable::default());
    assert!(labelled.is_empty());
}

#[test]
fn custom_labels_override_defaults() {
    let labels = LabelTable::empty().with_label("metadata.title", "Dataset name");
    let errors = document(json!({"metadata": {"title": ["required"], "version": ["bad"]}}));
    let labelled = label_errors(&errors, &labels);

    assert_eq!(labelled.labels(), vec!["Dataset name", UNKNOWN_FIELD_LABEL]);
}

#[test]
fn duplicate_messages_render_as_unique_list() {
    assert_eq!(
        render_messages(&strings(&["a", "a", "b"])),
        Rendered::List(strings(&["a", "b"]))
    );
}

#[test]
fn single_message_renders_inline() {
    assert_eq!(
        render_messages(&strings(&["only"])),
        Rendered::Inline("only".to_string())
    );
    assert_eq!(
        render_messages(&strings(&["same", "same"])),
        Rendered::Inline("same".to_string())
    );
}

#[test]
fn rendered_list_displays_one_bullet_per_line() {
    let rendered = Rendered::List(strings(&["first", "second"]));
    assert_eq!(rendered.to_string(), "- first\n- second");
}
