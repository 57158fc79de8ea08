use notewell_core::error::CoreError;
use notewell_core::models::field::{
    FieldKind, FieldOption, FieldType, GapFieldConfig, GapResponseValue, validate_field_configs,
};

fn parse(value: serde_json::Value) -> Result<GapFieldConfig, serde_json::Error> {
    serde_json::from_value(value)
}

#[test]
fn select_field_parses_with_options() {
    let field = parse(serde_json::json!({
        "id": "risk",
        "field_type": "select",
        "label": "Risk level",
        "required": true,
        "options": [
            { "value": "low", "label": "Low" },
            { "value": "high", "label": "High" }
        ]
    }))
    .unwrap();

    assert_eq!(field.field_type(), FieldType::Select);
    assert!(field.required);
    assert_eq!(field.option_label("high"), Some("High"));
    assert_eq!(field.option_label("severe"), None);
}

#[test]
fn choice_fields_require_options() {
    let err = parse(serde_json::json!({
        "id": "symptoms",
        "field_type": "multiselect",
        "label": "Symptoms"
    }))
    .unwrap_err();
    assert!(err.to_string().contains("require a non-empty options list"));

    let err = parse(serde_json::json!({
        "id": "risk",
        "field_type": "select",
        "label": "Risk",
        "options": []
    }))
    .unwrap_err();
    assert!(err.to_string().contains("require a non-empty options list"));
}

#[test]
fn non_choice_fields_reject_options() {
    let err = parse(serde_json::json!({
        "id": "notes",
        "field_type": "textarea",
        "label": "Notes",
        "options": [{ "value": "a", "label": "A" }]
    }))
    .unwrap_err();
    assert!(err.to_string().contains("must not declare options"));
}

#[test]
fn duplicate_and_empty_option_values_are_rejected() {
    let err = parse(serde_json::json!({
        "id": "risk",
        "field_type": "select",
        "label": "Risk",
        "options": [
            { "value": "low", "label": "Low" },
            { "value": "low", "label": "Also low" }
        ]
    }))
    .unwrap_err();
    assert!(err.to_string().contains("duplicate option value 'low'"));

    let err = parse(serde_json::json!({
        "id": "risk",
        "field_type": "select",
        "label": "Risk",
        "options": [{ "value": " ", "label": "Blank" }]
    }))
    .unwrap_err();
    assert!(err.to_string().contains("option values must not be empty"));
}

#[test]
fn blank_id_or_label_is_rejected() {
    assert!(
        parse(serde_json::json!({ "id": "", "field_type": "text", "label": "Name" })).is_err()
    );
    assert!(
        parse(serde_json::json!({ "id": "name", "field_type": "text", "label": "  " })).is_err()
    );
}

#[test]
fn serialized_form_is_flat() {
    let field = GapFieldConfig::new(
        "frequency",
        "Frequency",
        FieldKind::Select {
            options: vec![FieldOption::new("weekly", "Weekly")],
        },
    )
    .with_placeholder("Pick one");

    let json = serde_json::to_value(&field).unwrap();
    assert_eq!(json["field_type"], "select");
    assert_eq!(json["options"][0]["value"], "weekly");
    assert_eq!(json["placeholder"], "Pick one");
    assert_eq!(json["required"], false);
    assert!(json.get("help_text").is_none());
}

#[test]
fn duplicate_field_ids_are_rejected() {
    let fields = vec![
        GapFieldConfig::new("notes", "Notes", FieldKind::Textarea),
        GapFieldConfig::new("notes", "More notes", FieldKind::Text),
    ];
    let err = validate_field_configs(&fields).unwrap_err();
    assert!(matches!(err, CoreError::InvalidFieldConfig { field_id, .. } if field_id == "notes"));
}

#[test]
fn response_values_parse_untagged() {
    let values: Vec<GapResponseValue> =
        serde_json::from_str(r#"[true, 4.5, "text", ["a", "b"]]"#).unwrap();
    assert_eq!(
        values,
        vec![
            GapResponseValue::Flag(true),
            GapResponseValue::Number(4.5),
            GapResponseValue::Text("text".to_string()),
            GapResponseValue::List(vec!["a".to_string(), "b".to_string()]),
        ]
    );
}

#[test]
fn unchecked_checkbox_is_an_answer() {
    assert!(!GapResponseValue::Flag(false).is_blank());
    assert!(GapResponseValue::Text(" \n".to_string()).is_blank());
    assert!(GapResponseValue::List(Vec::new()).is_blank());
}
