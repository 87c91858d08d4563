use serde_json::json;

use dynaform_spec::{
    ControlStatus, FieldFamily, FormConfig, FormSession, FormValue, build_render_payload,
    render_json,
};

fn session() -> FormSession {
    let config: FormConfig =
        serde_json::from_str(include_str!("fixtures/profile_form.json")).expect("fixture");
    FormSession::with_config(config, None).expect("init")
}

#[test]
fn payload_lists_visible_fields_only() {
    let session = session();
    let payload = build_render_payload(&session);
    assert_eq!(payload.form_id, "profile");
    assert_eq!(payload.submit_label, "Save");
    assert_eq!(payload.cancel_label, "Cancel");
    assert_eq!(payload.reset_label.as_deref(), Some("Reset"));

    let keys: Vec<&str> = payload.fields.iter().map(|field| field.key.as_str()).collect();
    assert_eq!(
        keys,
        vec!["name", "email", "age", "country", "birthday", "newsletter", "bio", "rating", "color"]
    );

    let age = &payload.fields[2];
    assert_eq!(age.family, FieldFamily::Numeric);
    assert_eq!(age.value, FormValue::Number(30.0));
    assert_eq!(age.status, ControlStatus::Valid);

    let name = &payload.fields[0];
    assert!(name.required);
    assert_eq!(name.status, ControlStatus::Invalid);
    assert!(!name.show_error);
}

#[test]
fn errors_appear_after_a_rejected_submit() {
    let mut session = session();
    session.on_submit().expect("submit");

    let document = render_json(&build_render_payload(&session));
    assert_eq!(
        document["form_error"],
        json!("Please correct the errors before submitting.")
    );
    let fields = document["fields"].as_array().expect("fields array");
    let name = &fields[0];
    assert_eq!(name["type"], "text");
    assert_eq!(name["show_error"], true);
    assert_eq!(name["error"], "Name is required");
    assert!(name["options"].get("type").is_none());

    let country = &fields[3];
    assert_eq!(country["placeholder"], "Select an option");
    assert_eq!(country["options"]["filter"], true);
    assert_eq!(country["error"], serde_json::Value::Null);
}
