use schemars::schema_for;
use serde_json::json;

use dynaform_spec::spec::field::ColorFormat;
use dynaform_spec::{
    FieldConfig, FieldFamily, FieldKind, FormConfig, FormLayout, FormValue, NativeValueKind,
    RuleKind, ValueTransformer, common,
};

fn fixture() -> &'static str {
    include_str!("fixtures/profile_form.json")
}

#[test]
fn form_config_roundtrip() {
    let parsed: FormConfig = serde_json::from_str(fixture()).expect("deserialize");
    let serialized = serde_json::to_string_pretty(&parsed).expect("serialize");
    let re_parsed: FormConfig = serde_json::from_str(&serialized).expect("roundtrip");
    assert_eq!(parsed, re_parsed);
}

#[test]
fn fixture_fields_dispatch_on_type_tag() {
    let config: FormConfig = serde_json::from_str(fixture()).expect("deserialize");
    assert_eq!(config.layout, FormLayout::Grid);
    assert_eq!(config.submit_label(), "Save");
    assert_eq!(config.cancel_label(), "Cancel");
    assert_eq!(config.reset_label(), "Reset");

    let name = config.field("name").expect("name field");
    assert_eq!(name.kind.type_name(), "text");
    assert_eq!(name.kind.as_text().and_then(|text| text.max_length), Some(40));
    assert!(name.kind.as_numeric().is_none());
    assert!(name.is_required());
    assert_eq!(name.validators[1].kind, RuleKind::MinLength);

    let age = config.field("age").expect("age field");
    assert_eq!(age.kind.family(), FieldFamily::Numeric);
    assert_eq!(age.default_value, Some(FormValue::Number(30.0)));
    let numeric = age.kind.as_numeric().expect("numeric options");
    assert!(numeric.show_buttons());
    assert_eq!(numeric.step(), 1.0);

    let country = config.field("country").expect("country field");
    let select = country.kind.as_select().expect("select options");
    assert!(select.filterable());
    assert_eq!(select.option_label(), "label");
    assert_eq!(select.option_value(), "value");
    assert_eq!(select.enabled_options().count(), 2);
    assert_eq!(country.placeholder_text(), "Select an option");
    assert_eq!(country.kind.native_value_kind(), NativeValueKind::Any);

    let birthday = config.field("birthday").expect("birthday field");
    let date = birthday.kind.as_date().expect("date options");
    assert_eq!(date.date_format(), "dd/mm/yy");
    assert!(date.min_date().is_some());
    assert!(date.max_date().is_none());
    assert!(!date.shows_time());

    let bio = config.field("bio").expect("bio field");
    let text = bio.kind.as_text().expect("text options");
    assert_eq!(text.rows(), 6);
    assert_eq!(text.cols(), 30);

    let newsletter = config.field("newsletter").expect("newsletter field");
    assert_eq!(
        newsletter.kind.as_checkbox().map(|options| options.binary()),
        Some(true)
    );

    match &config.field("rating").expect("rating field").kind {
        FieldKind::Rating(options) => assert_eq!(options.stars(), 5),
        other => panic!("expected rating, got {}", other.type_name()),
    }
    match &config.field("color").expect("color field").kind {
        FieldKind::Colorpicker(options) => assert_eq!(options.format(), ColorFormat::Rgb),
        other => panic!("expected colorpicker, got {}", other.type_name()),
    }
}

#[test]
fn unknown_type_tag_is_rejected() {
    let raw = json!({ "key": "x", "label": "X", "type": "hologram" });
    assert!(serde_json::from_value::<FieldConfig>(raw).is_err());
}

#[test]
fn malformed_options_load_and_fall_back_at_use() {
    let config: FormConfig = serde_json::from_value(json!({
        "id": "loose",
        "fields": [
            { "key": "shade", "label": "Shade", "type": "colorpicker", "format": "hsl" },
            { "key": "when", "label": "When", "type": "date", "minDate": "yesterday" }
        ]
    }))
    .expect("config loads");

    match &config.field("shade").expect("shade field").kind {
        FieldKind::Colorpicker(options) => {
            assert_eq!(options.format.as_deref(), Some("hsl"));
            assert_eq!(options.format(), ColorFormat::Hex);
        }
        other => panic!("expected colorpicker, got {}", other.type_name()),
    }
    let when = config.field("when").and_then(|field| field.kind.as_date()).expect("date options");
    assert_eq!(when.min_date.as_deref(), Some("yesterday"));
    assert!(when.min_date().is_none());
}

#[test]
fn transformers_are_not_serialized() {
    let field = FieldConfig::new("price", "Price", FieldKind::Number(Default::default()))
        .with_transformer(common::number_scale(100.0));
    let value = serde_json::to_value(&field).expect("serialize");
    assert!(value.get("transformer").is_none());
    assert_eq!(value["type"], "number");

    let parsed: FieldConfig = serde_json::from_value(value).expect("deserialize");
    assert_eq!(parsed.transformer, None::<ValueTransformer>);
}

#[test]
fn schema_compiles() {
    let schema = schema_for!(FormConfig);
    let schema_json = serde_json::to_string(&schema).expect("schema serializes");
    assert!(schema_json.starts_with('{'));
    assert!(schema_json.contains("colorpicker"));
}
