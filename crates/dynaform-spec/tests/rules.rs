use serde_json::json;

use dynaform_spec::{
    CustomPredicate, ErrorKey, FALLBACK_ERROR_MESSAGE, FormControl, FormValue, PredicateError,
    RuleError, RuleKind, ValidationRule, Validator, compile, compile_all, resolve_error_message,
};

fn control_for(rules: &[ValidationRule], value: impl Into<FormValue>) -> FormControl {
    FormControl::new(value.into(), false, compile_all(rules))
}

#[test]
fn required_rejects_empty_input_only() {
    let rules = [ValidationRule::required("Required")];
    assert!(control_for(&rules, FormValue::Null).invalid());
    assert!(control_for(&rules, "").invalid());
    assert!(control_for(&rules, FormValue::List(vec![])).invalid());
    assert!(control_for(&rules, "x").valid());
    assert!(control_for(&rules, false).valid());
    assert!(control_for(&rules, 0.0).valid());
}

#[test]
fn non_required_rules_skip_empty_values() {
    let rules = [
        ValidationRule::min_length(3, "short"),
        ValidationRule::email("email"),
        ValidationRule::pattern("[0-9]+", "digits"),
        ValidationRule::min(10.0, "min"),
    ];
    let control = control_for(&rules, "");
    assert!(control.valid());
    assert!(control.errors().is_empty());
}

#[test]
fn length_rules_report_required_and_actual_length() {
    let rules = [
        ValidationRule::min_length(3, "too short"),
        ValidationRule::max_length(5, "too long"),
    ];
    let short = control_for(&rules, "ab");
    let error = short.errors().get(ErrorKey::MinLength).expect("minlength error");
    assert_eq!(error.detail, json!({ "requiredLength": 3, "actualLength": 2 }));

    let long = control_for(&rules, "abcdef");
    assert_eq!(long.errors().keys().collect::<Vec<_>>(), vec![ErrorKey::MaxLength]);

    // lengths count characters, not bytes
    assert!(control_for(&rules, "héé").valid());
}

#[test]
fn numeric_bounds_accept_numeric_text() {
    let rules = [ValidationRule::min(18.0, "adult"), ValidationRule::max(99.0, "max")];
    assert!(control_for(&rules, 18.0).valid());
    assert!(control_for(&rules, "17").invalid());
    let too_old = control_for(&rules, 120.0);
    let error = too_old.errors().first().expect("max error");
    assert_eq!(error.key, ErrorKey::Max);
    assert_eq!(error.detail, json!({ "max": 99.0, "actual": 120.0 }));
    // non numeric input is left to other rules
    assert!(control_for(&rules, "abc").valid());
}

#[test]
fn email_rule() {
    let rules = [ValidationRule::email("bad email")];
    assert!(control_for(&rules, "jane@example.com").valid());
    assert!(control_for(&rules, "jane.doe+tag@mail.example.org").valid());
    assert!(control_for(&rules, "jane@").invalid());
    assert!(control_for(&rules, "no-at-sign").invalid());
    assert!(control_for(&rules, "@example.com").invalid());
}

#[test]
fn pattern_is_anchored() {
    let validator = compile(&ValidationRule::pattern("[a-z]+", "lower")).expect("compiles");
    match &validator {
        Validator::Pattern { source, .. } => assert_eq!(source, "^[a-z]+$"),
        other => panic!("unexpected validator {other:?}"),
    }
    assert!(validator.validate(&FormValue::from("abc")).is_none());
    let error = validator
        .validate(&FormValue::from("abc1"))
        .expect("partial match fails");
    assert_eq!(
        error.detail,
        json!({ "requiredPattern": "^[a-z]+$", "actualValue": "abc1" })
    );
}

#[test]
fn compile_rejects_malformed_rules() {
    let missing = ValidationRule {
        kind: RuleKind::MinLength,
        value: None,
        message: "x".into(),
        validator: None,
    };
    assert!(matches!(compile(&missing), Err(RuleError::MissingValue { .. })));

    let negative = ValidationRule {
        value: Some(json!(-1)),
        ..missing.clone()
    };
    assert!(matches!(compile(&negative), Err(RuleError::InvalidValue { .. })));

    let bad_pattern = ValidationRule::pattern("(", "broken");
    assert!(matches!(compile(&bad_pattern), Err(RuleError::Pattern(_))));

    let custom: ValidationRule = serde_json::from_value(json!({
        "type": "custom",
        "message": "needs a predicate"
    }))
    .expect("deserialize");
    assert!(matches!(compile(&custom), Err(RuleError::MissingPredicate)));

    // broken rules are skipped, the rest still apply
    let compiled = compile_all(&[bad_pattern, ValidationRule::required("Required")]);
    assert_eq!(compiled.len(), 1);
    assert_eq!(compiled[0].error_key(), ErrorKey::Required);
}

#[test]
fn first_failing_rule_message_wins() {
    let rules = [
        ValidationRule::required("Name is required"),
        ValidationRule::pattern("[A-Z].*", "Must start with a capital"),
    ];
    let control = control_for(&rules, FormValue::Null);
    assert_eq!(resolve_error_message(&control, &rules), "Name is required");

    let rules = [
        ValidationRule::min_length(5, "At least five"),
        ValidationRule::pattern("[A-Z].*", "Must start with a capital"),
    ];
    let control = control_for(&rules, "abc");
    assert_eq!(control.errors().len(), 2);
    assert_eq!(resolve_error_message(&control, &rules), "At least five");
}

#[test]
fn message_resolution_edge_cases() {
    let rules = [ValidationRule::required("Required")];
    let valid = control_for(&rules, "ok");
    assert_eq!(resolve_error_message(&valid, &rules), "");

    let invalid = control_for(&rules, "");
    assert_eq!(resolve_error_message(&invalid, &[]), FALLBACK_ERROR_MESSAGE);
}

#[test]
fn custom_predicates() {
    let even = CustomPredicate::from_fn(|value| {
        value.as_f64().is_some_and(|number| number % 2.0 == 0.0)
    });
    let rules = [ValidationRule::custom(even, "Must be even")];
    assert!(control_for(&rules, 4.0).valid());
    let odd = control_for(&rules, 3.0);
    let error = odd.errors().first().expect("custom error");
    assert_eq!(error.key, ErrorKey::Custom);
    assert_eq!(error.detail, json!("Must be even"));
    assert_eq!(resolve_error_message(&odd, &rules), "Must be even");
}

#[test]
fn throwing_predicate_counts_as_failure() {
    let broken = CustomPredicate::fallible(|_| Err(PredicateError("lookup failed".into())));
    let rules = [ValidationRule::custom(broken, "Could not verify")];
    let control = control_for(&rules, "anything");
    assert!(control.invalid());
    assert!(control.errors().contains(ErrorKey::Custom));
}

#[test]
fn disabled_controls_are_never_invalid() {
    let rules = [ValidationRule::required("Required")];
    let mut control = FormControl::new(FormValue::Null, true, compile_all(&rules));
    assert!(control.disabled());
    assert!(control.errors().is_empty());
    assert!(!control.invalid());

    control.set_disabled(false);
    assert!(control.invalid());
}

#[tokio::test]
async fn async_predicate_keeps_control_pending_until_settled() {
    let taken = CustomPredicate::from_future(|value: FormValue| async move {
        tokio::task::yield_now().await;
        Ok::<_, PredicateError>(value.as_str() != Some("admin"))
    });
    let rules = [
        ValidationRule::required("Required"),
        ValidationRule::custom(taken, "Username taken"),
    ];

    let mut free = control_for(&rules, "jane");
    assert!(free.pending());
    assert!(free.has_async_validators());
    assert!(free.settle().await == dynaform_spec::ControlStatus::Valid);

    let mut taken = control_for(&rules, "admin");
    assert!(taken.pending());
    taken.settle().await;
    assert!(taken.invalid());
    assert_eq!(resolve_error_message(&taken, &rules), "Username taken");

    // a synchronous failure short-circuits the pending state
    let empty = control_for(&rules, "");
    assert!(empty.invalid());
    assert_eq!(resolve_error_message(&empty, &rules), "Required");
}
