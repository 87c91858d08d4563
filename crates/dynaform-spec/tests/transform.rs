use proptest::prelude::*;
use time::OffsetDateTime;

use dynaform_spec::{
    FormValue, TransformError, ValueTransformer, apply_in_transform, apply_out_transform, common,
    parse_date, to_iso_string,
};

#[test]
fn missing_transformer_is_identity() {
    let value = FormValue::from("unchanged");
    assert_eq!(apply_in_transform(None, value.clone()), Ok(value.clone()));
    assert_eq!(apply_out_transform(None, value.clone()), Ok(value));
}

#[test]
fn null_values_never_reach_the_functions() {
    let exploding = ValueTransformer::new(
        |_| Err(TransformError::Failed("in called".into())),
        |_| Err(TransformError::Failed("out called".into())),
    );
    assert_eq!(
        apply_in_transform(Some(&exploding), FormValue::Null),
        Ok(FormValue::Null)
    );
    assert_eq!(
        apply_out_transform(Some(&exploding), FormValue::Null),
        Ok(FormValue::Null)
    );
}

#[test]
fn half_defined_transformer_falls_back_to_identity() {
    let inward_only =
        ValueTransformer::default().with_inward(|value| Ok(FormValue::from(format!("<{value}>"))));
    assert_eq!(
        apply_in_transform(Some(&inward_only), FormValue::from("a")),
        Ok(FormValue::from("<a>"))
    );
    assert_eq!(
        apply_out_transform(Some(&inward_only), FormValue::from("a")),
        Ok(FormValue::from("a"))
    );
}

#[test]
fn transform_errors_propagate() {
    let failing = ValueTransformer::default()
        .with_outward(|_| Err(TransformError::Failed("boom".into())))
        .named("failing");
    let err = apply_out_transform(Some(&failing), FormValue::from(1.0)).unwrap_err();
    assert_eq!(err, TransformError::Failed("boom".into()));
}

#[test]
fn number_scale_divides_in_and_multiplies_out() {
    let percent = common::number_scale(100.0);
    assert_eq!(
        apply_in_transform(Some(&percent), FormValue::from(0.5)),
        Ok(FormValue::Number(0.005))
    );
    assert_eq!(
        apply_out_transform(Some(&percent), FormValue::from(0.5)),
        Ok(FormValue::Number(50.0))
    );
    assert!(matches!(
        apply_out_transform(Some(&percent), FormValue::from("0.5")),
        Err(TransformError::UnexpectedValue { expected: "number", found: "text" })
    ));
    assert!(apply_in_transform(Some(&common::number_scale(0.0)), FormValue::from(1.0)).is_err());
}

#[test]
fn date_string_maps_invalid_dates_to_null() {
    let dates = common::date_string();
    assert_eq!(
        apply_in_transform(Some(&dates), FormValue::from("not a date")),
        Ok(FormValue::Null)
    );
    assert_eq!(
        apply_out_transform(Some(&dates), FormValue::from("garbage")),
        Ok(FormValue::Null)
    );
    assert_eq!(
        apply_in_transform(Some(&dates), FormValue::from("2024-03-01")),
        Ok(FormValue::from("2024-03-01T00:00:00.000Z"))
    );
}

#[test]
fn number_format_round_trips_through_text() {
    let fixed = common::number_format(2);
    assert_eq!(
        apply_in_transform(Some(&fixed), FormValue::from(7.12345)),
        Ok(FormValue::from("7.12"))
    );
    assert_eq!(
        apply_out_transform(Some(&fixed), FormValue::from("12.50")),
        Ok(FormValue::Number(12.5))
    );
    assert_eq!(
        apply_out_transform(Some(&fixed), FormValue::from("twelve")),
        Ok(FormValue::Null)
    );
}

#[test]
fn out_of_range_timestamps_map_to_null() {
    let stamps = common::date_timestamp();
    for millis in [1e33, -1e33, 8.64e15 * 100.0, f64::INFINITY, f64::NAN] {
        assert_eq!(
            apply_out_transform(Some(&stamps), FormValue::Number(millis)),
            Ok(FormValue::Null),
            "{millis}"
        );
    }
}

#[test]
fn number_format_precision_is_capped() {
    let fixed = common::number_format(1_000_000_000);
    let Ok(FormValue::Text(text)) = apply_in_transform(Some(&fixed), FormValue::Number(1.5)) else {
        panic!("expected text");
    };
    let decimals = text.split_once('.').map(|(_, fraction)| fraction.len());
    assert_eq!(decimals, Some(common::MAX_FIXED_DECIMALS));
}

fn date_from_millis(millis: i64) -> OffsetDateTime {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000)
        .expect("millis in range")
}

// -9999-01-01T00:00:00.000Z through 9999-12-31T23:59:59.999Z.
const MIN_MILLIS: i64 = -377_705_116_800_000;
const MAX_MILLIS: i64 = 253_402_300_799_999;

proptest! {
    #[test]
    fn iso_dates_survive_in_then_out(millis in MIN_MILLIS..=MAX_MILLIS) {
        let dates = common::date_string();
        let date = date_from_millis(millis);
        let inside = apply_in_transform(Some(&dates), FormValue::Date(date)).unwrap();
        prop_assert_eq!(&inside, &FormValue::Text(to_iso_string(date)));
        let outside = apply_out_transform(Some(&dates), inside).unwrap();
        prop_assert_eq!(outside, FormValue::Date(date));
    }

    #[test]
    fn epoch_timestamps_survive_in_then_out(millis in MIN_MILLIS..=MAX_MILLIS) {
        let stamps = common::date_timestamp();
        let date = date_from_millis(millis);
        let inside = apply_in_transform(Some(&stamps), FormValue::Date(date)).unwrap();
        prop_assert_eq!(&inside, &FormValue::Number(millis as f64));
        let outside = apply_out_transform(Some(&stamps), inside).unwrap();
        prop_assert_eq!(outside, FormValue::Date(date));
    }

    #[test]
    fn iso_strings_parse_back(millis in MIN_MILLIS..=MAX_MILLIS) {
        let date = date_from_millis(millis);
        prop_assert_eq!(parse_date(&to_iso_string(date)), Some(date));
    }
}
