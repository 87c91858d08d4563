pub mod field;
pub mod form;
pub mod validation;

pub use field::{
    CheckboxOptions, ColorFormat, ColorOptions, DateOptions, EditorOptions, FieldConfig,
    FieldFamily, FieldKind, NumberOptions, RatingOptions, SelectOption, SelectOptions,
    TextOptions,
};
pub use form::{FormConfig, FormLayout};
pub use validation::{
    CustomPredicate, ErrorKey, PredicateError, PredicateResult, RuleKind, ValidationRule,
};
