#![allow(missing_docs)]

pub mod control;
pub mod render;
pub mod rules;
pub mod session;
pub mod spec;
pub mod transform;
pub mod value;

pub use control::{ControlError, ControlStatus, FormControl, ValidationErrors};
pub use render::{RenderField, RenderPayload, build_render_payload, render_json};
pub use rules::{
    FALLBACK_ERROR_MESSAGE, RuleError, Validator, compile, compile_all, resolve_error_message,
};
pub use session::{FORM_ERROR_MESSAGE, FormError, FormEvent, FormSession, SubmitOutcome};
pub use spec::{
    CustomPredicate, ErrorKey, FieldConfig, FieldFamily, FieldKind, FormConfig, FormLayout,
    PredicateError, RuleKind, SelectOption, ValidationRule,
};
pub use transform::{
    TransformError, ValueTransformer, apply_in_transform, apply_out_transform, common,
};
pub use value::{
    FormData, FormValue, NativeValueKind, form_data_from_json, form_data_to_json, parse_date,
    to_iso_string,
};
