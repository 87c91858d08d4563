use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use dynaform_spec::{FieldConfig, FieldFamily, FormConfig, RuleKind, compile};
use serde::Serialize;

#[derive(Args, Debug, Clone)]
pub struct InspectArgs {
    /// Form definition (.json or .toml)
    #[arg(long, short = 'c', value_name = "form.json")]
    pub config: PathBuf,
    /// Emit the summary as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct FieldSummary {
    key: String,
    #[serde(rename = "type")]
    kind: &'static str,
    family: FieldFamily,
    required: bool,
    hidden: bool,
    disabled: bool,
    rules: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
struct FormSummary {
    id: String,
    title: Option<String>,
    fields: Vec<FieldSummary>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    warnings: Vec<String>,
}

pub fn run(args: &InspectArgs) -> Result<()> {
    let config = super::load_config(&args.config)?;
    let summary = summarize(&config);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    let title = summary.title.as_deref().unwrap_or("(untitled)");
    println!("form {} - {title}", summary.id);
    for field in &summary.fields {
        let mut flags = Vec::new();
        if field.required {
            flags.push("required");
        }
        if field.hidden {
            flags.push("hidden");
        }
        if field.disabled {
            flags.push("disabled");
        }
        println!(
            "  {:<20} {:<12} [{}] rules: {}",
            field.key,
            field.kind,
            flags.join(","),
            if field.rules.is_empty() {
                "-".to_string()
            } else {
                field.rules.join(",")
            }
        );
    }
    for warning in &summary.warnings {
        eprintln!("warning: {warning}");
    }
    Ok(())
}

fn summarize(config: &FormConfig) -> FormSummary {
    let mut warnings = Vec::new();
    let mut seen = std::collections::BTreeSet::new();
    let fields = config
        .fields
        .iter()
        .map(|field| {
            if !seen.insert(field.key.as_str()) {
                warnings.push(format!("duplicate field key '{}'", field.key));
            }
            warnings.extend(rule_warnings(field));
            FieldSummary {
                key: field.key.clone(),
                kind: field.kind.type_name(),
                family: field.kind.family(),
                required: field.is_required(),
                hidden: field.hidden,
                disabled: field.disabled,
                rules: field.validators.iter().map(|rule| rule.kind.as_str()).collect(),
            }
        })
        .collect();

    FormSummary {
        id: config.id.clone(),
        title: config.title.clone(),
        fields,
        warnings,
    }
}

// Custom rules are only resolvable at runtime, so they are not reported here.
fn rule_warnings(field: &FieldConfig) -> Vec<String> {
    field
        .validators
        .iter()
        .filter(|rule| rule.kind != RuleKind::Custom)
        .filter_map(|rule| compile(rule).err())
        .map(|err| format!("field '{}': {err}", field.key))
        .collect()
}
