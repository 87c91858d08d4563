use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::Args;
use dynaform_lib::{FormLibError, FormRunner};
use serde_json::Value;

use crate::cmd::{FormArgs, write_output};

#[derive(Args, Debug, Clone)]
pub struct SubmitArgs {
    #[command(flatten)]
    pub form: FormArgs,
    /// Write the submitted output to a file instead of stdout
    #[arg(long, value_name = "output.json")]
    pub out: Option<PathBuf>,
}

pub fn run(args: &SubmitArgs) -> Result<()> {
    let config = args.form.run_config()?;
    match FormRunner::run(config, args.form.patch.as_deref()) {
        Ok(result) => {
            let output: Value = serde_json::from_str(&result.output_json)?;
            tracing::info!(fields = result.output.len(), "form submitted");
            write_output(args.out.as_deref(), &serde_json::to_string_pretty(&output)?)
        }
        Err(FormLibError::Invalid(errors)) => {
            for (key, message) in &errors {
                eprintln!("{key}: {message}");
            }
            bail!("form is invalid ({} field(s) with errors)", errors.len())
        }
        Err(err) => Err(err.into()),
    }
}
