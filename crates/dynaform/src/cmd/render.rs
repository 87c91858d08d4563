use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use dynaform_lib::FormDriver;
use serde_json::Value;

use crate::cmd::{FormArgs, write_output};

#[derive(Args, Debug, Clone)]
pub struct RenderArgs {
    #[command(flatten)]
    pub form: FormArgs,
    /// Render as if a submit had been attempted, so every error is shown
    #[arg(long, default_value_t = false)]
    pub submitted: bool,
    #[arg(long, value_name = "render.json")]
    pub out: Option<PathBuf>,
}

pub fn run(args: &RenderArgs) -> Result<()> {
    let mut driver = FormDriver::new(args.form.run_config()?)?;
    if let Some(patch) = &args.form.patch {
        driver.apply_patch_json(patch)?;
    }
    if args.submitted {
        driver.submit_json()?;
    }

    let payload: Value = serde_json::from_str(&driver.render_json()?)?;
    write_output(args.out.as_deref(), &serde_json::to_string_pretty(&payload)?)
}
