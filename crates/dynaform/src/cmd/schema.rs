use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use dynaform_spec::FormConfig;
use schemars::schema_for;

use crate::cmd::write_output;

#[derive(Args, Debug, Clone)]
pub struct SchemaArgs {
    /// Write the schema to a file instead of stdout
    #[arg(long, value_name = "schema.json")]
    pub out: Option<PathBuf>,
}

pub fn run(args: &SchemaArgs) -> Result<()> {
    let schema = schema_for!(FormConfig);
    write_output(args.out.as_deref(), &serde_json::to_string_pretty(&schema)?)
}
