use crate::cmd::SchemaArgs;
use crate::exit::{CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_layouts, OutputFormat};

pub fn run(args: SchemaArgs, format: OutputFormat) -> CliResult<i32> {
    let table = args.definitions.load_table()?;

    let mut layouts = table.layouts();
    if let Some(ids) = &args.ids {
        if let Some(missing) = ids.iter().find(|id| !table.contains(**id)) {
            return Err(CliError::new(USAGE, format!("unknown message id {missing}")));
        }
        layouts.retain(|layout| ids.contains(&layout.id()));
    }

    print_layouts(&layouts, format);
    Ok(SUCCESS)
}
