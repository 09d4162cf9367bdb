use std::sync::Arc;

use mavwire_dialect::DialectRegistry;

use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_dialects, OutputFormat};

pub fn run(format: OutputFormat, registry: Arc<DialectRegistry>) -> CliResult<i32> {
    print_dialects(&registry, format);
    Ok(SUCCESS)
}
