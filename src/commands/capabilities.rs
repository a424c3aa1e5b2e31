//! `flip capabilities`: show what the host supports.

use crate::output::{self, OutputFormat};
use flip_core::capabilities;
use flip_core::error::AppError;

/// Execute the capabilities command
pub fn execute(format: OutputFormat) -> Result<(), AppError> {
    let caps = capabilities::detect();

    match format {
        OutputFormat::Table => {
            println!("Host capabilities:");
            output::print_kv("Background worker", yes_no(caps.has_worker_support));
            output::print_kv("Direct file reads", yes_no(caps.has_modern_file_read));
            output::print_kv("Shared memory", yes_no(caps.has_shared_memory));
            output::print_kv("Cross-origin isolated", yes_no(caps.is_cross_origin_isolated));
            output::print_kv("Logical CPUs", &caps.logical_cpus.to_string());
        }
        OutputFormat::Json => output::print_item(&caps, format),
    }

    Ok(())
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}
