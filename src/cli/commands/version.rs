//! Version command implementation

use super::CommandStatus;
use crate::cli::Output;
use anyhow::Result;

/// Execute the version command
pub async fn execute(output: &Output) -> Result<CommandStatus> {
    if output.is_quiet() {
        println!("{}", crate::VERSION);
        return Ok(CommandStatus::Success);
    }

    output.header(&format!("{} v{}", crate::PKG_NAME, crate::VERSION));
    output.key_value("Description:", crate::PKG_DESCRIPTION, false);

    output.category("Supported content");
    output.key_value("Plain text:", "raw bytes", false);
    output.key_value("Paginated:", "PDF", false);
    output.key_value("Archives:", "ZIP (incl. DOCX/XLSX/ODT containers)", false);
    output.key_value("Markup:", "XML", false);

    output.category("Build Information");
    output.key_value("Target:", std::env::consts::ARCH, false);
    output.key_value(
        "Profile:",
        if cfg!(debug_assertions) { "debug" } else { "release" },
        false,
    );
    output.key_value("CPU cores:", &num_cpus::get().to_string(), false);
    output.blank_line();

    Ok(CommandStatus::Success)
}
