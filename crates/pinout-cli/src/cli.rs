use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};
use pinout_core::{ExportFormat, ExportRequest, GlobalOptions};

#[derive(Parser, Debug)]
#[command(
    name = "pinout",
    author,
    version,
    about = "Export a poetry lock file as pinned requirements",
    disable_help_subcommand = true
)]
#[allow(clippy::struct_excessive_bools)]
pub struct PinoutCli {
    #[arg(
        short,
        long,
        help = "Suppress human output (errors still print to stderr)",
        global = true
    )]
    pub quiet: bool,
    #[arg(
        short,
        long,
        action = ArgAction::Count,
        help = "Increase logging (-vv reaches trace)",
        global = true
    )]
    pub verbose: u8,
    #[arg(long, help = "Force trace logging regardless of -v", global = true)]
    pub trace: bool,
    #[arg(
        long,
        help = "Emit {status,message,details} JSON envelopes",
        global = true
    )]
    pub json: bool,
    #[arg(long, help = "Disable colored human output", global = true)]
    pub no_color: bool,
    #[arg(
        short = 'C',
        long,
        value_name = "PATH",
        help = "Look for the project in this directory instead of the current one",
        global = true
    )]
    pub directory: Option<PathBuf>,
    #[command(subcommand)]
    pub command: CommandKind,
}

impl PinoutCli {
    pub fn global_options(&self) -> GlobalOptions {
        GlobalOptions {
            quiet: self.quiet,
            verbose: self.verbose,
            trace: self.trace,
            json: self.json,
            no_color: self.no_color,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum CommandKind {
    #[command(about = "Export the lock file to another format")]
    Export(ExportArgs),
}

impl CommandKind {
    pub fn name(&self) -> &'static str {
        match self {
            CommandKind::Export(_) => "export",
        }
    }
}

#[derive(Args, Debug)]
#[allow(clippy::struct_excessive_bools)]
pub struct ExportArgs {
    #[arg(
        short,
        long,
        value_name = "FORMAT",
        default_value_t = ExportFormat::RequirementsTxt.to_string(),
        help = "Format to export to (constraints.txt, requirements.txt)"
    )]
    pub format: String,
    #[arg(
        short,
        long,
        value_name = "PATH",
        help = "File to write; the export is printed to stdout when omitted"
    )]
    pub output: Option<PathBuf>,
    #[arg(long, help = "Leave out the --hash options")]
    pub without_hashes: bool,
    #[arg(long, help = "Leave out the index URL header")]
    pub without_urls: bool,
    #[arg(long, help = "Leave out environment markers")]
    pub without_markers: bool,
    #[arg(long, help = "Embed source credentials in index URLs")]
    pub with_credentials: bool,
    #[arg(
        short = 'E',
        long,
        value_name = "EXTRAS",
        action = ArgAction::Append,
        help = "Extras to include (comma or space separated)"
    )]
    pub extras: Vec<String>,
    #[arg(long, conflicts_with = "extras", help = "Include every declared extra")]
    pub all_extras: bool,
    #[arg(
        long = "with",
        value_name = "GROUPS",
        action = ArgAction::Append,
        help = "Optional dependency groups to include"
    )]
    pub with_groups: Vec<String>,
    #[arg(
        long = "without",
        value_name = "GROUPS",
        action = ArgAction::Append,
        help = "Dependency groups to leave out"
    )]
    pub without_groups: Vec<String>,
    #[arg(
        long = "only",
        value_name = "GROUPS",
        action = ArgAction::Append,
        help = "Export only these dependency groups"
    )]
    pub only_groups: Vec<String>,
    #[arg(long, conflicts_with = "only_groups", help = "Include every dependency group")]
    pub all_groups: bool,
    #[arg(long, help = "Include the dev group (deprecated, use --with dev)")]
    pub dev: bool,
}

impl ExportArgs {
    pub fn to_request(&self, directory: Option<PathBuf>) -> ExportRequest {
        ExportRequest {
            format: self.format.clone(),
            output: self.output.clone(),
            directory,
            with_hashes: !self.without_hashes,
            with_urls: !self.without_urls,
            with_markers: !self.without_markers,
            with_credentials: self.with_credentials,
            extras: self.extras.clone(),
            all_extras: self.all_extras,
            with_groups: self.with_groups.clone(),
            without_groups: self.without_groups.clone(),
            only_groups: self.only_groups.clone(),
            all_groups: self.all_groups,
            dev: self.dev,
        }
    }
}
