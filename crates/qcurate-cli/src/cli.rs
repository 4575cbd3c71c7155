use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "qcurate - curate molecule collections into quantum-chemistry datasets.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Number of worker threads for parallel components.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run molecules through a workflow and write the resulting dataset.
    Create(CreateArgs),
    /// Write or convert factory settings files.
    Settings(SettingsArgs),
    /// Print a summary of a dataset file.
    Inspect(InspectArgs),
    /// Write the molecules of a dataset to SMILES, SDF or XYZ files.
    Export(ExportArgs),
    /// List the available workflow components.
    Components(ComponentsArgs),
}

/// Arguments for the `create` subcommand.
#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Molecule files to read (.smi, .csv, .sdf).
    #[arg(required = true, value_name = "PATH")]
    pub inputs: Vec<PathBuf>,

    /// Factory settings file (.json or .toml). Defaults are used when omitted.
    #[arg(short, long, value_name = "PATH")]
    pub settings: Option<PathBuf>,

    /// Path of the dataset JSON file to write.
    #[arg(short, long, value_name = "PATH")]
    pub output: PathBuf,

    /// Dataset name.
    #[arg(short, long)]
    pub name: String,

    /// One-line summary of the dataset.
    #[arg(long, default_value = "")]
    pub tagline: String,

    /// Long description of the dataset.
    #[arg(short, long, default_value = "")]
    pub description: String,

    /// Override the submitter recorded in the metadata.
    #[arg(long)]
    pub submitter: Option<String>,

    /// URL with further information about the dataset.
    #[arg(long, value_name = "URL")]
    pub url: Option<String>,

    /// Also write the retained molecules to this file; may be repeated.
    #[arg(short = 'e', long = "export", value_name = "PATH")]
    pub exports: Vec<PathBuf>,

    /// Write exported SMILES with explicit hydrogens and atom map numbers.
    #[arg(long)]
    pub mapped: bool,
}

/// Arguments for the `settings` subcommand.
#[derive(Args, Debug)]
pub struct SettingsArgs {
    #[command(subcommand)]
    pub command: SettingsCommands,
}

#[derive(Subcommand, Debug)]
pub enum SettingsCommands {
    /// Write the default factory settings.
    Init {
        /// Output path; the extension selects JSON or TOML.
        #[arg(required = true, value_name = "PATH")]
        output: PathBuf,
        /// Include the standard curation workflow.
        #[arg(long)]
        with_workflow: bool,
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
    /// Convert a settings file between JSON and TOML.
    Convert {
        #[arg(required = true, value_name = "INPUT")]
        input: PathBuf,
        #[arg(required = true, value_name = "OUTPUT")]
        output: PathBuf,
    },
}

/// Arguments for the `inspect` subcommand.
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Dataset JSON file.
    #[arg(required = true, value_name = "PATH")]
    pub dataset: PathBuf,

    /// List every filtered molecule.
    #[arg(long)]
    pub filtered: bool,
}

/// Arguments for the `export` subcommand.
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Dataset JSON file.
    #[arg(required = true, value_name = "PATH")]
    pub dataset: PathBuf,

    /// Output files; the extension selects the format.
    #[arg(required = true, value_name = "OUTPUT")]
    pub outputs: Vec<PathBuf>,

    /// Write SMILES with explicit hydrogens and atom map numbers (.smi only).
    #[arg(long)]
    pub mapped: bool,
}

/// Arguments for the `components` subcommand.
#[derive(Args, Debug)]
pub struct ComponentsArgs {
    /// Print the default settings of each component as JSON.
    #[arg(long)]
    pub settings: bool,
}
