//! Command-line interface.

pub mod apply;
pub mod edit;
pub mod export;
pub mod get;
pub mod info;
pub mod init;
pub mod output;
pub mod rekey;
pub mod run;
pub mod runtime;
pub mod set;

use std::path::PathBuf;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::{Parser, Subcommand, ValueEnum};

use crate::error::Result;
use runtime::Runtime;

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default())
    .valid(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .invalid(AnsiColor::Red.on_default().effects(Effects::BOLD))
    .error(AnsiColor::Red.on_default().effects(Effects::BOLD));

/// Kiln - secure environment variable management tool.
#[derive(Parser)]
#[command(
    name = "kiln",
    about = "Secure environment variable management tool",
    version,
    styles = STYLES
)]
pub struct Cli {
    /// Configuration file path
    #[arg(
        short = 'c',
        long,
        global = true,
        default_value = "kiln.toml",
        env = "KILN_CONFIG_FILE"
    )]
    pub config: PathBuf,

    /// Path to private key file
    #[arg(short = 'k', long, global = true, env = "KILN_PRIVATE_KEY_FILE")]
    pub key: Option<PathBuf>,

    /// Verbose output
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand)]
pub enum Command {
    /// Initialize new kiln project
    #[command(subcommand)]
    Init(InitCommand),

    /// Set an environment variable
    Set {
        /// Environment variable name
        name: Option<String>,

        /// Environment variable value (prompts with hidden input if omitted)
        value: Option<String>,

        /// Environment file to modify
        #[arg(short, long, default_value = "default")]
        file: String,

        /// JSON file containing environment variables to set
        #[arg(long, value_name = "PATH")]
        from_file: Option<PathBuf>,
    },

    /// Get an environment variable
    Get {
        /// Environment variable name
        name: String,

        /// Environment file to read from
        #[arg(short, long, default_value = "default")]
        file: String,

        /// Output format
        #[arg(long, value_enum, default_value = "value")]
        format: GetFormat,
    },

    /// Edit encrypted environment variables
    Edit {
        /// Environment file to edit
        #[arg(short, long, default_value = "default")]
        file: String,

        /// Editor to use, defaults to the EDITOR environment variable
        #[arg(long, value_name = "EDITOR")]
        editor: Option<String>,
    },

    /// Export environment variables
    Export {
        /// Environment file to export
        #[arg(short, long, default_value = "default")]
        file: String,

        /// Output format
        #[arg(long, value_enum, default_value = "shell")]
        format: ExportFormat,
    },

    /// Render a template file with environment variables
    Apply {
        /// Template file path
        template: PathBuf,

        /// Environment file to read variables from
        #[arg(short, long, default_value = "default")]
        file: String,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Fail if template variables are not found
        #[arg(long)]
        strict: bool,

        /// Left delimiter for template variables (default: ${ or $)
        #[arg(long)]
        left_delimiter: Option<String>,

        /// Right delimiter for template variables (default: } or empty)
        #[arg(long)]
        right_delimiter: Option<String>,
    },

    /// Run a command with encrypted environment
    Run {
        /// Command and arguments to run
        #[arg(trailing_var_arg = true, required = true)]
        command: Vec<String>,

        /// Environment file to use
        #[arg(short, long, default_value = "default")]
        file: String,

        /// Show environment variables without running the command
        #[arg(long)]
        dry_run: bool,

        /// Timeout for command execution (e.g. 30s, 5m)
        #[arg(long, value_name = "DURATION")]
        timeout: Option<String>,

        /// Working directory for command execution
        #[arg(long, value_name = "PATH")]
        workdir: Option<String>,

        /// Run command through shell
        #[arg(long)]
        shell: bool,
    },

    /// Add recipients and re-encrypt
    Rekey {
        /// Environment file to rekey
        #[arg(short, long)]
        file: String,

        /// Add new named recipients in format 'name=key'
        #[arg(long = "add-recipient", value_name = "name=key")]
        add_recipient: Vec<String>,

        /// Rekey without confirmation
        #[arg(long)]
        force: bool,
    },

    /// Show project and file information
    Info {
        /// Show info for a specific file
        #[arg(short, long)]
        file: Option<String>,

        /// Verify file decryption capability
        #[arg(long)]
        verify: bool,
    },
}

/// Init subcommands.
#[derive(Subcommand)]
pub enum InitCommand {
    /// Generate encryption key
    Key {
        /// Path for private key
        #[arg(long, default_value = "~/.kiln/kiln.key")]
        path: String,

        /// Save key with passphrase protection
        #[arg(long)]
        encrypt: bool,

        /// Overwrite existing key
        #[arg(long)]
        force: bool,
    },

    /// Generate configuration file
    Config {
        /// Path for config file
        #[arg(long, default_value = "kiln.toml")]
        path: PathBuf,

        /// Named recipients in format 'name=key'
        #[arg(long = "recipients", value_name = "name=key")]
        recipients: Vec<String>,

        /// Overwrite existing config
        #[arg(long)]
        force: bool,
    },
}

/// Output formats for `get`.
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum GetFormat {
    Value,
    Json,
}

/// Output formats for `export`.
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum ExportFormat {
    Shell,
    Json,
    Yaml,
}

/// Execute a parsed command.
pub fn execute(command: Command, rt: &Runtime) -> Result<()> {
    match command {
        Command::Init(cmd) => match cmd {
            InitCommand::Key {
                path,
                encrypt,
                force,
            } => init::key(&path, encrypt, force),
            InitCommand::Config {
                path,
                recipients,
                force,
            } => init::config(&path, &recipients, force),
        },
        Command::Set {
            name,
            value,
            file,
            from_file,
        } => set::execute(rt, name.as_deref(), value.as_deref(), &file, from_file.as_deref()),
        Command::Get { name, file, format } => get::execute(rt, &name, &file, format),
        Command::Edit { file, editor } => edit::execute(rt, &file, editor.as_deref()),
        Command::Export { file, format } => export::execute(rt, &file, format),
        Command::Apply {
            template,
            file,
            output,
            strict,
            left_delimiter,
            right_delimiter,
        } => apply::execute(
            rt,
            &template,
            &file,
            output.as_deref(),
            strict,
            left_delimiter.as_deref(),
            right_delimiter.as_deref(),
        ),
        Command::Run {
            command,
            file,
            dry_run,
            timeout,
            workdir,
            shell,
        } => run::execute(rt, &command, &file, dry_run, timeout.as_deref(), workdir.as_deref(), shell),
        Command::Rekey {
            file,
            add_recipient,
            force,
        } => rekey::execute(rt, &file, &add_recipient, force),
        Command::Info { file, verify } => info::execute(rt, file.as_deref(), verify),
    }
}
