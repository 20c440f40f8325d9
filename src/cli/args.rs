use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Add a command template to the library
    ///
    /// Placeholders use the {{.name}} syntax:
    ///   quiver add -n ssh-host -- "ssh {{.user}}@{{.host}}"
    Add {
        /// Short label for the command
        #[arg(short, long)]
        name: String,

        /// What the command does
        #[arg(short, long, default_value = "")]
        description: String,

        /// The command template
        #[arg(last = true, required = true)]
        command: Vec<String>,
    },
    /// List all stored commands
    Ls,
    /// Full-text search over names, templates and descriptions
    Search {
        /// Search term (prefix match)
        #[arg(required = true)]
        query: String,
    },
    /// Show one command with its parameters
    Get {
        /// Command id
        id: String,
    },
    /// Edit a stored command
    Edit {
        /// Command id
        id: String,

        /// New name
        #[arg(short, long)]
        name: Option<String>,

        /// New description
        #[arg(short, long)]
        description: Option<String>,

        /// New command template
        #[arg(short, long)]
        command: Option<String>,
    },
    /// Delete a command (parameters, history and explanation go with it)
    Rm {
        /// Command id
        id: String,
    },
    /// Compile a command and push it onto the shell prompt
    Exec {
        /// Command id
        id: String,

        /// Argument values as name=value; missing ones are prompted for
        #[arg(short = 'a', long = "arg")]
        args: Vec<String>,

        /// Print the compiled command instead of injecting it
        #[arg(long)]
        dry_run: bool,
    },
    /// Explain a command using the configured LLM
    Explain {
        /// Command id
        id: String,

        /// Drop the cached explanation and fetch a fresh one
        #[arg(long)]
        refresh: bool,
    },
    /// Show the usage history of a command
    History {
        /// Command id
        id: String,
    },
}
