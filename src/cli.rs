use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "portal-diff",
    version,
    about = "Line diffs between revisions of tutorial files"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[command(flatten)]
    pub diff: DiffFlags,

    /// Print debug logs (overridden by PORTAL_DIFF_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Args, Debug, Default)]
pub struct DiffFlags {
    /// Use an exact Myers diff instead of the lookahead scan
    #[arg(long, global = true)]
    pub myers: bool,

    /// Lines to scan ahead for a resynchronization point
    #[arg(long, global = true, value_name = "N")]
    pub lookahead: Option<usize>,

    /// Print the JSON report instead of the coloured view
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the diff API over HTTP
    Serve {
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// GitHub account owning the tutorial repositories
        #[arg(long)]
        owner: Option<String>,
    },

    /// Diff the latest change of a file in a GitHub repository
    Show {
        repo: String,
        path: String,

        /// Older revision (requires --to)
        #[arg(long, requires = "to")]
        from: Option<String>,

        /// Newer revision (requires --from)
        #[arg(long, requires = "from")]
        to: Option<String>,
    },

    /// Diff the latest change of a file in a local clone
    Local {
        path: String,

        /// Repository directory (defaults to `repo_root` from the config)
        #[arg(long)]
        repo_dir: Option<PathBuf>,
    },

    /// Diff two files on disk
    Files { old: PathBuf, new: PathBuf },

    /// List recent revisions of a file in a GitHub repository
    Log {
        repo: String,
        path: String,

        #[arg(short = 'n', long, default_value_t = 10)]
        limit: usize,
    },
}
