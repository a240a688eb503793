use clap::{Parser, Subcommand};

/// Grammar of one SSH invocation as delivered by `SSH_ORIGINAL_COMMAND`.
#[derive(Parser)]
#[command(name = "patchbay", about = "SSH patch request service", no_binary_name = true)]
pub struct SessionCli {
    #[command(subcommand)]
    pub command: SessionCommand,
}

#[derive(Subcommand)]
pub enum SessionCommand {
    /// Show the event log
    Logs {
        /// Only events for this patch request
        #[arg(long)]
        pr: Option<i64>,

        /// Only events for this repo (owner/name)
        #[arg(long)]
        repo: Option<String>,
    },

    /// Manage repos
    Repo {
        #[command(subcommand)]
        command: RepoCommands,
    },

    /// Manage patch requests
    Pr {
        #[command(subcommand)]
        command: PrCommands,
    },

    /// Manage patchsets
    Ps {
        #[command(subcommand)]
        command: PsCommands,
    },
}

#[derive(Subcommand)]
pub enum RepoCommands {
    /// Create a repo in your own namespace
    Create {
        /// Repo name
        name: String,

        /// Optional description
        #[arg(long)]
        description: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum PrCommands {
    /// List patch requests, optionally per repo
    Ls {
        /// Restrict to one repo (owner/name)
        repo: Option<String>,
    },

    /// Create a patch request from a patch stream on stdin
    Create {
        /// Target repo (owner/name, or a bare name in your own namespace)
        repo: String,
    },

    /// Print the raw mbox of the latest patchset (pipe into `git am`)
    Print {
        /// Patch request id
        pr_id: i64,
    },

    /// Show a patch request with its patchsets and patches
    Summary {
        /// Patch request id
        pr_id: i64,
    },

    /// Range-diff between the two most recent patchsets
    Diff {
        /// Patch request id
        pr_id: i64,
    },

    /// Accept a patch request
    Accept {
        /// Patch request id
        pr_id: i64,
    },

    /// Close a patch request
    Close {
        /// Patch request id
        pr_id: i64,
    },

    /// Reopen a closed patch request
    Reopen {
        /// Patch request id
        pr_id: i64,
    },

    /// Change a patch request's title
    Edit {
        /// Patch request id
        pr_id: i64,

        /// New title
        #[arg(required = true, trailing_var_arg = true)]
        title: Vec<String>,
    },

    /// Add a patchset from a patch stream on stdin
    Add {
        /// Patch request id
        pr_id: i64,

        /// Mark the patchset as a review revision
        #[arg(long, conflicts_with = "replace")]
        review: bool,

        /// Replace the PR's series with this patchset
        #[arg(long)]
        replace: bool,

        /// Also accept the patch request
        #[arg(long, conflicts_with = "close")]
        accept: bool,

        /// Also close the patch request
        #[arg(long)]
        close: bool,
    },
}

#[derive(Subcommand)]
pub enum PsCommands {
    /// Delete a patchset and its patches
    Rm {
        /// Patchset id
        patchset_id: i64,
    },
}
