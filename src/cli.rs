//! CLI definitions for snooze-nl.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// snooze-nl CLI.
#[derive(Parser)]
#[command(name = "snooze-nl")]
#[command(about = "Snooze mail by typing when you want it back")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path (default: ~/.snooze-nl/config.toml)
    #[arg(short, long, global = true, env = "SNOOZE_NL_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Parse a phrase and show what it would snooze to
    Preview {
        /// Natural-language time, e.g. "next Tue 9am"
        text: String,

        /// Read ambiguous numeric dates day first
        #[arg(long)]
        day_first: bool,

        /// Sample of the dialog's date input, to show the filled value
        #[arg(long, default_value = "Jan 1, 2025")]
        date_sample: String,

        /// Sample of the dialog's time input, to show the filled value
        #[arg(long, default_value = "8:00 AM")]
        time_sample: String,
    },

    /// Snooze the conversation open in the mail tab
    Snooze {
        /// Natural-language time, e.g. "tomorrow 8am"
        text: String,

        /// Chrome remote debugging port (overrides config)
        #[arg(long)]
        port: Option<u16>,

        /// Launch Chrome headless if it is not running
        #[arg(long)]
        headless: bool,

        /// Read ambiguous numeric dates day first
        #[arg(long)]
        day_first: bool,
    },

    /// Add the natural-language box to every snooze menu until Ctrl-C
    Watch {
        /// Chrome remote debugging port (overrides config)
        #[arg(long)]
        port: Option<u16>,

        /// Read ambiguous numeric dates day first
        #[arg(long)]
        day_first: bool,
    },

    /// Run the whole flow against a scripted in-memory mail page
    Simulate {
        /// Natural-language time, e.g. "in 3 days"
        text: String,

        /// Make the snooze control ignore every press
        #[arg(long)]
        fail_trigger: bool,
    },

    /// Print the effective configuration and its validation report
    Config,
}
