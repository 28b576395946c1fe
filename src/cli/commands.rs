use clap::{Parser, Subcommand};

/// `Mimus` - personality-mirroring social engagement bot.
#[derive(Parser, Debug)]
#[command(name = "mimus")]
#[command(version = "0.1.0")]
#[command(about = "Learns your communication style and engages for you.", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the engagement loop (timeline + mentions polling)
    Run {
        /// Decide and log actions without sending them
        #[arg(long)]
        dry_run: bool,

        /// Reduced polling frequency to conserve API budget
        #[arg(long)]
        lite: bool,
    },

    /// Collect the account's history and (re)build the personality profile
    Analyze {
        /// Re-analyze even if a profile already exists
        #[arg(long)]
        force: bool,
    },

    /// Show the stored profile and recent interactions
    Status,
}

#[cfg(test)]
mod tests {
    use super::Cli;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_has_no_flag_conflicts() {
        Cli::command().debug_assert();
    }
}
