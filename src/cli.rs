use clap::{Parser, Subcommand};

/// scopeauth — password login and scoped bearer tokens
#[derive(Parser)]
#[command(name = "scopeauth", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port to bind (overrides SCOPEAUTH_PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Manage accounts
    User {
        #[command(subcommand)]
        command: UserCommands,
    },

    /// Work with issued tokens
    Token {
        #[command(subcommand)]
        command: TokenCommands,
    },

    /// Print a fresh random signing secret for SCOPEAUTH_JWT_SECRET
    Keygen {
        /// Secret length in bytes
        #[arg(long, default_value = "32")]
        bytes: usize,
    },
}

#[derive(Subcommand)]
pub enum UserCommands {
    /// Register a new account
    Create {
        #[arg(long)]
        username: String,
        #[arg(long, env = "SCOPEAUTH_NEW_USER_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long)]
        full_name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long, value_delimiter = ',')]
        scopes: Vec<String>,
        #[arg(long)]
        disabled: bool,
    },
    /// Show an account (never prints the password hash)
    Show {
        #[arg(long)]
        username: String,
    },
}

#[derive(Subcommand)]
pub enum TokenCommands {
    /// Validate a token and print its claims
    Inspect { token: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_create_parses_scopes() {
        let cli = Cli::try_parse_from([
            "scopeauth", "user", "create", "--username", "alice", "--password", "pw",
            "--scopes", "read,write",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::User {
                command: UserCommands::Create { username, scopes, disabled, .. },
            }) => {
                assert_eq!(username, "alice");
                assert_eq!(scopes, vec!["read", "write"]);
                assert!(!disabled);
            }
            _ => panic!("unexpected command"),
        }
    }

    #[test]
    fn test_no_subcommand_defaults_to_none() {
        let cli = Cli::try_parse_from(["scopeauth"]).unwrap();
        assert!(cli.command.is_none());
    }
}
