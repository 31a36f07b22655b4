use clap::{Parser, Subcommand};
use natsjwt_jwt::KeyKind;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser, Debug)]
#[command(name = "natsjwt", version, about = "Offline NATS operator/account/user credential issuance")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// NKey management (generate, derive public keys)
    Keys {
        #[command(subcommand)]
        cmd: KeysCommand,
    },

    /// Issue every token, creds file and the server config described by a manifest
    Issue {
        /// Trust manifest (YAML, or TOML with a .toml extension)
        #[arg(long, short)]
        config: PathBuf,

        /// Directory to write <name>.jwt, <account>-<user>.creds and server.conf into.
        /// Without it the server config is printed to stdout.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Token inspection and verification
    Token {
        #[command(subcommand)]
        cmd: TokenCommand,
    },

    /// Assemble a server trust bundle from signed tokens
    Bundle {
        /// Operator token or path to it
        #[arg(long)]
        operator: String,

        /// System account token or path to it
        #[arg(long = "system-account")]
        system_account: Option<String>,

        /// Account token or path to it (repeatable)
        #[arg(long = "account")]
        accounts: Vec<String>,

        /// Resolver kind (only MEMORY is supported)
        #[arg(long, default_value = "MEMORY")]
        resolver: String,

        /// Write the server config to this file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Creds file checks
    Creds {
        #[command(subcommand)]
        cmd: CredsCommand,
    },
}

#[derive(Subcommand, Debug)]
enum KeysCommand {
    /// Generate a new key pair
    Generate {
        /// operator, account, user or server
        #[arg(long, short)]
        kind: KeyKind,

        /// Directory to write <kind>.seed and <kind>.pub into
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Print the public key of a seed
    Public {
        /// Seed or path to a file containing it
        seed: String,
    },
}

#[derive(Subcommand, Debug)]
enum TokenCommand {
    /// Show a token's claims without checking its signature
    Inspect {
        /// Token or path to it
        token: String,

        /// Account token (or path) whose defaults a user token inherits
        #[arg(long)]
        account: Option<String>,
    },

    /// Check a token's signature, and optionally its link to a parent token
    Verify {
        /// Token or path to it
        token: String,

        /// Parent token (operator for an account, account for a user)
        #[arg(long)]
        parent: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum CredsCommand {
    /// Check that a creds file's seed matches its token
    Check {
        /// Path to the .creds file
        path: PathBuf,

        /// Expected token (or path to it) the creds file must embed
        #[arg(long)]
        token: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.cmd {
        Command::Keys { cmd } => match cmd {
            KeysCommand::Generate { kind, output } => commands::keys::generate(kind, output)?,
            KeysCommand::Public { seed } => commands::keys::public(&seed)?,
        },

        Command::Issue { config, output } => commands::issue::run(&config, output.as_deref())?,

        Command::Token { cmd } => match cmd {
            TokenCommand::Inspect { token, account } => {
                commands::token::inspect(&token, account.as_deref())?
            }
            TokenCommand::Verify { token, parent } => {
                commands::token::verify(&token, parent.as_deref())?
            }
        },

        Command::Bundle {
            operator,
            system_account,
            accounts,
            resolver,
            output,
        } => commands::bundle::run(
            &operator,
            system_account.as_deref(),
            &accounts,
            &resolver,
            output.as_deref(),
        )?,

        Command::Creds { cmd } => match cmd {
            CredsCommand::Check { path, token } => {
                commands::creds::check(&path, token.as_deref())?
            }
        },
    }

    Ok(())
}
