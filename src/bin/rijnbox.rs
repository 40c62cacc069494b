//! rijnbox CLI - Passphrase-based text encryption
//!
//! Command-line interface for encrypting and decrypting text and text files
//! into base64 envelopes using PBKDF2 and Rijndael-256-CBC.

use clap::{ArgAction, Parser, Subcommand};
use log::{debug, error};
use std::error::Error as StdError;
use std::io;
use std::path::PathBuf;
use std::process;

use rijnbox::passphrase::{
    ConstantPassphraseReader, PassphraseReader, ReaderPassphraseReader,
    ResolvingPassphraseReader, TerminalPassphraseReader,
};
use rijnbox::{CipherConfig, ErrorKind, RijnboxError, crypter, file_ops, logging};

#[derive(Parser)]
#[command(name = "rijnbox")]
#[command(version)]
#[command(about = "Passphrase-based text encryption.", long_about = None)]
struct Cli {
    /// Read passphrase from stdin instead of from terminal
    #[arg(long, global = true)]
    passphrase_stdin: bool,

    /// Passphrase used when none is typed or piped in. Prefer setting it
    /// through the environment over passing it on the command line.
    #[arg(
        long,
        global = true,
        env = "RIJNBOX_PASSPHRASE",
        hide_env_values = true,
        value_name = "PASSPHRASE"
    )]
    default_passphrase: Option<String>,

    /// Derive keys from an empty passphrase instead of refusing to
    #[arg(long, global = true)]
    allow_empty_passphrase: bool,

    /// Increase log verbosity (repeatable)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Append log output to this file instead of stderr
    #[arg(long, global = true, value_name = "FILE")]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encrypt a text file
    #[command(alias = "e")]
    Encrypt {
        /// Path to the file whose contents is to be encrypted
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Path to the file to write the encrypted text to
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        /// Replace the output file if it already exists
        #[arg(short, long)]
        force: bool,
    },

    /// Decrypt a text file
    #[command(alias = "d")]
    Decrypt {
        /// Path to the file whose contents is to be decrypted
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Path to the file to write the unencrypted text to
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        /// Replace the output file if it already exists
        #[arg(short, long)]
        force: bool,
    },

    /// Encrypt TEXT and print the base64 envelope
    EncryptText {
        text: String,
    },

    /// Decrypt a base64 ENVELOPE and print the text
    DecryptText {
        envelope: String,
    },
}

fn main() {
    let cli = Cli::parse();
    let logs_to_file = cli.log_file.is_some();

    if let Err(e) = logging::init(cli.verbose, cli.log_file.as_deref()) {
        eprintln!("Error: {}", report(&e));
        process::exit(1);
    }

    if let Err(e) = run(cli) {
        // Without a log file the logger writes to stderr as well.
        if logs_to_file {
            error!("{}", report(&e));
        }
        eprintln!("Error: {}", report(&e));
        if e.is(ErrorKind::FileExists) {
            eprintln!("Pass --force to replace the existing file.");
        }
        process::exit(1);
    }
}

fn run(cli: Cli) -> rijnbox::Result<()> {
    let mut config = CipherConfig::new().allow_empty_passphrase(cli.allow_empty_passphrase);
    if let Some(default) = cli.default_passphrase {
        config = config.with_default_passphrase(default);
    }
    let mut reader = ResolvingPassphraseReader::new(
        get_passphrase_reader(cli.passphrase_stdin, &config),
        &config,
    );

    match cli.command {
        Commands::Encrypt {
            input,
            output,
            force,
        } => {
            debug!("encrypt {} -> {}", input.display(), output.display());
            file_ops::encrypt_file(&input, &output, &mut reader, force)
        }
        Commands::Decrypt {
            input,
            output,
            force,
        } => {
            debug!("decrypt {} -> {}", input.display(), output.display());
            file_ops::decrypt_file(&input, &output, &mut reader, force)
        }
        Commands::EncryptText { text } => {
            let passphrase = reader.read_passphrase()?;
            println!("{}", crypter::encrypt_text(&passphrase, &text)?);
            Ok(())
        }
        Commands::DecryptText { envelope } => {
            let passphrase = reader.read_passphrase()?;
            println!("{}", crypter::decrypt_text(&passphrase, &envelope)?);
            Ok(())
        }
    }
}

fn get_passphrase_reader(use_stdin: bool, config: &CipherConfig) -> Box<dyn PassphraseReader> {
    if use_stdin {
        Box::new(ReaderPassphraseReader::new(Box::new(io::stdin())))
    } else if config
        .default_passphrase
        .as_ref()
        .is_some_and(|p| !p.is_empty())
    {
        // Nothing typed; the resolving reader substitutes the default.
        Box::new(ConstantPassphraseReader::new(Vec::new()))
    } else {
        Box::new(TerminalPassphraseReader::new())
    }
}

/// Render an error with its chain of sources on one line.
fn report(err: &RijnboxError) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}
