use clap::{Parser, Subcommand};
use std::path::PathBuf;
use anyhow::{Context, Result};
use std::io;

mod cipher;
mod config;
mod error;
mod prompt;
mod store;

use config::Config;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Shift and swap the pixels of an image
    Encrypt {
        /// Path to the image to encrypt
        input: PathBuf,

        /// Secret key (any non-zero integer)
        #[arg(short, long, allow_hyphen_values = true, value_parser = cipher::parse_key)]
        key: i64,

        /// Where to write the result (defaults to the configured encrypted output)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Undo `encrypt` with the same key
    Decrypt {
        /// Path to the encrypted image
        input: PathBuf,

        /// Secret key used for encryption
        #[arg(short, long, allow_hyphen_values = true, value_parser = cipher::parse_key)]
        key: i64,

        /// Where to write the result (defaults to the configured decrypted output)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();

    match args.command {
        Some(Command::Encrypt { input, key, output }) => {
            let output = resolve_output(output, || Ok(load_config()?.encrypted_output))?;
            let written = cipher::encrypt_file(&input, key, &output)
                .with_context(|| format!("Failed to encrypt {:?}", input))?;
            println!("Encrypted image saved to {}", written.display());
        }
        Some(Command::Decrypt { input, key, output }) => {
            let output = resolve_output(output, || Ok(load_config()?.decrypted_output))?;
            let written = cipher::decrypt_file(&input, key, &output)
                .with_context(|| format!("Failed to decrypt {:?}", input))?;
            println!("Decrypted image saved to {}", written.display());
        }
        None => run_interactive(&load_config()?)?,
    }

    Ok(())
}

fn load_config() -> Result<Config> {
    config::load_config().context("Failed to load configuration")
}

// An explicit --output wins and the config file is never read.
fn resolve_output<F>(output: Option<PathBuf>, configured: F) -> Result<PathBuf>
where
    F: FnOnce() -> Result<PathBuf>,
{
    match output {
        Some(path) => Ok(path),
        None => configured(),
    }
}

// Prompt for an image and a key, encrypt it, then decrypt the encrypted copy.
fn run_interactive(config: &Config) -> Result<()> {
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut out = io::stdout();

    let image_path = prompt::prompt_image_path(&mut input, &mut out)?;
    let key = prompt::prompt_key(&mut input, &mut out)?;

    let encrypted = cipher::encrypt_file(&image_path, key, &config.encrypted_output)
        .context("Encryption failed")?;
    log::info!("Encrypted image written to {:?}", encrypted);

    let decrypted = cipher::decrypt_file(&encrypted, key, &config.decrypted_output)
        .context("Decryption failed")?;
    log::info!("Decrypted image written to {:?}", decrypted);

    println!("Decryption complete!");
    Ok(())
}
