use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(version)]
pub struct Cli {
    /// Optional text to start the input with.
    pub text: Option<String>,

    /// Maximum number of characters the input accepts.
    #[arg(long, short = 'n')]
    pub max_length: Option<usize>,

    /// File with one mention name per line. Replaces the configured
    /// directory.
    #[arg(long, short = 'd', value_name = "FILE")]
    pub directory_file: Option<PathBuf>,

    /// Text shown while the input is empty.
    #[arg(long)]
    pub placeholder: Option<String>,
}
