use clap::{Parser, ValueEnum};
use site_distill::FetchMode;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "site-distill")]
#[command(about = "Crawl a website and answer an instruction from its pages")]
#[command(version)]
pub struct Args {
    /// URL to start crawling from
    pub url: String,

    /// What to extract, in plain language
    pub instruction: String,

    /// Page acquisition mode
    #[arg(short, long, value_enum)]
    pub mode: Option<ModeArg>,

    /// Path to a JSON pipeline configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Maximum number of links followed from the start page
    #[arg(long)]
    pub max_links: Option<usize>,

    /// Total timeout in seconds for the whole run
    #[arg(long)]
    pub total_timeout: Option<u64>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    /// Plain HTTP, follow linked .html/.htm pages
    Static,
    /// Headless browser, follow model-selected links
    Dynamic,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

impl From<ModeArg> for FetchMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Static => FetchMode::Static,
            ModeArg::Dynamic => FetchMode::Dynamic,
        }
    }
}
