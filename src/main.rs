use clap::Parser;
use site_distill::{CrawlRequest, FetchMode, Pipeline, PipelineConfig, PipelineError};
use std::error::Error;

mod args;
use args::{Args, OutputFormat};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Initialize logging
    env_logger::init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_file(path)?,
        None => PipelineConfig::default(),
    }
    .with_env_overrides();

    if let Some(mode) = args.mode {
        config.mode = mode.into();
    }
    if config.mode == FetchMode::Dynamic {
        ::log::info!(
            "Dynamic mode needs a WebDriver server at {} (set WEBDRIVER_URL to change it)",
            config.webdriver_url
        );
    }

    let mut builder = Pipeline::builder(config);
    if let Some(max_links) = args.max_links {
        builder = builder.with_max_follow_links(max_links);
    }
    if let Some(total_timeout) = args.total_timeout {
        builder = builder.with_total_timeout(total_timeout);
    }
    let pipeline = builder.build()?;

    let start_time = std::time::Instant::now();
    let request = CrawlRequest::new(args.url, args.instruction);
    let result = pipeline.run(&request).await;
    ::log::info!(
        "Run finished in {:.2} seconds",
        start_time.elapsed().as_secs_f64()
    );

    match result {
        Ok(answer) => {
            match args.format {
                OutputFormat::Text => println!("{}", answer.content),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&answer)?),
            }
            Ok(())
        }
        Err(e @ PipelineError::NoContent { .. }) => {
            eprintln!("No content fetched from the URL: {e}");
            std::process::exit(2);
        }
        Err(e @ PipelineError::Synthesis(_)) => {
            eprintln!("Error processing request with LLM: {e}");
            std::process::exit(3);
        }
        Err(e) => Err(e.into()),
    }
}
