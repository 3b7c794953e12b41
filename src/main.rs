use std::{process::ExitCode, time::Duration};

use anyhow::Result;
use clap::Parser;
use form_relay::{
    config::{FileConfig, RelayConfig},
    form::{parse_pair, SelectedFile, Submission},
    handler::FormHandler,
    io::save_download,
    status::TerminalStatus,
};
use log::debug;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    env_logger::init();
    let args = Args::parse();
    let mut config = RelayConfig::default();
    if let Some(path) = args.config {
        config = config.merge(FileConfig::load(path).await?);
    }
    if let Some(server) = args.server {
        config = config.server(server);
    }
    if let Some(endpoint) = args.endpoint {
        config = config.endpoint(endpoint);
    }
    if let Some(file_field) = args.file_field {
        config = config.file_field(file_field);
    }
    if let Some(output_dir) = args.output_dir {
        config = config.output_dir(output_dir);
    }
    if let Some(timeout) = args.connection_timeout {
        config = config.connection_timeout(Duration::from_millis(timeout));
    }

    let mut submission = Submission::new();
    for pair in &args.fields {
        let (name, value) = parse_pair(pair)?;
        submission = submission.text(name, value);
    }
    for pair in &args.files {
        let (name, path) = parse_pair(pair)?;
        submission = submission.file(name, SelectedFile::load(path).await?);
    }

    debug!("Starting with {config:#?}.");
    let handler = FormHandler::from_config(&config, TerminalStatus)?;
    let link = match handler.submit(submission).await {
        Ok(link) => link,
        // Already shown in the status area.
        Err(_) => return Ok(ExitCode::FAILURE),
    };
    let path = save_download(handler.objects(), &link, &config.output_dir).await?;
    println!("Saved to {}.", path.display());
    Ok(ExitCode::SUCCESS)
}

#[derive(Debug, Parser)]
#[clap(
    author,
    version,
    about = "Posts a form to a processing endpoint and saves the returned file.\n\
The saved file is named after the first file given for `--file-field`."
)]
struct Args {
    #[clap(short, long, help = "TOML file with default settings.")]
    config: Option<String>,
    #[clap(short, long, help = "Base URL of the server [default: http://127.0.0.1:5000].")]
    server: Option<String>,
    #[clap(short, long, help = "Path of the processing endpoint [default: /api/process].")]
    endpoint: Option<String>,
    #[clap(
        short,
        long = "field",
        help = "Text field as `KEY=VALUE`. Can be repeated."
    )]
    fields: Vec<String>,
    #[clap(
        short = 'F',
        long = "file",
        help = "File field as `FIELD=PATH`. Can be repeated, also for the same field."
    )]
    files: Vec<String>,
    #[clap(
        short = 'n',
        long,
        help = "Field whose first file names the download [default: excel]."
    )]
    file_field: Option<String>,
    #[clap(short, long, help = "Directory to save the download to [default: .].")]
    output_dir: Option<String>,
    #[clap(
        short = 't',
        long,
        help = "Connection timeout in integer milliseconds."
    )]
    connection_timeout: Option<u64>,
}
