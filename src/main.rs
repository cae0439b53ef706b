use std::env;
use std::error::Error;
use std::process::ExitCode;
use std::sync::Arc;

use reqwest::Client;
use tokio::io::BufReader;
use tokio::signal;

use crate::apis::predict::PredictClient;
use crate::form::TextField;
use crate::handler::SubmissionHandler;
use crate::terminal::{Terminal, TerminalOutput};
use crate::utilities::config::Config;
use crate::utilities::logchamp;

mod apis;
mod form;
mod handler;
mod terminal;
mod utilities;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let code = match run().await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("urlcheck: {err}");
            ExitCode::FAILURE
        }
    };
    log::logger().flush();
    code
}

async fn run() -> Result<ExitCode, Box<dyn Error>> {
    if let Err(err) = dotenvy::dotenv()
        && !err.not_found()
    {
        return Err(err.into());
    }

    let config = Config::from_env()?;
    logchamp::init(&config.log_file)?;
    log::debug!("prediction endpoint: {}", config.endpoint);

    let mut http_client = Client::builder();
    if let Some(timeout) = config.request_timeout {
        http_client = http_client.timeout(timeout);
    }

    let api = Arc::new(PredictClient::new(http_client.build()?, config.endpoint));
    let field = Arc::new(TextField::default());
    let output = Arc::new(TerminalOutput::default());
    let handler =
        Arc::new(SubmissionHandler::new(api, field.clone(), output.clone(), config.stale_policy));
    let mut terminal = Terminal::new(handler, field);

    let urls = env::args().skip(1).collect::<Vec<_>>();
    if !urls.is_empty() {
        let all_predicted = terminal.submit_all(urls).await;
        return Ok(if all_predicted { ExitCode::SUCCESS } else { ExitCode::FAILURE });
    }

    println!("Enter a URL to check, one per line. Ctrl+C to quit.");
    terminal.run(BufReader::new(tokio::io::stdin()), signal::ctrl_c()).await?;
    terminal.drain().await;
    log::debug!("last result: {:?}", output.text());

    Ok(ExitCode::SUCCESS)
}
