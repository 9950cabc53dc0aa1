use argh::FromArgs;
use reqwest::multipart::{Form, Part};
use std::path::{Path, PathBuf};

// defaults for the client
const DEFAULT_HOST: &str = "localhost";
const DEFAULT_PORT: u16 = 8000;

#[derive(FromArgs)]
/// Client for the arm-predict server
struct ClientArgs {
    /// the host to connect to
    #[argh(option, short = 'h', default = "DEFAULT_HOST.to_string()")]
    host: String,

    /// the port to connect to
    #[argh(option, short = 'p', default = "DEFAULT_PORT")]
    port: u16,

    /// command to execute: "predict" or "health"
    #[argh(subcommand)]
    command: ClientCommands,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum ClientCommands {
    Predict(PredictCommand),
    Health(HealthCommand),
}

#[derive(FromArgs)]
/// Upload a before/after image pair and print the prediction
#[argh(subcommand, name = "predict")]
struct PredictCommand {
    /// the path to the start (before) image
    #[argh(option, short = 's')]
    start: PathBuf,

    /// the path to the end (after) image
    #[argh(option, short = 'e')]
    end: PathBuf,
}

#[derive(FromArgs)]
/// Check that the server is alive
#[argh(subcommand, name = "health")]
struct HealthCommand {}

async fn file_part(path: &Path) -> Result<Part, Box<dyn std::error::Error>> {
    let bytes = tokio::fs::read(path).await?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(Part::bytes(bytes).file_name(name))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: ClientArgs = argh::from_env();

    let client = reqwest::Client::new();

    // format the host and port
    let addr = format!("{}:{}", args.host, args.port);

    let response = match args.command {
        ClientCommands::Predict(predict_command) => {
            let form = Form::new()
                .part("start_file", file_part(&predict_command.start).await?)
                .part("end_file", file_part(&predict_command.end).await?);

            client
                .post(format!("http://{}/predict/", addr))
                .multipart(form)
                .send()
                .await?
        }
        ClientCommands::Health(_) => client.get(format!("http://{}/health", addr)).send().await?,
    };

    println!("Status: {}", response.status());
    let result = response.json::<serde_json::Value>().await?;
    println!("Result: {}", serde_json::to_string_pretty(&result)?);

    Ok(())
}
