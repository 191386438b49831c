use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "forms-cli")]
#[command(about = "Submit forms to a running site-forms server", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    /// Value for the X-CSRF-Token header, when the server enforces it
    #[arg(long)]
    csrf_token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check server and storage status
    Health,
    /// Send a quote request
    Quote {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, default_value = "")]
        phone: String,
        #[arg(long, default_value = "")]
        message: String,
    },
    /// Subscribe an address to the newsletter
    Subscribe {
        #[arg(long)]
        email: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    if let Some(token) = &cli.csrf_token {
        headers.insert("x-csrf-token", HeaderValue::from_str(token)?);
    }

    let forms_url = format!("{}/api/forms", cli.url);
    match cli.command {
        Commands::Health => {
            let res = client.get(format!("{}/health", cli.url)).send().await?;
            print_response(res).await?;
        }
        Commands::Quote {
            name,
            email,
            phone,
            message,
        } => {
            let res = client
                .post(&forms_url)
                .headers(headers)
                .form(&[
                    ("action", "quote"),
                    ("name", name.as_str()),
                    ("email", email.as_str()),
                    ("phone", phone.as_str()),
                    ("message", message.as_str()),
                ])
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Subscribe { email } => {
            let res = client
                .post(&forms_url)
                .headers(headers)
                .form(&[("action", "subscribe"), ("email", email.as_str())])
                .send()
                .await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", text),
    }
    if !status.is_success() {
        eprintln!("Error: server returned status {}", status);
    }
    Ok(())
}
