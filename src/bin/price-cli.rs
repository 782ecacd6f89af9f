use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;
use url::Url;

#[derive(Parser)]
#[command(name = "price-cli")]
#[command(about = "Query prices and inspect circuit breakers of a running price service", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    /// Admin API key, if the service requires one.
    #[arg(short, long, env = "PRICE_SERVICE_ADMIN_KEY")]
    key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Look up the current price of a product
    Price { product_id: String },
    /// List catalog products with their stored prices
    Products,
    /// Show the state of every circuit breaker
    Breakers,
    /// Force a circuit breaker back to closed
    Reset { name: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = Url::parse(&cli.url)?;

    let mut headers = HeaderMap::new();
    if let Some(key) = &cli.key {
        headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {}", key))?);
    }

    let res = match &cli.command {
        Commands::Price { product_id } => {
            client
                .get(endpoint(&base, &["products", product_id.as_str(), "price"])?)
                .send()
                .await?
        }
        Commands::Products => client.get(endpoint(&base, &["products"])?).send().await?,
        Commands::Breakers => {
            client
                .get(endpoint(&base, &["admin", "breakers"])?)
                .headers(headers)
                .send()
                .await?
        }
        Commands::Reset { name } => {
            client
                .post(endpoint(&base, &["admin", "breakers", name.as_str(), "reset"])?)
                .headers(headers)
                .send()
                .await?
        }
    };

    print_response(res).await
}

/// `base` with `segments` appended, each percent-encoded as one path segment.
fn endpoint(base: &Url, segments: &[&str]) -> Result<Url, Box<dyn std::error::Error>> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| format!("'{}' cannot be used as a base URL", base))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: price service returned status {}", status);
        if let Ok(text) = res.text().await {
            if !text.is_empty() {
                eprintln!("Response: {}", text);
            }
        }
        return Ok(());
    }

    if status == reqwest::StatusCode::NO_CONTENT {
        println!("OK");
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_encodes_segments() {
        let base = Url::parse("http://localhost:8080").unwrap();
        assert_eq!(
            endpoint(&base, &["products", "a/b c", "price"]).unwrap().as_str(),
            "http://localhost:8080/products/a%2Fb%20c/price"
        );

        let base = Url::parse("http://prices.internal/api/").unwrap();
        assert_eq!(
            endpoint(&base, &["admin", "breakers", "get_price", "reset"]).unwrap().as_str(),
            "http://prices.internal/api/admin/breakers/get_price/reset"
        );
    }

    #[test]
    fn test_endpoint_rejects_opaque_url() {
        let base = Url::parse("mailto:ops@example.com").unwrap();
        assert!(endpoint(&base, &["products"]).is_err());
    }
}
