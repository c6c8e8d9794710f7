use clap::Parser;
use finance_query_gateway::{
    classifier::QueryCategory,
    config::Config,
    dispatcher::Dispatcher,
    gemini::GeminiClient,
    models::{GenerateRequest, RiskLevel},
    portfolio::PortfolioAdvisor,
};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Ask a single finance question from the command line
#[derive(Debug, Parser)]
#[command(name = "finance-ask", version, about)]
struct Cli {
    /// The question or portfolio request
    query: String,

    /// Language of the answer
    #[arg(short, long, default_value = "English")]
    language: String,

    /// Risk appetite for portfolio requests (low, medium, high)
    #[arg(short, long)]
    risk: Option<String>,

    /// Print the routing decision without calling the LLM
    #[arg(long)]
    classify_only: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    // Initialize tracing (stderr keeps stdout clean for the answer)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let risk = cli.risk.as_deref().map(str::parse::<RiskLevel>).transpose()?;
    let config = Config::from_env()?;

    if cli.classify_only {
        let category = config.classifier.build().classify(&cli.query);
        println!("{}", classification_line(category));
        return Ok(());
    }

    let gemini = Arc::new(GeminiClient::from_config(&config)?);
    let advisor = Arc::new(PortfolioAdvisor::new(gemini.clone(), config.portfolio_fallback));
    let dispatcher = Dispatcher::new(config.classifier.build(), gemini, advisor);

    let request = GenerateRequest {
        query: Some(cli.query),
        language: Some(cli.language),
        risk,
    };

    eprintln!("{}", classification_line(dispatcher.classify(request.query())));

    match dispatcher.generate(&request).await {
        Ok(response) => {
            println!("{}", response.response);
            Ok(())
        }
        Err(e) => {
            eprintln!("Request failed: {}", e);
            Err(Box::new(e) as Box<dyn std::error::Error>)
        }
    }
}

fn classification_line(category: QueryCategory) -> String {
    match category {
        QueryCategory::General => "Classification: general question".to_string(),
        QueryCategory::Portfolio => "Classification: portfolio request".to_string(),
    }
}
