use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use event_scanner::config::{self, AppConfig};
use event_scanner::{CreateEventDto, Event, EventService, ProviderKind, SearchParams, ServiceError};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the active providers in configured order
    Providers,
    /// Search every provider, or a single one with --provider
    Search {
        #[arg(long)]
        keyword: Option<String>,
        #[arg(long)]
        city: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        start_date: Option<String>,
        #[arg(long)]
        end_date: Option<String>,
        #[arg(long, value_parser = parse_provider)]
        provider: Option<ProviderKind>,
        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },
    /// Create an event with the first provider that accepts it
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        date: String,
        #[arg(long)]
        location: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        price: Option<String>,
        #[arg(long)]
        image_url: Option<String>,
    },
    /// Inspect or initialise the config file
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigAction {
    /// Print the config file location
    Path,
    /// Print the effective configuration with keys redacted
    Show,
    /// Write a default config file
    Init,
}

fn parse_provider(value: &str) -> Result<ProviderKind, String> {
    value.parse()
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    event_scanner::init_logging();

    match Cli::parse().command {
        Command::Providers => list_providers().await,
        Command::Search {
            keyword,
            city,
            category,
            start_date,
            end_date,
            provider,
            json,
        } => {
            let params = SearchParams {
                keyword,
                city,
                category,
                start_date,
                end_date,
            };
            search(params, provider, json).await
        }
        Command::Create {
            name,
            date,
            location,
            description,
            category,
            price,
            image_url,
        } => {
            let dto = CreateEventDto {
                name,
                date,
                location,
                description,
                category,
                price,
                image_url,
            };
            create(dto).await
        }
        Command::Config { action } => config_command(action.unwrap_or(ConfigAction::Path)),
    }
}

fn load_service() -> Result<EventService> {
    let config = AppConfig::load().context("loading configuration")?;
    EventService::from_config(&config).context("building providers")
}

async fn list_providers() -> Result<()> {
    let service = load_service()?;
    for info in service.providers() {
        println!("{:<14} {:<14} {}", info.id, info.name, info.url);
    }
    Ok(())
}

async fn search(params: SearchParams, provider: Option<ProviderKind>, json: bool) -> Result<()> {
    let service = load_service()?;
    let events = match provider {
        Some(kind) => service.search_provider(kind.as_str(), &params).await?,
        None => {
            let report = service.search_report(&params).await;
            for failure in report.failures() {
                if let Err(reason) = &failure.result {
                    eprintln!("warning: {} returned no results: {reason}", failure.provider);
                }
            }
            report.events
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&events)?);
    } else if events.is_empty() {
        println!("no events found");
    } else {
        for event in &events {
            println!("{}", render_line(event));
        }
    }
    Ok(())
}

async fn create(dto: CreateEventDto) -> Result<()> {
    let service = load_service()?;
    match service.create_event(&dto).await {
        Ok(event) => {
            println!("{}", serde_json::to_string_pretty(&event)?);
            Ok(())
        }
        Err(ServiceError::NoProvider { attempts }) => {
            for attempt in &attempts {
                eprintln!("  {}: {}", attempt.provider, attempt.error);
            }
            Err(ServiceError::NoProvider { attempts }.into())
        }
        Err(err) => Err(err.into()),
    }
}

fn config_command(action: ConfigAction) -> Result<()> {
    let path = event_scanner::config_path();
    match action {
        ConfigAction::Path => println!("{}", path.display()),
        ConfigAction::Show => {
            let config = AppConfig::load().context("loading configuration")?;
            let order: Vec<_> = config.providers.iter().map(|kind| kind.as_str()).collect();
            println!("config file: {}", path.display());
            println!("providers:   {}", order.join(", "));
            for kind in ProviderKind::ALL {
                let settings = config.settings(kind);
                println!(
                    "{:<14} key={} base_url={}",
                    kind.as_str(),
                    event_scanner::redact(settings.api_key.as_deref()),
                    settings.base_url.as_deref().unwrap_or("<default>")
                );
            }
            match config.http_timeout() {
                Some(timeout) => println!("http timeout: {}s", timeout.as_secs()),
                None => println!("http timeout: none"),
            }
        }
        ConfigAction::Init => {
            config::write_config(&path, &AppConfig::default())?;
            println!("wrote {}", path.display());
        }
    }
    Ok(())
}

fn render_line(event: &Event) -> String {
    let mut line = format!(
        "{:<25} {} @ {} [{}]",
        event.date, event.name, event.location, event.source
    );
    if let Some(price) = &event.price {
        line.push_str(&format!(" {price}"));
    }
    line
}
