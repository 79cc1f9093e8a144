use std::fs;
use std::path::Path;
use std::sync::Arc;

use tracing::{error, info, warn};
use wish_sniper::config::{load_config, AppConfig};
use wish_sniper::matcher::MatchEngine;
use wish_sniper::model::{Product, RequestStatus};
use wish_sniper::notifier::{LogNotifier, NotificationDispatcher, WebhookNotifier};
use wish_sniper::parser::{Parser, QueryParser, Vocabulary};
use wish_sniper::service::WatchService;
use wish_sniper::storage::{RequestStore, SqliteStore};

const USAGE: &str = "usage:
  wish-sniper parse <query...>
  wish-sniper request <email> <query...>
  wish-sniper product <product.json>
  wish-sniper requests [ACTIVE|FULFILLED]";

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt::init();

    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("😱 Panic occurred: {:?}", panic_info);
    }));

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some((command, rest)) = args.split_first() else {
        eprintln!("{}", USAGE);
        std::process::exit(2);
    };

    // Configuration is optional; defaults apply without a config.json
    let config = if Path::new("config.json").exists() {
        match load_config("config.json") {
            Ok(cfg) => cfg,
            Err(e) => {
                error!("Config load error: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        AppConfig::default()
    };

    let parser = match build_parser(&config) {
        Ok(p) => Arc::new(p),
        Err(e) => {
            error!("Failed to initialize parser: {}", e);
            std::process::exit(1);
        }
    };

    if command == "parse" {
        let parsed = parser.parse(&rest.join(" "));
        print_json(&parsed);
        return;
    }

    let store: Arc<dyn RequestStore> = match SqliteStore::open(&config.database_path) {
        Ok(s) => Arc::new(s),
        Err(e) => {
            error!("Failed to initialize storage: {}", e);
            std::process::exit(1);
        }
    };
    let dispatcher = build_dispatcher(&config);
    let engine = MatchEngine::new(dispatcher, store.clone(), config.fulfillment);
    let service = WatchService::new(parser, store, engine);

    let outcome = match (command.as_str(), rest) {
        ("request", [email, query @ ..]) if !query.is_empty() => service
            .create_request(email, &query.join(" "))
            .await
            .map(|request| print_json(&request)),
        ("product", [path]) => match read_product(path) {
            Ok(product) => service.on_product_saved(&product).await.map(|report| {
                for evaluation in &report.evaluations {
                    info!(
                        "request {} -> {:?}{}",
                        evaluation.request.id,
                        evaluation.verdict,
                        evaluation
                            .persist_error
                            .as_ref()
                            .map(|e| format!(" (not saved: {})", e))
                            .unwrap_or_default()
                    );
                }
                let updated: Vec<_> = report.updated().collect();
                print_json(&updated);
            }),
            Err(e) => {
                error!("{}", e);
                std::process::exit(1);
            }
        },
        ("requests", []) => service.requests(None).await.map(|list| print_json(&list)),
        ("requests", [status]) => match status.parse::<RequestStatus>() {
            Ok(status) => service
                .requests(Some(status))
                .await
                .map(|list| print_json(&list)),
            Err(e) => {
                error!("{}", e);
                std::process::exit(2);
            }
        },
        _ => {
            eprintln!("{}", USAGE);
            std::process::exit(2);
        }
    };

    if let Err(e) = outcome {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn build_parser(config: &AppConfig) -> Result<QueryParser, Box<dyn std::error::Error>> {
    let vocabulary = match &config.vocabulary_path {
        Some(path) => {
            info!("Loading vocabulary from {}", path);
            Vocabulary::load(path)?
        }
        None => Vocabulary::builtin(),
    };
    Ok(QueryParser::new(vocabulary, config.parser)?)
}

fn build_dispatcher(config: &AppConfig) -> Arc<dyn NotificationDispatcher> {
    match &config.notifier.webhook_url {
        Some(url) => match WebhookNotifier::new(url.clone(), &config.notifier) {
            Ok(notifier) => Arc::new(notifier),
            Err(e) => {
                warn!("Mail relay unavailable ({}), logging notifications instead", e);
                Arc::new(LogNotifier::new())
            }
        },
        None => {
            info!("No mail relay configured, notifications go to the log");
            Arc::new(LogNotifier::new())
        }
    }
}

fn read_product(path: &str) -> Result<Product, String> {
    let content = fs::read_to_string(path).map_err(|e| format!("cannot read {}: {}", path, e))?;
    serde_json::from_str(&content).map_err(|e| format!("cannot parse {}: {}", path, e))
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => warn!("Failed to serialize output: {}", e),
    }
}
