use anyhow::Context;
use clap::{Arg, Command};
use log::LevelFilter;
use spam_responder::classifier::Classifier;
use spam_responder::config::{self, Config};
use spam_responder::encoding::FeatureEncoder;
use spam_responder::maintenance::{self, MaintenanceOutcome};
use spam_responder::message::ParsedEmail;
use spam_responder::responder::{Responder, StorageEvent};
use spam_responder::services::{
    HttpInferenceClient, HttpMailer, HttpNotebookControl, HttpObjectStore,
};
use std::io::Read;
use std::process;

#[tokio::main]
async fn main() {
    let matches = Command::new("spam-responder")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Classifies inbound email with a hosted spam model and replies with the verdict")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path (.toml, .yaml or .yml)")
                .default_value(config::DEFAULT_CONFIG_PATH),
        )
        .arg(
            Arg::new("generate-config")
                .long("generate-config")
                .value_name("FILE")
                .help("Generate a default configuration file")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("test-config")
                .long("test-config")
                .help("Validate the configuration and exit")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("event")
                .long("event")
                .value_name("FILE")
                .help("Handle a storage notification event ('-' reads stdin)")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("classify")
                .long("classify")
                .value_name("FILE")
                .help("Classify a raw email file without sending a reply")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("encode")
                .long("encode")
                .value_name("TEXT")
                .help("Show the tokens and feature slots for a piece of text")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("notebook-maintenance")
                .long("notebook-maintenance")
                .help("Stop the notebook instance if running, otherwise start it")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("endpoint")
                .long("endpoint")
                .value_name("NAME")
                .help("Inference endpoint name, overrides the configuration file")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable debug logging")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    let log_level = if matches.get_flag("verbose") {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    if let Some(generate_path) = matches.get_one::<String>("generate-config") {
        generate_default_config(generate_path);
        return;
    }

    let config_path = matches
        .get_one::<String>("config")
        .map(String::as_str)
        .unwrap_or(config::DEFAULT_CONFIG_PATH);
    let mut config = match config::load_config_or_default(config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            process::exit(1);
        }
    };

    if let Some(endpoint) = matches.get_one::<String>("endpoint") {
        config.inference.endpoint_name = Some(endpoint.clone());
    }

    if let Some(text) = matches.get_one::<String>("encode") {
        if let Err(e) = show_encoding(&config, text) {
            eprintln!("❌ {e:#}");
            process::exit(1);
        }
        return;
    }

    if matches.get_flag("notebook-maintenance") {
        match run_notebook_maintenance(&config).await {
            Ok(outcome) => println!("Notebook maintenance: {outcome:?}"),
            Err(e) => {
                eprintln!("❌ Notebook maintenance failed: {e:#}");
                process::exit(1);
            }
        }
        return;
    }

    if let Err(e) = config.validate() {
        eprintln!("❌ {e}");
        process::exit(1);
    }

    if matches.get_flag("test-config") {
        println!("🔍 Configuration: {config_path}");
        println!("   Endpoint: {}", config.endpoint_name().unwrap_or("-"));
        println!(
            "   Vocabulary size: {} ({} hashing)",
            config.encoding.vocabulary_size, config.encoding.hash
        );
        println!("✅ Configuration is valid");
        return;
    }

    if let Some(email_file) = matches.get_one::<String>("classify") {
        if let Err(e) = classify_file(&config, email_file).await {
            eprintln!("❌ Classification failed: {e:#}");
            process::exit(1);
        }
        return;
    }

    if let Some(event_source) = matches.get_one::<String>("event") {
        if let Err(e) = handle_event(&config, event_source).await {
            log::error!("Invocation failed: {e:#}");
            process::exit(1);
        }
        return;
    }

    eprintln!("Nothing to do: pass --event, --classify, --encode or --notebook-maintenance");
    process::exit(2);
}

fn generate_default_config(path: &str) {
    let mut config = Config::default();
    config.inference.endpoint_name = Some("sms-spam-classifier".to_string());
    match config.to_file(path) {
        Ok(()) => {
            println!("Default configuration written to: {path}");
            println!("Set inference.endpoint_name and the service base URLs before use.");
        }
        Err(e) => {
            eprintln!("Error writing configuration file: {e}");
            process::exit(1);
        }
    }
}

fn build_classifier(config: &Config) -> anyhow::Result<Classifier<HttpInferenceClient>> {
    let encoder = FeatureEncoder::from_config(&config.encoding)?;
    let inference = HttpInferenceClient::new(&config.inference.service)?;
    Ok(Classifier::new(encoder, config.endpoint_name()?, inference)?)
}

async fn handle_event(config: &Config, source: &str) -> anyhow::Result<()> {
    let json = if source == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read event from stdin")?;
        buf
    } else {
        std::fs::read_to_string(source)
            .with_context(|| format!("Failed to read event file: {source}"))?
    };
    log::info!("Received event: {}", json.trim());

    let event = StorageEvent::from_json(&json)?;
    let responder = Responder::new(
        HttpObjectStore::new(&config.storage)?,
        build_classifier(config)?,
        HttpMailer::new(&config.mailer)?,
        config.reply.clone(),
    );

    let handled = responder.handle_event(&event).await?;
    log::info!(
        "Replied to {} ({} with {}% confidence)",
        handled.reply.destination,
        handled.verdict.label,
        handled.verdict.confidence_percent()
    );
    Ok(())
}

async fn classify_file(config: &Config, email_file: &str) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(email_file)
        .with_context(|| format!("Failed to read email file: {email_file}"))?;
    let email = ParsedEmail::parse(&raw);

    println!("📧 Email Details:");
    println!("   From: {}", email.from.as_deref().unwrap_or("-"));
    println!("   To: {}", email.to.as_deref().unwrap_or("-"));
    println!("   Subject: {}", email.subject.as_deref().unwrap_or("-"));
    println!("   Date: {}", email.date.as_deref().unwrap_or("-"));
    println!("   Sample: {}", email.body_sample(config.reply.sample_length));
    println!();

    let verdict = build_classifier(config)?.classify(&email.body).await?;
    println!(
        "Verdict: {} ({}% confidence)",
        verdict.label,
        verdict.confidence_percent()
    );
    Ok(())
}

fn show_encoding(config: &Config, text: &str) -> anyhow::Result<()> {
    let encoder = FeatureEncoder::from_config(&config.encoding)?;
    let tokens = encoder.tokenize(text);
    let slots = encoder.one_hot(text);

    println!(
        "Vocabulary size: {} ({} hashing)",
        encoder.vocabulary_size(),
        encoder.strategy()
    );
    for (token, slot) in tokens.iter().zip(&slots) {
        println!("  {token:<24} -> {slot}");
    }

    let vector = encoder
        .feature_vectors(&[text])?
        .pop()
        .unwrap_or_default();
    let active = vector.iter().filter(|&&v| v > 0.0).count();
    println!("Active positions: {active} of {}", vector.len());
    Ok(())
}

async fn run_notebook_maintenance(config: &Config) -> anyhow::Result<MaintenanceOutcome> {
    let control = HttpNotebookControl::new(&config.notebook.service)?;
    Ok(maintenance::toggle_notebook(&control, &config.notebook.instance_name).await?)
}
