//! Conservation status prediction CLI
//!
//! Classifies species feature sets with a pre-trained model artifact.

use clap::{Parser, Subcommand};
use redlist::{Config, Result};

#[derive(Parser)]
#[command(name = "redlist")]
#[command(about = "Conservation status classification from species feature sets", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a feature CSV with a trained model
    Predict {
        /// Feature CSV (one row per species)
        features: String,
        /// Model artifact directory (overrides config)
        #[arg(long)]
        model: Option<String>,
        /// Include per-class probabilities in the output
        #[arg(long)]
        probabilities: bool,
        /// Output format
        #[arg(long, default_value = "table")]
        format: OutputFormat,
    },
    /// Model management commands
    Model {
        #[command(subcommand)]
        action: ModelCommands,
    },
    /// Initialize a new project with default config
    Init,
}

#[derive(Subcommand)]
enum ModelCommands {
    /// Show model information
    Info {
        /// Model artifact directory (overrides config)
        #[arg(long)]
        model: Option<String>,
    },
}

#[derive(Clone, Debug)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(format!("Unknown format: {}. Use table, json, or csv.", s)),
        }
    }
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Load or create config
    let config = if std::path::Path::new(&cli.config).exists() {
        match Config::load(&cli.config) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        Config::default()
    };

    // Run command
    let result = match cli.command {
        Commands::Predict {
            features,
            model,
            probabilities,
            format,
        } => commands::predict(&config, &features, model, probabilities, format, cli.verbose),
        Commands::Model { action } => match action {
            ModelCommands::Info { model } => commands::model_info(&config, model),
        },
        Commands::Init => commands::init(&cli.config),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

mod commands {
    use super::*;
    use redlist::model::ClassifierConfig;
    use redlist::{predict as run_predict, FeatureMatrix};
    use std::path::Path;

    type MyBackend = burn::backend::NdArray<f32>;

    pub fn init(config_path: &str) -> Result<()> {
        let config = Config::default();
        config.save(config_path)?;
        println!("Created default config at {}", config_path);

        std::fs::create_dir_all(&config.model_dir)?;
        println!("Created {}/ directory", config.model_dir);

        println!("\nNext steps:");
        println!("  1. Edit {} to point at your model artifact", config_path);
        println!("  2. Run 'redlist model info' to inspect the artifact");
        println!("  3. Run 'redlist predict features.csv' to classify");

        Ok(())
    }

    pub fn predict(
        config: &Config,
        features_path: &str,
        model: Option<String>,
        probabilities: bool,
        format: OutputFormat,
        verbose: bool,
    ) -> Result<()> {
        let model_dir = model.unwrap_or_else(|| config.model_dir.clone());

        println!("Reading features from {}...", features_path);
        let features = FeatureMatrix::from_csv(features_path)?;
        println!(
            "Loaded {} samples x {} features",
            features.n_samples(),
            features.n_features()
        );

        let prediction =
            run_predict::<MyBackend>(&features, &model_dir, verbose, probabilities)?;
        let class_names = ClassifierConfig::load(Path::new(&model_dir))?
            .class_names
            .unwrap_or_default();

        match format {
            OutputFormat::Table => {
                println!("\n{:>6}  {:>5}  {:<8}{}", "sample", "label", "class", if probabilities { "  probabilities" } else { "" });
                for (i, label) in prediction.labels.iter().enumerate() {
                    let name = class_names.get(*label).map(String::as_str).unwrap_or("-");
                    let probs = match &prediction.probabilities {
                        Some(rows) => format!(
                            "  [{}]",
                            rows[i]
                                .iter()
                                .map(|p| format!("{:.3}", p))
                                .collect::<Vec<_>>()
                                .join(", ")
                        ),
                        None => String::new(),
                    };
                    println!("{:>6}  {:>5}  {:<8}{}", i, label, name, probs);
                }
            }
            OutputFormat::Json => {
                let names: Vec<Option<String>> = prediction
                    .labels
                    .iter()
                    .map(|l| class_names.get(*l).cloned())
                    .collect();
                let json = serde_json::json!({
                    "labels": prediction.labels,
                    "class_names": names,
                    "probabilities": prediction.probabilities,
                });
                println!("{}", serde_json::to_string_pretty(&json).unwrap());
            }
            OutputFormat::Csv => {
                match &prediction.probabilities {
                    Some(rows) => {
                        let n = rows.first().map(|r| r.len()).unwrap_or(0);
                        let prob_cols = (0..n)
                            .map(|c| format!("p{}", c))
                            .collect::<Vec<_>>()
                            .join(",");
                        println!("sample,label,class,{}", prob_cols);
                    }
                    None => println!("sample,label,class"),
                }
                for (i, label) in prediction.labels.iter().enumerate() {
                    let name = class_names.get(*label).map(String::as_str).unwrap_or("");
                    match &prediction.probabilities {
                        Some(rows) => {
                            let probs = rows[i]
                                .iter()
                                .map(|p| format!("{:.6}", p))
                                .collect::<Vec<_>>()
                                .join(",");
                            println!("{},{},{},{}", i, label, name, probs);
                        }
                        None => println!("{},{},{}", i, label, name),
                    }
                }
            }
        }

        Ok(())
    }

    pub fn model_info(config: &Config, model: Option<String>) -> Result<()> {
        let model_dir = model.unwrap_or_else(|| config.model_dir.clone());
        let meta = ClassifierConfig::load(Path::new(&model_dir))?;

        println!("Model Information");
        println!("───────────────────────────────");
        println!("  Path:          {}", model_dir);
        println!("  Input dim:     {}", meta.input_dim);
        println!(
            "  Hidden layers: {}",
            meta.hidden_dims
                .iter()
                .map(|d| d.to_string())
                .collect::<Vec<_>>()
                .join(" → ")
        );
        println!("  Classes:       {}", meta.n_classes);
        println!("  Dropout:       {}", meta.dropout);
        if let Some(names) = &meta.class_names {
            println!("  Class names:   {}", names.join(", "));
        }

        Ok(())
    }
}
