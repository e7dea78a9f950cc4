use clap::{Parser, Subcommand};
use hashpix::config::{self, CONFIG_FILENAME};
use hashpix::sizes::{SizeSpec, SizeTable};
use hashpix::{DirectoryIndex, ImageRecord, ImageStore, Upload, inventory, output};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable holding the log filter, e.g. `HASHPIX_LOG=debug`.
const LOG_ENV: &str = "HASHPIX_LOG";

#[derive(Parser)]
#[command(name = "hashpix")]
#[command(about = "Store uploaded images as resized variants in a hashed directory tree")]
#[command(long_about = "\
Store uploaded images as resized variants in a hashed directory tree

Every image gets a 32-character identifier. Its variants are written to a
directory derived from that identifier, one file per configured size:

  public/images/uploads/
  └── 3/                           # first character
      └── f/                       # second character
          └── a9c0e1d2b4.../       # rest of the identifier
              ├── large.jpg
              ├── medium.jpg
              └── small.jpg        # .gif when the upload is animated

Sizes use ImageMagick geometry: 800x600, >800x600, 100x100!, 50%, 10000@.
Append :crop to fill the box and clip from the top-left corner.

Run 'hashpix gen-config' to generate a documented hashpix.toml.")]
#[command(version)]
struct Cli {
    /// Config file
    #[arg(long, default_value = CONFIG_FILENAME, global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Store an image and write its variants
    Put {
        /// Image file to store
        image: PathBuf,
        /// Replace the variants of an existing identifier
        #[arg(long)]
        id: Option<String>,
        /// Use these sizes instead of the configured ones (name=geometry[:crop])
        #[arg(long = "size", value_parser = parse_size_arg)]
        sizes: Vec<(String, SizeSpec)>,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete every variant of an identifier
    Delete { id: String },
    /// Print the public URL of a variant
    Url {
        id: String,
        /// Size name (defaults to the first configured size)
        #[arg(long)]
        size: Option<String>,
        /// Extension (defaults to whatever is on disk)
        #[arg(long)]
        ext: Option<String>,
    },
    /// List stored identifiers and their files
    List {
        /// Print the listing as JSON
        #[arg(long)]
        json: bool,
    },
    /// Load and validate the config file
    Check,
    /// Print a stock hashpix.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging();

    match cli.command {
        Command::Put {
            image,
            id,
            sizes,
            json,
        } => {
            let config = config::load_config(&cli.config)?;
            init_thread_pool(&config.processing);
            let save_root = config.save_path.clone();
            let store = ImageStore::new(config, DirectoryIndex::new(&save_root));

            let mut record = match id {
                Some(id) => ImageRecord::persisted(id, None),
                None => ImageRecord::new(),
            };
            if !sizes.is_empty() {
                let table: SizeTable = sizes.into_iter().collect();
                config::validate_size_names(&table)?;
                record.sizes = Some(table);
            }

            let upload = Upload::from_path(&image)?;
            match store.try_save(&mut record, Some(&upload)) {
                Ok(saved) if json => println!("{}", serde_json::to_string_pretty(&saved)?),
                Ok(saved) => output::print_saved(&saved, &save_root),
                Err(e) => {
                    for line in output::format_errors(&record.errors) {
                        eprintln!("{}", line);
                    }
                    return Err(e.into());
                }
            }
        }
        Command::Delete { id } => {
            let config = config::load_config(&cli.config)?;
            let save_root = config.save_path.clone();
            let store = ImageStore::new(config, DirectoryIndex::new(&save_root));
            let record = ImageRecord::persisted(id.as_str(), None);
            store.path(&record).ok_or_else(|| invalid_id(&id))?;
            let removed = store.destroy(&record);
            output::print_deleted(&id, &removed, &save_root);
        }
        Command::Url { id, size, ext } => {
            let config = config::load_config(&cli.config)?;
            let index = DirectoryIndex::new(&config.save_path);
            let store = ImageStore::new(config, index);
            let mut record = ImageRecord::persisted(id.as_str(), None);
            record.content_type = store.probe_content_type(&record);
            let url = store
                .url(&record, size.as_deref(), ext.as_deref())
                .ok_or_else(|| invalid_id(&id))?;
            println!("{}", url);
        }
        Command::List { json } => {
            let config = config::load_config(&cli.config)?;
            let records = inventory::list_records(&config.save_path)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&records)?);
            } else {
                output::print_listing(&records);
            }
        }
        Command::Check => {
            println!("==> Checking {}", cli.config.display());
            let config = config::load_config(&cli.config)?;
            output::print_config_summary(&config);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Parse `name=geometry[:policy]`.
fn parse_size_arg(arg: &str) -> Result<(String, SizeSpec), String> {
    let (name, spec) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected name=geometry, got {arg:?}"))?;
    Ok((name.to_string(), spec.parse()?))
}

fn invalid_id(id: &str) -> String {
    format!("{id:?} is not a valid identifier")
}

/// Log to stderr so stdout stays clean for command output.
fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; the config can lower it, not raise it.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
