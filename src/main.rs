//! unarc - archive detection and extraction

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use unarc::archive::{self, native, FileType, NativeFormat};
use unarc::config::ExtractConfig;

#[derive(Parser)]
#[command(name = "unarc")]
#[command(version)]
#[command(about = "Detect, extract and pack ZIP, TAR, GZ, BZ2, 7z and RAR archives")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (use RUST_LOG=debug for more detail)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Copy buffer size in bytes for streaming readers
    #[arg(long, global = true, default_value_t = unarc::config::DEFAULT_BUFFER_SIZE)]
    buffer_size: usize,

    /// Charset tried first for ZIP entry names (UTF-8 is always the retry)
    #[arg(long, global = true, default_value = "gbk")]
    charset: String,

    /// Allow entries to resolve outside the destination directory
    #[arg(long, global = true)]
    no_contain: bool,

    /// 7-Zip executable used for the RAR fallback
    #[arg(long, global = true, env = "UNARC_7Z")]
    sevenzip: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the detected archive type
    Detect {
        /// Files to classify
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Extract an archive
    Extract {
        /// Archive to extract
        archive: PathBuf,

        /// Destination directory
        #[arg(short, long)]
        output: PathBuf,

        /// Skip detection and extract through the 7-Zip backend as this format
        #[arg(long, value_enum)]
        native: Option<NativeArg>,
    },

    /// Zip a directory without a top-level folder
    Zip {
        /// Directory to pack
        source: PathBuf,

        /// Output .zip file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Zip a mix of files and directories
    Pack {
        /// Output .zip file
        output: PathBuf,

        /// Files and directories to add
        #[arg(required = true)]
        sources: Vec<PathBuf>,
    },

    /// Gzip a single file
    Gzip {
        /// File to compress
        source: PathBuf,

        /// Output .gz file (defaults to <source>.gz)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Locate and probe the 7-Zip executable
    Backend,
}

#[derive(Clone, Copy, ValueEnum)]
enum NativeArg {
    Rar5,
    Rar,
    #[value(name = "7z")]
    SevenZip,
    Zip,
}

impl From<NativeArg> for NativeFormat {
    fn from(arg: NativeArg) -> Self {
        match arg {
            NativeArg::Rar5 => NativeFormat::Rar5,
            NativeArg::Rar => NativeFormat::Rar,
            NativeArg::SevenZip => NativeFormat::SevenZip,
            NativeArg::Zip => NativeFormat::Zip,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG takes precedence over --verbose
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if cli.verbose { "unarc=info" } else { "unarc=warn" }));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    let config = ExtractConfig {
        buffer_size: cli.buffer_size,
        contain_paths: !cli.no_contain,
        sevenzip_path: cli.sevenzip,
        ..Default::default()
    }
    .with_charset_label(&cli.charset)?;
    config.validate().context("Invalid configuration")?;

    match cli.command {
        Commands::Detect { files } => {
            let mut unknown = 0;
            for file in &files {
                let file_type = archive::classify(file);
                if file_type == FileType::Unknown {
                    unknown += 1;
                }
                println!("{}\t{}", file_type, file.display());
            }
            if unknown > 0 {
                std::process::exit(1);
            }
        }

        Commands::Extract {
            archive: file,
            output,
            native: Some(format),
        } => {
            let summary = native::extract_with(&file, &output, format.into(), &config)
                .with_context(|| format!("Failed to extract {}", file.display()))?;
            println!(
                "Extracted {} -> {} ({} extracted, {} failed)",
                file.display(),
                output.display(),
                summary.extracted,
                summary.failed
            );
        }

        Commands::Extract {
            archive: file,
            output,
            native: None,
        } => {
            let result = archive::decompress_detailed(&file, &output, &config);
            if !result.success {
                match result.cause {
                    Some(e) => bail!("Failed to extract {}: {}", file.display(), e),
                    None => bail!("Not a supported archive: {}", file.display()),
                }
            }
            println!("Extracted {} -> {}", file.display(), output.display());
        }

        Commands::Zip { source, output } => {
            archive::zip_dir(&source, &output)
                .with_context(|| format!("Failed to zip {}", source.display()))?;
            println!("Wrote {}", output.display());
        }

        Commands::Pack { output, sources } => {
            if !archive::zip_files(&output, &sources)
                .with_context(|| format!("Failed to write {}", output.display()))?
            {
                bail!("Nothing to pack");
            }
            println!("Wrote {}", output.display());
        }

        Commands::Gzip { source, output } => {
            let output = output.unwrap_or_else(|| {
                let mut name = source.clone().into_os_string();
                name.push(".gz");
                PathBuf::from(name)
            });
            if !archive::gzip(&source, &output) {
                bail!("Failed to gzip {}", source.display());
            }
            println!("Wrote {}", output.display());
        }

        Commands::Backend => match native::ensure_backend(&config) {
            Some(bin) => println!("7-Zip ready: {}", bin.display()),
            None => bail!("No usable 7-Zip executable found ({:?})", archive::backend_state()),
        },
    }

    Ok(())
}
