mod logger;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use proxy_sheets::{
    BoardFilter, CatalogProvider, CutLineColor, DeckEntry, DeckSource, FetchOptions,
    FsCacheStore, ImagePipeline, JobRequest, ProgressSink, RateLimiter, ScryfallFetcher,
    SheetOptions, SplitPolicy, load_default_back, read_batch_file, run_batch, run_deck,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(
    name = "proxysheet",
    about = "Print-ready proxy sheets from deck lists",
    version
)]
struct Cli {
    /// Deck list CSV or Archidekt deck URL
    #[arg(short, long, conflicts_with = "batch_file", required_unless_present = "batch_file")]
    input: Option<String>,

    /// File with one `deck URL | optional name` per line
    #[arg(long)]
    batch_file: Option<PathBuf>,

    /// Deck name to use instead of the catalog's
    #[arg(long)]
    deckname: Option<String>,

    /// Output directory
    #[arg(short, long, default_value = "Output")]
    output_dir: PathBuf,

    /// Card image cache directory
    #[arg(long, default_value = "card_images")]
    cache_dir: PathBuf,

    /// Which documents to produce
    #[arg(long, default_value = "single", value_enum)]
    format: FormatArg,

    /// Gap between cards in mm
    #[arg(long)]
    padding_mm: Option<f32>,

    /// Include Archidekt maybeboard cards
    #[arg(long)]
    include_maybeboard: bool,

    /// Include Archidekt sideboard cards
    #[arg(long)]
    include_sideboard: bool,

    /// Image printed on backs that have no card back of their own
    #[arg(long)]
    default_back_image: Option<PathBuf>,

    /// Cut line and footer color as #rrggbb
    #[arg(long)]
    cut_line_color: Option<String>,

    /// Cut line thickness in mm
    #[arg(long)]
    cut_line_thickness_mm: Option<f32>,

    /// Delete the card images downloaded during this run when done
    #[arg(long)]
    purge_new: bool,

    /// Sheet options JSON file; flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Show debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Single,
    Double,
    Both,
    Smart,
}

impl From<FormatArg> for SplitPolicy {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Single => Self::Single,
            FormatArg::Double => Self::Double,
            FormatArg::Both => Self::Both,
            FormatArg::Smart => Self::Smart,
        }
    }
}

async fn sheet_options(cli: &Cli) -> Result<SheetOptions> {
    let mut options = match &cli.config {
        Some(path) => SheetOptions::load(path).await?,
        None => SheetOptions::default(),
    };

    if let Some(padding) = cli.padding_mm {
        options.padding_mm = padding;
    }
    if let Some(color) = &cli.cut_line_color {
        options.cut_line_color = color.parse::<CutLineColor>()?;
    }
    if let Some(thickness) = cli.cut_line_thickness_mm {
        options.cut_line_thickness_mm = thickness;
    }
    if let Some(path) = &cli.default_back_image {
        options.default_back = Some(load_default_back(path).await?);
    }

    options.validate()?;
    Ok(options)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logger::ConsoleLogger::new(cli.verbose).init()?;

    let sheet = sheet_options(&cli).await?;
    let fetch_options = FetchOptions::default();
    fetch_options.validate()?;

    let fetcher = ScryfallFetcher::new(fetch_options.request_timeout)?;
    let client = fetcher.client().clone();
    let store = FsCacheStore::open(&cli.cache_dir).await?;

    let (progress, mut updates) = ProgressSink::channel();
    let printer = tokio::spawn(async move {
        while let Some(update) = updates.recv().await {
            println!("{}", update);
        }
    });

    let pipeline = ImagePipeline::new(
        Arc::new(store),
        Arc::new(fetcher),
        Arc::new(RateLimiter::new(fetch_options.min_interval)),
        fetch_options,
    )
    .with_progress(progress);

    let request = JobRequest {
        output_dir: cli.output_dir.clone(),
        split: cli.format.into(),
        sheet,
        purge_new: cli.purge_new,
    };
    let boards = BoardFilter {
        include_maybeboard: cli.include_maybeboard,
        include_sideboard: cli.include_sideboard,
    };

    let report = if let Some(batch_file) = &cli.batch_file {
        let mut decks = Vec::new();
        for line in read_batch_file(batch_file).await? {
            match DeckSource::parse(&line.source) {
                Ok(source) => decks.push(DeckEntry {
                    provider: source.into_provider(&client, boards),
                    custom_name: line.custom_name,
                }),
                Err(e) => log::warn!("Skipping batch line: {}", e),
            }
        }
        run_batch(&pipeline, &decks, &request).await?
    } else if let Some(input) = &cli.input {
        let deck = DeckSource::parse(input)?
            .into_provider(&client, boards)
            .load()
            .await?;
        run_deck(&pipeline, &deck, cli.deckname.as_deref(), &request).await?
    } else {
        anyhow::bail!("Either --input or --batch-file is required");
    };

    // Dropping the pipeline closes the progress channel
    drop(pipeline);
    printer.await?;

    for path in &report.documents {
        println!("  {}", path.display());
    }
    for (deck, message) in &report.failed_decks {
        eprintln!("Failed: {}: {}", deck, message);
    }

    Ok(())
}
