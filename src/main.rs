use clap::{Parser, Subcommand, ValueEnum};
use libretto::client::{HttpTransport, SearchSession};
use libretto::{Composer, Config, app};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(name = "libretto")]
#[command(about = "Opera libretto search service and query client", long_about = None)]
struct Cli {
    /// Service endpoint used by the query commands
    #[arg(long, global = true, env = "LIBRETTO_ENDPOINT")]
    endpoint: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Start the web service
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
        /// CSV directory or .xlsx workbook
        #[arg(long)]
        data: Option<PathBuf>,
        /// Directory served under /static
        #[arg(long)]
        static_dir: Option<PathBuf>,
        /// Cache lifetime in seconds
        #[arg(long)]
        cache_ttl: Option<u64>,
    },
    /// Lines of the given scenes (codes like 1-2, or "all")
    Scene {
        composer: Composer,
        opera: String,
        #[arg(value_delimiter = ',', required = true)]
        scenes: Vec<String>,
    },
    /// Lines on the given score pages (e.g. "12-15, 20")
    Page {
        composer: Composer,
        opera: String,
        pages: String,
    },
    /// Lines containing a German term
    Terms { composer: Composer, query: String },
    /// Autocomplete suggestions for a partial term
    Complete { composer: Composer, input: String },
    /// A reference list page
    List {
        #[arg(value_enum)]
        kind: ListKind,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ListKind {
    List,
    Abbr,
    Dic,
    Notes,
}

impl ListKind {
    fn action(self) -> &'static str {
        match self {
            ListKind::List => "getListHtml",
            ListKind::Abbr => "getAbbrListHtml",
            ListKind::Dic => "getDicHtml",
            ListKind::Notes => "getNotesHtml",
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let mut config = Config::load()?;

    if let Commands::Serve {
        host,
        port,
        data,
        static_dir,
        cache_ttl,
    } = cli.command
    {
        if let Some(host) = host {
            config.host = host;
        }
        if let Some(port) = port {
            config.port = port;
        }
        if let Some(data) = data {
            config.data_path = data;
        }
        if static_dir.is_some() {
            config.static_dir = static_dir;
        }
        if let Some(secs) = cache_ttl {
            config.cache_ttl = Duration::from_secs(secs);
        }
        return app::run(config).await;
    }

    let endpoint = cli.endpoint.unwrap_or(config.endpoint);
    let session = SearchSession::new(HttpTransport::new(endpoint));

    let output = match cli.command {
        Commands::Scene {
            composer,
            opera,
            scenes,
        } => session.search_by_scene(composer, &opera, &scenes).await,
        Commands::Page {
            composer,
            opera,
            pages,
        } => session.search_by_page(composer, &opera, &pages).await,
        Commands::Terms { composer, query } => session.search_terms(composer, &query).await,
        Commands::Complete { composer, input } => session
            .suggestions(composer, &input)
            .await
            .map(|terms| terms.join("\n")),
        Commands::List { kind } => session.html(kind.action(), &[]).await,
        Commands::Serve { .. } => None,
    };

    if let Some(text) = output {
        println!("{}", text);
    }
    Ok(())
}
