use adoption::cli::commands::{self, ListOptions};
use adoption::config::Config;
use adoption::{
  AdoptionStatus, FilterAction, FilterOperator, FilterState, SortDirection, SortField, SortState,
  ToolName,
};
use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(name = "adoption")]
#[command(about = "日本企業のAIツール導入状況\nSearch, filter and sort AI tool adoption across Japanese companies")]
#[command(version)]
struct Cli {
  /// Enable verbose logging
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Command,
}

/// Filter and sort controls shared by `list` and `ask`
#[derive(Args)]
struct TableArgs {
  /// Dataset URL or local JSON file (overrides config)
  #[arg(long)]
  data: Option<String>,
  /// Company name substring (case-insensitive)
  #[arg(short, long)]
  search: Option<String>,
  /// Single tool to filter on; needs --status to take effect
  #[arg(short, long)]
  tool: Option<ToolName>,
  /// Adoption status: 全社導入, 一部導入 or 導入してない
  #[arg(long)]
  status: Option<AdoptionStatus>,
  /// Tools to combine with --operator (comma-separated or repeated)
  #[arg(long, value_delimiter = ',')]
  tools: Vec<ToolName>,
  /// How --tools are combined
  #[arg(long, default_value = "AND")]
  operator: FilterOperator,
  /// Sort column: company_name or a tool name
  #[arg(long)]
  sort: Option<SortField>,
  /// Sort descending
  #[arg(long)]
  desc: bool,
  /// Show source details for every row
  #[arg(short, long)]
  details: bool,
  /// Show source details for these row numbers
  #[arg(short, long, value_delimiter = ',')]
  expand: Vec<usize>,
}

impl TableArgs {
  fn into_options(self) -> ListOptions {
    let mut filter = FilterState::default()
      .reduce(FilterAction::SelectTool(self.tool.into()))
      .reduce(FilterAction::SelectStatus(self.status.into()))
      .reduce(FilterAction::SetTools(self.tools))
      .reduce(FilterAction::SetOperator(self.operator));
    if let Some(term) = self.search {
      filter = filter.reduce(FilterAction::SetSearchTerm(term));
    }

    let direction = if self.desc { SortDirection::Desc } else { SortDirection::Asc };
    let sort = SortState::new(self.sort.unwrap_or(SortField::CompanyName), direction);

    ListOptions { data: self.data, filter, sort, details: self.details, expand: self.expand }
  }
}

#[derive(Subcommand)]
enum Command {
  /// Show the company table
  List {
    #[command(flatten)]
    table: TableArgs,
  },
  /// Natural-language search through the local language model
  Ask {
    /// Free-text query, e.g. "ChatGPTとCopilotを全社導入している企業"
    #[arg(required = true)]
    query: Vec<String>,
    #[command(flatten)]
    table: TableArgs,
  },
  /// Show whether the language model is ready
  Status {
    /// Keep polling and print every change
    #[arg(short, long)]
    watch: bool,
  },
  /// Show past natural-language queries
  History {
    /// Delete the stored history
    #[arg(long)]
    clear: bool,
  },
}

async fn handle(command: Command, config: &Config) -> Result<()> {
  match command {
    Command::List { table } => commands::list(config, &table.into_options()).await,
    Command::Ask { query, table } => {
      commands::ask(config, &query.join(" "), table.into_options()).await
    }
    Command::Status { watch } => commands::status(config, watch).await,
    Command::History { clear } => commands::history(clear),
  }
}

#[tokio::main]
async fn main() -> Result<()> {
  let cli = Cli::parse();

  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
    if cli.verbose {
      EnvFilter::new("adoption=debug,warn")
    } else {
      EnvFilter::new("adoption=warn,error")
    }
  });
  tracing_subscriber::registry().with(fmt::layer().with_writer(std::io::stderr)).with(filter).init();

  let config = Config::load()?;
  handle(cli.command, &config).await
}
