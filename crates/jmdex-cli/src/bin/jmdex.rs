use clap::{Parser, Subcommand};

use jmdex_cli::commands::query_ops::QueryMode;
use jmdex_cli::commands::{build_ops, config_ops, example_ops, query_ops};
use jmdex_cli::trace_init::init_tracing;

#[derive(Parser)]
#[command(name = "jmdex", about = "JMdict index build tool")]
struct Cli {
    /// Emit log events as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build the entry store and per-language translation stores
    Build {
        /// JMdict XML file
        #[arg(short, long)]
        input: String,
        /// Output directory
        #[arg(short, long)]
        output: String,
        /// Version date stamp (YYYYMMDD)
        #[arg(short = 'd', long = "date", value_parser = parse_date_stamp)]
        date: Option<String>,
        /// Settings TOML file
        #[arg(long)]
        config: Option<String>,
    },
    /// Link an annotated example corpus to a built entry store
    Examples {
        /// Example corpus (A/B line pairs)
        #[arg(short, long)]
        input: String,
        /// Output example store (default: next to the entry store)
        #[arg(short, long)]
        output: Option<String>,
        /// Built entry store
        #[arg(short, long)]
        jmdict: String,
        /// Settings TOML file
        #[arg(long)]
        config: Option<String>,
    },
    /// Look up entries in a built index directory
    Query {
        /// Index directory
        dir: String,
        /// Translation language
        lang: String,
        /// Search expression
        expr: String,
        /// How the expression is matched
        #[arg(long, value_enum, default_value_t = QueryMode::Exact)]
        mode: QueryMode,
        /// Settings TOML file
        #[arg(long)]
        config: Option<String>,
    },
    /// Export default romaji mappings as TOML
    RomajiExport,
    /// Validate a custom romaji TOML file
    RomajiValidate {
        /// Path to the TOML file
        file: String,
    },
    /// Export default settings as TOML
    SettingsExport,
    /// Validate a custom settings TOML file
    SettingsValidate {
        /// Path to the TOML file
        file: String,
    },
}

fn parse_date_stamp(s: &str) -> Result<String, String> {
    if s.len() == 8 && s.bytes().all(|b| b.is_ascii_digit()) {
        Ok(s.to_string())
    } else {
        Err(format!("expected YYYYMMDD, got {s:?}"))
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    match cli.command {
        Command::Build {
            input,
            output,
            date,
            config,
        } => build_ops::build(&input, &output, date, config.as_deref()),
        Command::Examples {
            input,
            output,
            jmdict,
            config,
        } => example_ops::examples(&input, output.as_deref(), &jmdict, config.as_deref()),
        Command::Query {
            dir,
            lang,
            expr,
            mode,
            config,
        } => query_ops::query(&dir, &lang, &expr, mode, config.as_deref()),
        Command::RomajiExport => config_ops::romaji_export(),
        Command::RomajiValidate { file } => config_ops::romaji_validate(&file),
        Command::SettingsExport => config_ops::settings_export(),
        Command::SettingsValidate { file } => config_ops::settings_validate(&file),
    }
}
