//! Loumina CLI: ingest a corpus and query it.
//!
//! ```bash
//! loumina ingest --root ./notes --exts .md,.txt
//! loumina query "offline sync" --mode hybrid -k 5
//! loumina query "offline sync" --mode lexical --rerank
//! loumina ask "how do backups work"
//! ```
//!
//! Results are printed as JSON on stdout; logs and progress go to stderr.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

use loumina_core::config::{Config, Settings};
use loumina_hybrid::pipeline::ask;
use loumina_hybrid::{FusionParams, IngestTargets, RetrievalContext};

/// Hybrid lexical + dense retrieval over a local corpus.
#[derive(Parser)]
#[command(name = "loumina", version, about)]
struct Cli {
    /// Corpus root (default: `corpus_root` from configuration)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Rebuild the indexes from the corpus
    Ingest {
        /// Comma-separated extension allow-list, e.g. `.md,.txt`
        #[arg(long, value_delimiter = ',')]
        exts: Option<Vec<String>>,

        /// Maximum vocabulary size of the dense index
        #[arg(long)]
        max_vocab: Option<usize>,

        /// Only rebuild the lexical index
        #[arg(long, conflicts_with = "dense_only")]
        lexical_only: bool,

        /// Only rebuild the dense index
        #[arg(long)]
        dense_only: bool,
    },
    /// Rank documents for a query
    Query {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,

        #[arg(long, value_enum, default_value_t = Mode::Hybrid)]
        mode: Mode,

        #[command(flatten)]
        ranking: RankingArgs,

        /// Re-score lexical hits against their snippets
        #[arg(long)]
        rerank: bool,
    },
    /// Run the answer pipeline over hybrid results
    Ask {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,

        #[command(flatten)]
        ranking: RankingArgs,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    Lexical,
    Dense,
    Hybrid,
}

#[derive(Args)]
struct RankingArgs {
    /// Number of results (default: `retrieval.k`)
    #[arg(short, long)]
    k: Option<usize>,

    /// Lexical weight in [0, 1] (default: `retrieval.alpha`)
    #[arg(long)]
    alpha: Option<f64>,

    /// Freshness half-life in days (default: `retrieval.half_life_days`)
    #[arg(long)]
    half_life: Option<f64>,
}

impl RankingArgs {
    fn k(&self, settings: &Settings) -> usize {
        self.k.unwrap_or(settings.retrieval.k)
    }

    fn alpha(&self, settings: &Settings) -> f64 {
        self.alpha.unwrap_or(settings.retrieval.alpha)
    }

    fn fusion_params(&self, settings: &Settings) -> anyhow::Result<FusionParams> {
        let half_life = self.half_life.unwrap_or(settings.retrieval.half_life_days);
        Ok(FusionParams::new(self.alpha(settings), half_life)?)
    }
}

fn spinner(msg: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {msg}") {
        pb.set_style(style);
    }
    pb.set_message(msg);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn print_json(value: &impl serde::Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

struct Runtime {
    settings: Settings,
    corpus_root: PathBuf,
    ctx: RetrievalContext,
}

impl Runtime {
    fn new(settings: Settings, root: Option<PathBuf>) -> Self {
        let corpus_root = root.unwrap_or_else(|| settings.corpus_root_path());
        let state_dir = settings.state_dir_path();
        info!(
            corpus_root = %corpus_root.display(),
            state_dir = %state_dir.display(),
            "loumina starting"
        );
        Self {
            settings,
            corpus_root,
            ctx: RetrievalContext::new(state_dir),
        }
    }

    fn root(&self) -> &Path {
        &self.corpus_root
    }

    /// The lexical index lives in memory only, so every process rebuilds it.
    fn load_lexical(&self) -> anyhow::Result<()> {
        let pb = spinner("building lexical index".to_string());
        let stats = self
            .ctx
            .ingest_lexical(self.root(), &self.settings.extensions)?;
        pb.finish_and_clear();
        info!(docs = stats.doc_count, "lexical index ready");
        Ok(())
    }

    fn ingest(
        &self,
        exts: Option<Vec<String>>,
        max_vocab: Option<usize>,
        targets: IngestTargets,
    ) -> anyhow::Result<()> {
        let exts = exts.unwrap_or_else(|| self.settings.extensions.clone());
        let max_vocab = max_vocab.unwrap_or(self.settings.retrieval.max_vocab);
        let pb = spinner(format!("ingesting {}", self.root().display()));
        let report = self.ctx.ingest(self.root(), &exts, max_vocab, targets)?;
        pb.finish_with_message("ingest complete");
        print_json(&report)
    }

    fn query(
        &self,
        text: &str,
        mode: Mode,
        ranking: &RankingArgs,
        rerank: bool,
    ) -> anyhow::Result<()> {
        if rerank && mode != Mode::Lexical {
            bail!("--rerank applies to --mode lexical only");
        }
        let k = ranking.k(&self.settings);
        match mode {
            Mode::Lexical if rerank => {
                self.load_lexical()?;
                let alpha = ranking.alpha(&self.settings);
                print_json(&self.ctx.query_reranked(text, k, alpha)?)
            }
            Mode::Lexical => {
                self.load_lexical()?;
                print_json(&self.ctx.query_lexical(text, k)?)
            }
            Mode::Dense => print_json(&self.ctx.query_dense(text, k)?),
            Mode::Hybrid => {
                let params = ranking.fusion_params(&self.settings)?;
                self.load_lexical()?;
                print_json(&self.ctx.query_hybrid(text, k, &params)?)
            }
        }
    }

    fn ask(&self, text: &str, ranking: &RankingArgs) -> anyhow::Result<()> {
        let k = ranking.k(&self.settings);
        let params = ranking.fusion_params(&self.settings)?;
        self.load_lexical()?;
        let response = ask(self.ctx.engine(), text, k, &params)?;
        print_json(&json!({
            "query": text,
            "k": k,
            "alpha": params.alpha,
            "half_life_days": params.half_life_days,
            "response": response,
        }))
    }
}

fn ingest_targets(lexical_only: bool, dense_only: bool) -> IngestTargets {
    match (lexical_only, dense_only) {
        (true, _) => IngestTargets::LexicalOnly,
        (_, true) => IngestTargets::DenseOnly,
        _ => IngestTargets::Both,
    }
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_env("LOUMINA_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let settings = Config::load()
        .context("loading configuration")?
        .settings()?;
    let rt = Runtime::new(settings, cli.root);

    match cli.command {
        Command::Ingest {
            exts,
            max_vocab,
            lexical_only,
            dense_only,
        } => rt.ingest(exts, max_vocab, ingest_targets(lexical_only, dense_only)),
        Command::Query {
            text,
            mode,
            ranking,
            rerank,
        } => rt.query(&text.join(" "), mode, &ranking, rerank),
        Command::Ask { text, ranking } => rt.ask(&text.join(" "), &ranking),
    }
}
