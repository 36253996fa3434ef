use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use focus_core::{ClassifiedDocument, ClassifierKind, Document, DEFAULT_CAPACITY};
use focus_crawler::{build_policy, DocumentClassificationPolicy, FilterConfig};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use time::format_description::well_known::Rfc3339;
use tokio::task::JoinSet;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "focus-filter")]
#[command(about = "Label crawled documents and prune the outlinks of irrelevant ones")]
struct Cli {
    #[command(flatten)]
    settings: Settings,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Settings {
    /// Directory that resource names are resolved against
    #[arg(long, env = "BAYES_CONF_DIR", default_value = "./conf")]
    conf_dir: PathBuf,
    /// Bootstrap training set resource (ID<TAB>LABEL<TAB>TOKENS per line)
    #[arg(long, env = "BAYES_TRAINING_FILE")]
    training_file: Option<String>,
    /// URL allow-list resource (one substring per line)
    #[arg(long, env = "BAYES_WORDS_FILE")]
    words_file: Option<String>,
    /// Base URL of the sample service; leave unset to disable sync
    #[arg(long, env = "BAYES_API_URL")]
    api_url: Option<String>,
    /// Number of most recent samples the classifier remembers
    #[arg(long, env = "BAYES_MEMORY_CAPACITY", default_value_t = DEFAULT_CAPACITY)]
    memory_capacity: usize,
    /// Sample sync request timeout seconds
    #[arg(long, env = "BAYES_SYNC_TIMEOUT_SECS", default_value_t = 10)]
    sync_timeout_secs: u64,
    /// "naive-bayes" or "fixed:<label>"
    #[arg(long, env = "BAYES_CLASSIFIER", default_value = "naive-bayes")]
    classifier: ClassifierKind,
}

impl Settings {
    fn to_config(&self) -> FilterConfig {
        FilterConfig {
            conf_dir: self.conf_dir.clone(),
            training_file: self.training_file.clone(),
            url_words_file: self.words_file.clone(),
            api_url: self.api_url.clone(),
            memory_capacity: self.memory_capacity,
            sync_timeout: Duration::from_secs(self.sync_timeout_secs),
            classifier: self.classifier.clone(),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a JSONL file of documents ({"url", "text", "outlinks": [{"to_url"}]})
    Classify {
        /// Input JSONL path
        #[arg(long)]
        input: String,
        /// Output JSONL path
        #[arg(long, default_value = "./sample_data/classified.jsonl")]
        output: String,
        /// Documents processed at once
        #[arg(long, default_value_t = 8)]
        concurrency: usize,
    },
    /// Print the label for a piece of text
    Label {
        text: Vec<String>,
    },
}

#[derive(Serialize)]
struct OutRecord<'a> {
    #[serde(flatten)]
    doc: &'a ClassifiedDocument,
    timestamp: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();
    let policy = Arc::new(build_policy(&cli.settings.to_config())?);

    match cli.command {
        Commands::Classify { input, output, concurrency } => {
            classify_file(policy, &input, &output, concurrency.max(1)).await
        }
        Commands::Label { text } => {
            policy.refresh().await;
            println!("{}", policy.label_text(&text.join(" ")));
            Ok(())
        }
    }
}

async fn classify_file(policy: Arc<DocumentClassificationPolicy>, input: &str, output: &str, concurrency: usize) -> Result<()> {
    if let Some(dir) = Path::new(output).parent() {
        fs::create_dir_all(dir).ok();
    }
    let reader = BufReader::new(File::open(input).with_context(|| format!("opening {input}"))?);
    let mut out = BufWriter::new(File::create(output).with_context(|| format!("creating {output}"))?);

    let mut inflight: JoinSet<ClassifiedDocument> = JoinSet::new();
    let mut stats = Stats::default();
    for (n, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() { continue; }
        let doc: Document = match serde_json::from_str(&line) {
            Ok(d) => d,
            Err(err) => {
                tracing::warn!(line = n + 1, error = %err, "skipping malformed document");
                continue;
            }
        };
        while inflight.len() >= concurrency {
            if let Some(res) = inflight.join_next().await {
                stats.emit(&mut out, &res?)?;
            }
        }
        let p = policy.clone();
        inflight.spawn(async move { p.process(&doc).await });
    }
    while let Some(res) = inflight.join_next().await {
        stats.emit(&mut out, &res?)?;
    }
    out.flush()?;

    let cursor = policy.corpus().read().last_training_id();
    tracing::info!(emitted = stats.emitted, ignored = stats.ignored, cursor, output, "classification complete");
    Ok(())
}

#[derive(Default)]
struct Stats {
    emitted: usize,
    ignored: usize,
}

impl Stats {
    fn emit(&mut self, out: &mut impl Write, doc: &ClassifiedDocument) -> Result<()> {
        let timestamp = time::OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default();
        serde_json::to_writer(&mut *out, &OutRecord { doc, timestamp })?;
        out.write_all(b"\n")?;
        self.emitted += 1;
        if doc.label == focus_core::IGNORE_LABEL {
            self.ignored += 1;
        }
        if self.emitted % 100 == 0 {
            tracing::info!(emitted = self.emitted, ignored = self.ignored, "progress");
        }
        Ok(())
    }
}
