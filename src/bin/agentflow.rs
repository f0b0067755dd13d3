//! CLI binary for agentflow.
//!
//! A thin shim over the library crate: each subcommand maps its flags onto
//! `WorkflowConfig`, runs one workflow and prints the resulting state.

use anyhow::{Context, Result};
use agentflow::collab::browser::{BrowserTarget, DEFAULT_SHOP_BASE};
use agentflow::collab::llm::LlmGenerator;
use agentflow::collab::FileCheckpointStore;
use agentflow::workflows::analysts::{AnalystOutcome, AnalystPlanner};
use agentflow::workflows::blog::BlogGenerator;
use agentflow::workflows::campaign::CampaignWriter;
use agentflow::workflows::image::ImageRecognizer;
use agentflow::workflows::shopping::{ProductQuery, ShoppingAgent, DEFAULT_BRAND, DEFAULT_QUERY};
use agentflow::workflows::summarize::{SummaryInput, Summarizer};
use agentflow::workflows::youtube::YouTubeSummarizer;
use agentflow::{
    answer_question, Credentials, DocumentContext, DocumentPipeline, ModelSettings,
    ProgressCallback, StepProgressCallback, WorkflowConfig,
};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers ──────────────────────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Spinner that names the running step and logs one line per finished,
/// skipped or degraded step.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Starting");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl StepProgressCallback for CliProgressCallback {
    fn on_workflow_start(&self, workflow: &str) {
        self.bar.set_prefix(workflow.to_string());
        self.bar
            .println(format!("{} {}", cyan("◆"), bold(&format!("Running {workflow}…"))));
    }

    fn on_step_start(&self, step: &str) {
        self.bar.set_message(format!("{step}…"));
    }

    fn on_step_complete(&self, step: &str, elapsed_ms: u64) {
        self.bar.println(format!(
            "  {} {:<16} {}",
            green("✔"),
            step,
            dim(&format!("{elapsed_ms}ms"))
        ));
    }

    fn on_step_skipped(&self, step: &str) {
        self.bar
            .println(format!("  {} {:<16} {}", dim("○"), step, dim("skipped")));
    }

    fn on_notice(&self, message: &str) {
        self.bar.println(format!("  {} {}", yellow("⚠"), message));
    }

    fn on_workflow_complete(&self, workflow: &str) {
        self.bar.set_message("done");
        self.bar
            .println(format!("{} {} {}", green("✔"), bold(workflow), dim("done")));
    }
}

impl Drop for CliProgressCallback {
    fn drop(&mut self) {
        self.bar.finish_and_clear();
    }
}

// ── CLI definition ───────────────────────────────────────────────────────────

const AFTER_HELP: &str = "\
EXAMPLES:
  agentflow document invoice.pdf --ask \"What is the total?\"
  agentflow summarize report.pdf
  agentflow summarize \"Some long text to condense...\"
  agentflow blog \"Benefits of Search & AI\" --feedback \"improve clarity\"
  agentflow image cat.jpg
  agentflow campaign \"Eco-Friendly Products\"
  agentflow shop --connect http://localhost:9222
  agentflow analysts start \"Robotics in physical AI\" --max-analysts 3
  agentflow analysts resume <SESSION_ID> --feedback \"add a skeptic\"
  agentflow youtube https://youtu.be/dQw4w9WgXcQ

ENVIRONMENT:
  OPENAI_API_KEY          OpenAI credential (default provider)
  GOOGLE_API_KEY          Gemini credential (youtube)
  TAVILY_API_KEY          Tavily web search (blog)
  EDGEQUAKE_LLM_PROVIDER  Override provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL         Override model
  RUST_LOG                Log filter, e.g. agentflow=debug";

#[derive(Parser, Debug)]
#[command(
    name = "agentflow",
    version,
    about = "Small LLM agent workflows from the command line",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Print the final workflow state as JSON.
    #[arg(long, global = true, env = "AGENTFLOW_JSON")]
    json: bool,

    /// Disable the progress spinner.
    #[arg(long, global = true, env = "AGENTFLOW_NO_PROGRESS")]
    no_progress: bool,

    /// Debug logging.
    #[arg(short, long, global = true, env = "AGENTFLOW_VERBOSE")]
    verbose: bool,

    /// Errors only.
    #[arg(short, long, global = true, env = "AGENTFLOW_QUIET")]
    quiet: bool,

    /// Directory or file of the pdfium shared library.
    #[arg(long, global = true, env = "PDFIUM_LIB_PATH")]
    pdfium_lib: Option<PathBuf>,

    /// Timeout in seconds for downloads and web requests.
    #[arg(long, global = true, env = "AGENTFLOW_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,
}

/// Model overrides shared by every LLM-backed subcommand.
#[derive(Args, Debug, Clone, Default)]
struct ModelArgs {
    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(long, env = "EDGEQUAKE_PROVIDER")]
    provider: Option<String>,

    /// Model identifier, e.g. gpt-4o-mini.
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// Sampling temperature override.
    #[arg(long)]
    temperature: Option<f32>,
}

impl ModelArgs {
    fn apply(&self, mut settings: ModelSettings) -> ModelSettings {
        if let Some(ref p) = self.provider {
            settings = settings.provider_name(p);
        }
        if let Some(ref m) = self.model {
            settings = settings.model(m);
        }
        if let Some(t) = self.temperature {
            settings = settings.temperature(t);
        }
        settings
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze a PDF (path or URL): text, OCR of embedded images, reasoning.
    Document {
        input: String,
        /// Follow-up question; repeat for several.
        #[arg(long = "ask")]
        questions: Vec<String>,
        #[arg(long, env = "AGENTFLOW_PDF_PASSWORD")]
        password: Option<String>,
        #[command(flatten)]
        model: ModelArgs,
    },
    /// Summarize a PDF path or a piece of raw text.
    Summarize {
        input: String,
        #[command(flatten)]
        model: ModelArgs,
    },
    /// Research a topic on the web and write a short blog post.
    Blog {
        topic: String,
        /// Feedback applied in a second pass; must mention "improve".
        #[arg(long)]
        feedback: Option<String>,
        #[command(flatten)]
        model: ModelArgs,
    },
    /// Describe an animal photo.
    Image {
        path: PathBuf,
        #[command(flatten)]
        model: ModelArgs,
    },
    /// Ideas, audience research, draft and final marketing post.
    Campaign {
        #[arg(default_value = "Eco-Friendly Products")]
        topic: String,
        #[command(flatten)]
        model: ModelArgs,
    },
    /// Find a product, add it to the cart, wait for payment, track shipping.
    Shop {
        #[arg(long, default_value = DEFAULT_QUERY)]
        query: String,
        #[arg(long, default_value = DEFAULT_BRAND)]
        brand: String,
        /// Attach to a running browser (e.g. http://localhost:9222).
        #[arg(long, env = "AGENTFLOW_BROWSER_URL")]
        connect: Option<String>,
        /// Launch the browser without a window.
        #[arg(long)]
        headless: bool,
        #[arg(long, default_value = DEFAULT_SHOP_BASE)]
        shop_base: String,
    },
    /// Analyst personas with human feedback.
    Analysts {
        #[command(subcommand)]
        action: AnalystsCommand,
    },
    /// Summarize a YouTube video from its transcript.
    Youtube {
        link: String,
        #[command(flatten)]
        model: ModelArgs,
    },
}

#[derive(Subcommand, Debug)]
enum AnalystsCommand {
    /// Generate personas and pause for feedback.
    Start {
        topic: String,
        #[arg(long, default_value_t = 3, value_parser = clap::value_parser!(u8).range(1..=5))]
        max_analysts: u8,
        #[arg(long, env = "AGENTFLOW_CHECKPOINT_DIR", default_value = ".agentflow/checkpoints")]
        checkpoint_dir: PathBuf,
        #[command(flatten)]
        model: ModelArgs,
    },
    /// Continue a paused session; blank feedback finalises it.
    Resume {
        session_id: String,
        #[arg(long, default_value = "")]
        feedback: String,
        #[arg(long, env = "AGENTFLOW_CHECKPOINT_DIR", default_value = ".agentflow/checkpoints")]
        checkpoint_dir: PathBuf,
        #[command(flatten)]
        model: ModelArgs,
    },
}

// ── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let credentials = Credentials::from_env();
    tracing::debug!("Credentials: {:?}", credentials);

    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn StepProgressCallback>)
    } else {
        None
    };

    let mut builder = WorkflowConfig::builder().download_timeout_secs(cli.download_timeout);
    if let Some(ref path) = cli.pdfium_lib {
        builder = builder.pdfium_lib_path(path);
    }
    if let Some(cb) = progress_cb {
        builder = builder.progress_callback(cb);
    }
    let base = builder.build().context("Invalid configuration")?;

    match &cli.command {
        Command::Document {
            input,
            questions,
            password,
            model,
        } => run_document(&cli, base, input, questions, password.as_deref(), model).await,
        Command::Summarize { input, model } => {
            let mut config = base;
            config.summarizer = model.apply(config.summarizer);
            let state = Summarizer::from_config(&config)?
                .run(SummaryInput::parse(input))
                .await
                .context("Summarization failed")?;
            emit(&cli, &state, || {
                print_notices(&state.notices);
                println!("{}", state.summary);
            })
        }
        Command::Blog {
            topic,
            feedback,
            model,
        } => {
            let mut config = base;
            config.blog = model.apply(config.blog);
            let generator = BlogGenerator::from_config(&config, &credentials)?;
            let mut state = generator.generate(topic).await.context("Blog generation failed")?;
            if let Some(feedback) = feedback {
                state = generator
                    .apply_feedback(state, feedback)
                    .await
                    .context("Applying feedback failed")?;
            }
            emit(&cli, &state, || {
                print_notices(&state.notices);
                println!("{}", state.blog);
            })
        }
        Command::Image { path, model } => {
            let mut config = base;
            config.vision = model.apply(config.vision);
            let bytes = tokio::fs::read(path)
                .await
                .with_context(|| format!("Failed to read image '{}'", path.display()))?;
            let state = ImageRecognizer::from_config(&config)?
                .run(&bytes)
                .await
                .context("Image recognition failed")?;
            emit(&cli, &state, || println!("{}", state.description))
        }
        Command::Campaign { topic, model } => {
            let mut config = base;
            config.campaign = model.apply(config.campaign);
            let state = CampaignWriter::from_config(&config)?
                .run(topic)
                .await
                .context("Campaign generation failed")?;
            emit(&cli, &state, || {
                print_notices(&state.notices);
                println!("{}\n\n{}", bold("Final post"), state.final_post);
            })
        }
        Command::Shop {
            query,
            brand,
            connect,
            headless,
            shop_base,
        } => {
            let target = match connect {
                Some(url) => BrowserTarget::Connect { url: url.clone() },
                None => BrowserTarget::Launch {
                    headless: *headless,
                },
            };
            let product = ProductQuery::new(query, brand, base.shopping_search_results);
            let (agent, store) = ShoppingAgent::from_config(&base, &target, shop_base)
                .await
                .context("Failed to open browser")?;
            let outcome = agent.run(&product).await;
            drop(agent);
            if let Ok(store) = Arc::try_unwrap(store) {
                store.close().await;
            }
            let state = outcome.context("Shopping agent failed")?;
            emit(&cli, &state, || {
                println!("Product URL:     {}", state.product_url.as_deref().unwrap_or("-"));
                println!("In cart:         {}", state.in_cart);
                println!("Payment done:    {}", state.payment_done);
                println!("Shipping status: {}", state.shipping_status);
                println!("Tracking URL:    {}", state.tracking_url);
            })
        }
        Command::Analysts { action } => run_analysts(&cli, base, action).await,
        Command::Youtube { link, model } => {
            let mut config = base;
            config.youtube = model.apply(config.youtube);
            let state = YouTubeSummarizer::from_config(&config, &credentials)?
                .run(link)
                .await
                .context("YouTube summary failed")?;
            emit(&cli, &state, || {
                print_notices(&state.notices);
                if let Some(ref thumb) = state.thumbnail_url {
                    println!("{}", dim(thumb));
                }
                match state.summary {
                    Some(ref summary) => println!("{}\n\n{}", bold("Detailed Notes:"), summary),
                    None => eprintln!("{}", yellow("No summary produced.")),
                }
            })
        }
    }
}

#[derive(Serialize)]
struct DocumentOutput<'a> {
    record: &'a agentflow::PipelineRecord,
    chat: &'a [agentflow::ChatTurn],
}

async fn run_document(
    cli: &Cli,
    mut config: WorkflowConfig,
    input: &str,
    questions: &[String],
    password: Option<&str>,
    model: &ModelArgs,
) -> Result<()> {
    config.document = model.apply(config.document);
    config.chat = model.apply(config.chat);
    config.ocr = ModelArgs {
        temperature: None,
        ..model.clone()
    }
    .apply(config.ocr);
    config.password = password.map(str::to_string);

    let resolved = agentflow::pipeline::input::resolve_input(input, config.download_timeout_secs)
        .await
        .context("Failed to resolve input")?;
    let record = DocumentPipeline::from_config(&config)?
        .run(resolved.path())
        .await
        .context("Document analysis failed")?;

    let mut chat = Vec::with_capacity(questions.len());
    if !questions.is_empty() {
        let generator = LlmGenerator::from_settings(&config.chat)?;
        let context = DocumentContext::from_record(&record);
        for question in questions {
            let turn = answer_question(&generator, &config.chat, &context, question)
                .await
                .with_context(|| format!("Failed to answer '{question}'"))?;
            chat.push(turn);
        }
    }

    let output = DocumentOutput {
        record: &record,
        chat: &chat,
    };
    emit(cli, &output, || {
        print_notices(&record.notices);
        println!(
            "{}",
            dim(&format!(
                "{} pages, {} images, {} OCR results",
                record.pages.len(),
                record.images.len(),
                record.ocr_results.len()
            ))
        );
        for line in &record.answer_lines {
            println!("{line}");
        }
        for turn in &chat {
            println!("\n{} {}", bold("You:"), turn.question);
            println!("{} {}", bold("Agent:"), turn.answer);
        }
    })
}

async fn run_analysts(cli: &Cli, mut config: WorkflowConfig, action: &AnalystsCommand) -> Result<()> {
    let outcome = match action {
        AnalystsCommand::Start {
            topic,
            max_analysts,
            checkpoint_dir,
            model,
        } => {
            config.analysts = model.apply(config.analysts);
            let store = Arc::new(FileCheckpointStore::new(checkpoint_dir));
            AnalystPlanner::from_config(&config, store)?
                .start(topic, *max_analysts)
                .await
                .context("Analyst generation failed")?
        }
        AnalystsCommand::Resume {
            session_id,
            feedback,
            checkpoint_dir,
            model,
        } => {
            config.analysts = model.apply(config.analysts);
            let store = Arc::new(FileCheckpointStore::new(checkpoint_dir));
            AnalystPlanner::from_config(&config, store)?
                .resume(session_id, feedback)
                .await
                .context("Resuming analyst session failed")?
        }
    };

    emit(cli, &outcome, || {
        let state = outcome.state();
        print_notices(&state.warnings);
        for analyst in &state.analysts {
            println!("{}", bold(&format!("### {}", analyst.name)));
            println!("{}", analyst.persona());
        }
        match &outcome {
            AnalystOutcome::Paused { session_id, .. } => {
                eprintln!(
                    "{} Paused. Continue with:\n  agentflow analysts resume {} --feedback \"...\"\n  (leave feedback empty to finish)",
                    cyan("◆"),
                    session_id
                );
            }
            AnalystOutcome::Finished { .. } => {
                eprintln!("{} Analyst generation finalized!", green("✔"));
            }
        }
    })
}

/// Print `value` as JSON with `--json`, otherwise run the human renderer.
fn emit<T: Serialize>(cli: &Cli, value: &T, human: impl FnOnce()) -> Result<()> {
    if cli.json {
        let json = serde_json::to_string_pretty(value).context("Failed to serialise output")?;
        println!("{json}");
    } else {
        human();
    }
    Ok(())
}

fn print_notices(notices: &[String]) {
    for notice in notices {
        eprintln!("{} {}", yellow("⚠"), notice);
    }
}
