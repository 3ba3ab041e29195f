//! Interactive console for the gatehouse marketing agent.
//!
//! Reads human messages from stdin, drives the workflow engine, and walks
//! the operator through tool approvals when a run suspends.

use clap::Parser;
use gatehouse_contract::{PendingApproval, ReviewDecision};
use gatehouse_engine::{EngineConfig, EngineError, GenAiProvider, RunResult, WorkflowEngine};
use gatehouse_store::MemoryStore;
use gatehouse_tools::{marketing_registry, CrmDb};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

const DEFAULT_SYSTEM_PROMPT: &str = "\
You are a customer relationship agent working with the marketing team. You \
analyze customer behavior and run targeted marketing campaigns.

You are connected to the company CRM database. Use the `query` tool to run \
read-only SQL over these tables: customers, transactions, items, rfm, \
marketing_campaigns, campaign_emails. Always study a customer's purchase \
history before emailing them.

Use `create_campaign` to create a campaign (types: loyalty, referral, \
re-engagement) and `send_campaign_email` to send personalized HTML emails \
as part of a campaign. Emails must address the customer by name, reference \
specific purchases, and carry a clear call to action.";

#[derive(Debug, Parser)]
#[command(name = "gatehouse", about = "Interactive marketing agent console")]
struct Args {
    /// Model identifier passed to the LLM client.
    #[arg(long, env = "GATEHOUSE_MODEL", default_value = "gpt-4o-mini")]
    model: String,

    /// Path to the CRM SQLite database.
    #[arg(long, env = "GATEHOUSE_DB", default_value = "./gatehouse.db")]
    db: PathBuf,

    /// Conversation thread id to drive.
    #[arg(long, default_value = "console")]
    thread: String,

    /// Skip human review for all tool calls.
    #[arg(long)]
    autopilot: bool,

    /// Override the protected tool set (repeatable).
    #[arg(long = "protect")]
    protected: Option<Vec<String>>,

    /// Read the system prompt from a file instead of the built-in one.
    #[arg(long, env = "GATEHOUSE_SYSTEM_PROMPT_FILE")]
    system_prompt_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let system_prompt = match args.system_prompt_file.as_ref() {
        Some(path) => match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                eprintln!("failed to read system prompt {}: {e}", path.display());
                std::process::exit(2);
            }
        },
        None => DEFAULT_SYSTEM_PROMPT.to_string(),
    };

    let db = match CrmDb::open(&args.db) {
        Ok(db) => Arc::new(db),
        Err(e) => {
            eprintln!("failed to open database {}: {e}", args.db.display());
            std::process::exit(2);
        }
    };

    let mut config = EngineConfig::new(system_prompt).with_autopilot(args.autopilot);
    if let Some(protected) = args.protected.clone() {
        config = config.with_protected_tools(protected);
    }

    let engine = WorkflowEngine::new(
        Arc::new(GenAiProvider::new(genai::Client::default(), &args.model)),
        marketing_registry(db),
        Arc::new(MemoryStore::new()),
        config,
    );

    println!("gatehouse console (model {}, thread '{}')", args.model, args.thread);
    println!("type 'exit' or 'quit' to leave");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let Some(line) = prompt_line(&mut lines, "\n> ").await else {
            break;
        };
        if line.is_empty() {
            continue;
        }
        if line == "exit" || line == "quit" {
            break;
        }

        match engine.run(&args.thread, &line).await {
            Ok(RunResult::Completed { response, .. }) => println!("{response}"),
            Ok(RunResult::Suspended { approval }) => {
                review_loop(&engine, &args.thread, approval, &mut lines).await;
            }
            Err(e) => eprintln!("error: {e}"),
        }
    }
}

/// Walk the operator through one or more suspended tool calls.
async fn review_loop(
    engine: &WorkflowEngine,
    thread: &str,
    mut approval: PendingApproval,
    lines: &mut Lines<BufReader<Stdin>>,
) {
    loop {
        println!("\n{approval}");
        let Some(action) = prompt_line(lines, "action [continue/update/feedback]: ").await else {
            return;
        };

        let decision = match action.as_str() {
            "continue" | "c" => ReviewDecision::Continue,
            "update" | "u" => {
                let Some(data) = prompt_line(lines, "new arguments (JSON): ").await else {
                    return;
                };
                match serde_json::from_str(&data) {
                    Ok(arguments) => ReviewDecision::Update { arguments },
                    Err(e) => {
                        eprintln!("error: invalid JSON: {e}");
                        continue;
                    }
                }
            }
            "feedback" | "f" => {
                let Some(text) = prompt_line(lines, "feedback: ").await else {
                    return;
                };
                ReviewDecision::Feedback { text }
            }
            other => {
                eprintln!("unknown action '{other}'");
                continue;
            }
        };

        match engine.resume(thread, decision).await {
            Ok(RunResult::Completed { response, .. }) => {
                println!("{response}");
                return;
            }
            Ok(RunResult::Suspended { approval: next }) => approval = next,
            Err(e @ EngineError::InvalidToolArguments(_)) => {
                // Thread is still suspended; let the operator try again.
                eprintln!("error: {e}");
            }
            Err(e) => {
                eprintln!("error: {e}");
                return;
            }
        }
    }
}

async fn prompt_line(lines: &mut Lines<BufReader<Stdin>>, prompt: &str) -> Option<String> {
    print!("{prompt}");
    std::io::stdout().flush().ok();
    match lines.next_line().await {
        Ok(Some(line)) => Some(line.trim().to_string()),
        _ => None,
    }
}
