use std::env;
use std::process::ExitCode;

use anyhow::{anyhow, Context};
use tracing_subscriber::EnvFilter;

use lexvec_core::config::{expand_path, Config};
use lexvec_core::error::Error;
use lexvec_core::traits::DenseRetriever;
use lexvec_hybrid::{example_queries, format_text, HybridSearchEngine, SearchRequest};
use lexvec_vector::{default_embedder, InMemoryRetriever, LanceRetriever};

const DEFAULT_LOG_FILTER: &str = "info";

const USAGE: &str = "Usage: lexvec search \"<query>\" [--top-k N] [--alpha A] [--json] [--corpus FILE]\n       lexvec examples";

struct SearchArgs {
    request: SearchRequest,
    json: bool,
    corpus: Option<String>,
}

fn parse_search(mut args: Vec<String>) -> anyhow::Result<SearchArgs> {
    if args.is_empty() {
        return Err(anyhow!("missing query"));
    }
    let query = args.remove(0);
    let mut request = SearchRequest::new(query);
    let mut json = false;
    let mut corpus = None;
    let mut it = args.into_iter();
    while let Some(flag) = it.next() {
        match flag.as_str() {
            "--top-k" => {
                let v = it.next().ok_or_else(|| anyhow!("--top-k needs a value"))?;
                request.top_k = Some(v.parse().with_context(|| format!("invalid --top-k '{v}'"))?);
            }
            "--alpha" => {
                let v = it.next().ok_or_else(|| anyhow!("--alpha needs a value"))?;
                request.alpha = Some(v.parse().with_context(|| format!("invalid --alpha '{v}'"))?);
            }
            "--corpus" => corpus = Some(it.next().ok_or_else(|| anyhow!("--corpus needs a path"))?),
            "--json" => json = true,
            other => return Err(anyhow!("unknown option '{other}'")),
        }
    }
    Ok(SearchArgs { request, json, corpus })
}

fn open_retriever(config: &Config, corpus: Option<String>) -> anyhow::Result<Box<dyn DenseRetriever>> {
    let data = config.data()?;
    let embedder = default_embedder(&config.embedding()?);
    let corpus = corpus.map(expand_path).or_else(|| data.corpus_path());
    if let Some(path) = corpus {
        tracing::info!(path = %path.display(), "using in-memory corpus");
        return Ok(Box::new(InMemoryRetriever::from_jsonl(&path, embedder)?));
    }
    let uri = data.lancedb_path();
    tracing::info!(uri = %uri.display(), table = %data.table, "opening lancedb table");
    Ok(Box::new(LanceRetriever::open(&uri.to_string_lossy(), &data.table, embedder)?))
}

fn run_search(config: &Config, args: Vec<String>) -> ExitCode {
    let parsed = match parse_search(args) {
        Ok(parsed) => parsed,
        Err(e) => {
            eprintln!("{e:#}\n{USAGE}");
            return ExitCode::from(2);
        }
    };
    let engine = match open_retriever(config, parsed.corpus)
        .and_then(|r| HybridSearchEngine::from_config(r, config).map_err(anyhow::Error::from))
    {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("Error: {e:#}");
            return ExitCode::from(1);
        }
    };
    match engine.handle(&parsed.request) {
        Ok(resp) => {
            if parsed.json {
                match serde_json::to_string_pretty(&resp) {
                    Ok(s) => println!("{s}"),
                    Err(e) => {
                        eprintln!("Error: {e}");
                        return ExitCode::from(1);
                    }
                }
            } else {
                println!("{}", format_text(&resp));
            }
            ExitCode::SUCCESS
        }
        Err(e @ Error::InvalidInput(_)) => {
            eprintln!("{e}");
            ExitCode::from(2)
        }
        Err(e) => {
            eprintln!("{e}");
            ExitCode::from(1)
        }
    }
}

fn print_examples() {
    println!("Example queries\n===============");
    for ex in example_queries() {
        println!("\n{}\n  {}\n  expected: {}", ex.query, ex.description, ex.expected);
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let mut args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() {
        eprintln!("{USAGE}");
        return ExitCode::from(2);
    }
    let cmd = args.remove(0);
    match cmd.as_str() {
        "examples" => {
            print_examples();
            ExitCode::SUCCESS
        }
        "search" => match Config::load() {
            Ok(config) => run_search(&config, args),
            Err(e) => {
                eprintln!("Error loading config: {e:#}");
                ExitCode::from(1)
            }
        },
        _ => {
            eprintln!("Unknown command: {cmd}\n{USAGE}");
            ExitCode::from(2)
        }
    }
}
