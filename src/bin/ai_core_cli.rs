//! ai-core-cli: 编排器命令行工具
//!
//! Usage:
//!   ai-core-cli providers                              List registered providers
//!   ai-core-cli plugins                                List built-in plugin ids
//!   ai-core-cli run [OPTIONS] <provider> <model> <prompt...>
//!   ai-core-cli trace <spans.json>                     Print trace trees for a span dump

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use ai_core_rust::trace::build_trace_trees;
use ai_core_rust::{
    Assistant, CompletionsParams, Message, Model, Orchestrator, OrchestratorConfig,
    PluginRegistry, ProviderRegistry, SpanEntity, TraceRecorder,
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        std::process::exit(1);
    }

    match args[1].as_str() {
        "providers" => cmd_providers(),
        "plugins" => cmd_plugins(),
        "run" => cmd_run(&args[2..]),
        "trace" => cmd_trace(&args[2..]),
        "version" | "--version" | "-V" => cmd_version(),
        "help" | "--help" | "-h" => print_usage(),
        other => {
            eprintln!("Unknown command: {other}");
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    }
}

fn print_usage() {
    println!(
        r#"ai-core-cli: completion orchestrator tool

USAGE:
    ai-core-cli <COMMAND> [OPTIONS]

COMMANDS:
    providers                   List registered provider ids
    plugins                     List built-in plugin ids
    run <provider> <model> <prompt...>
                                Stream one completion to stdout
        --config <path>         Load orchestrator config from YAML
        --plugin <id>           Enable a built-in plugin (repeatable)
        --system <text>         Assistant system prompt
        --trace                 Print the call's trace tree as JSON
    trace <spans.json>          Build trace trees from a JSON span list
    version                     Show version information
    help                        Show this help message

ENVIRONMENT:
    AI_CORE_PLUGINS             Comma-separated plugin ids
    AI_CORE_CACHE_CAPACITY      Cache plugin capacity
    AI_CORE_CONTEXT_COUNT       Default context window
    AI_CORE_TRACE               Record spans (1/true)
    RUST_LOG                    Log filter (default: warn)"#
    );
}

fn cmd_version() {
    println!("ai-core-cli {}", env!("CARGO_PKG_VERSION"));
}

fn cmd_providers() {
    for id in ProviderRegistry::with_builtins().provider_ids() {
        println!("{id}");
    }
}

fn cmd_plugins() {
    for id in PluginRegistry::with_builtins().ids() {
        println!("{id}");
    }
}

struct RunArgs {
    config: Option<PathBuf>,
    plugins: Vec<String>,
    system: Option<String>,
    trace: bool,
    positional: Vec<String>,
}

fn parse_run_args(args: &[String]) -> RunArgs {
    let mut out = RunArgs {
        config: None,
        plugins: Vec::new(),
        system: None,
        trace: false,
        positional: Vec::new(),
    };
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => out.config = iter.next().map(PathBuf::from),
            "--plugin" => out.plugins.extend(iter.next().cloned()),
            "--system" => out.system = iter.next().cloned(),
            "--trace" => out.trace = true,
            _ => out.positional.push(arg.clone()),
        }
    }
    out
}

fn cmd_run(args: &[String]) {
    let args = parse_run_args(args);
    if args.positional.len() < 3 {
        eprintln!("Error: run needs <provider> <model> <prompt...>");
        std::process::exit(1);
    }
    let provider = &args.positional[0];
    let model = &args.positional[1];
    let prompt = args.positional[2..].join(" ");

    let config = match &args.config {
        Some(path) => OrchestratorConfig::from_path(path),
        None => OrchestratorConfig::from_env(),
    };
    let config = match config {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let recorder = Arc::new(TraceRecorder::new());
    let mut builder = Orchestrator::builder().config(config);
    for id in &args.plugins {
        builder = builder.builtin_plugin(id.clone());
    }
    if args.trace {
        builder = builder.trace_recorder(recorder.clone());
    }
    let orchestrator = match builder.build() {
        Ok(o) => o,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let mut assistant = Assistant::new("cli", Model::new(model.clone(), provider.clone()));
    if let Some(system) = args.system {
        assistant = assistant.with_prompt(system);
    }

    let cancel = CancellationToken::new();
    let params = CompletionsParams::new(vec![Message::user(prompt)], assistant, |chunk| {
        if let Some(text) = chunk.text {
            print!("{text}");
            let _ = std::io::stdout().flush();
        }
    })
    .cancel_token(cancel.clone());

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };
    let result = runtime.block_on(async {
        let ctrl_c = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                ctrl_c.cancel();
            }
        });
        orchestrator.completions(params).await
    });
    println!();

    match result {
        Ok(response) => {
            eprintln!(
                "[{} prompt + {} completion = {} tokens]",
                response.usage.prompt_tokens,
                response.usage.completion_tokens,
                response.usage.total_tokens
            );
        }
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }

    if args.trace {
        print_trees(&recorder.spans());
    }
}

fn cmd_trace(args: &[String]) {
    let Some(path) = args.first() else {
        eprintln!("Error: trace needs <spans.json>");
        std::process::exit(1);
    };
    let spans: Vec<SpanEntity> = match std::fs::read_to_string(path)
        .map_err(|e| e.to_string())
        .and_then(|s| serde_json::from_str(&s).map_err(|e| e.to_string()))
    {
        Ok(spans) => spans,
        Err(e) => {
            eprintln!("Error: {path}: {e}");
            std::process::exit(1);
        }
    };
    print_trees(&spans);
}

fn print_trees(spans: &[SpanEntity]) {
    match serde_json::to_string_pretty(&build_trace_trees(spans)) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("Error: {e}"),
    }
}
