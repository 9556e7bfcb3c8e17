//! The TypeC type checker CLI.
//!
//! Reads a serialized syntax tree (the JSON form of [`typec_ast::Ast`], as
//! produced by a front end) and runs the inference core over it:
//!
//! - `typecc types <ast.json>` - Print the type of every top-level declaration
//! - `typecc instances <ast.json>` - Print the generic instantiations in use
//! - `typecc check <ast.json>` - Report type errors, exit 1 if there are any
//!
//! Options:
//! - `--config` - Path to a `typec.toml` with a `[typeck]` table
//! - `--json` - Output as JSON (one object per line)
//! - `--no-color` - Disable colorized diagnostics
//! - `-v` - Increase log verbosity (repeatable)

mod logger;

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};

use typec_ast::{Ast, NodeKind};
use typec_common::{DocumentId, TypeckConfig};
use typec_typeck::diagnostics::DiagnosticOptions;
use typec_typeck::{InstantiationKind, TypeChecker};

#[derive(Parser)]
#[command(name = "typecc", version, about = "The TypeC type checker")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to a typec.toml configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output as JSON (one object per line) instead of human-readable format
    #[arg(long, global = true)]
    json: bool,

    /// Disable colorized output
    #[arg(long = "no-color", global = true)]
    no_color: bool,

    /// Log more (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the inferred type of every top-level declaration
    Types {
        /// Serialized syntax tree
        ast: PathBuf,
    },
    /// Print every concrete generic instantiation with its mangled name
    Instances {
        /// Serialized syntax tree
        ast: PathBuf,
    },
    /// Report type errors
    Check {
        /// Serialized syntax tree
        ast: PathBuf,

        /// Directory the document URIs are relative to, for source snippets
        #[arg(long = "source-dir")]
        source_dir: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();
    let json = cli.json;

    if let Err(e) = run(cli) {
        if json {
            let msg = serde_json::json!({
                "code": "C0001",
                "severity": "error",
                "message": e,
                "file": "",
                "spans": [],
            });
            eprintln!("{}", msg);
        } else {
            eprintln!("error: {}", e);
        }
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), String> {
    logger::init(logger::level_for(cli.verbose))?;

    let config = match &cli.config {
        Some(path) => TypeckConfig::from_file(path)?,
        None => TypeckConfig::default(),
    };
    log::debug!("configuration: {:?}", config);

    let diag_opts = DiagnosticOptions {
        color: !cli.no_color && !cli.json,
        json: cli.json,
    };

    match cli.command {
        Commands::Types { ast } => {
            let (ast, docs) = load_ast(&ast)?;
            let mut tc = TypeChecker::new(config);
            print_types(&mut tc, &ast, &docs, cli.json);
            Ok(())
        }
        Commands::Instances { ast } => {
            let (ast, docs) = load_ast(&ast)?;
            let mut tc = TypeChecker::new(config);
            infer_all(&mut tc, &ast, &docs);
            print_instances(&tc, cli.json);
            Ok(())
        }
        Commands::Check { ast, source_dir } => {
            let (ast, docs) = load_ast(&ast)?;
            let mut tc = TypeChecker::new(config);
            let errors = report_errors(&mut tc, &ast, &docs, source_dir.as_deref(), &diag_opts);
            if errors > 0 {
                return Err(format!("{} type error(s) found", errors));
            }
            Ok(())
        }
    }
}

/// Deserialize a tree, then link and resolve each of its documents.
fn load_ast(path: &Path) -> Result<(Ast, Vec<DocumentId>), String> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read '{}': {}", path.display(), e))?;
    let mut ast: Ast = serde_json::from_str(&text)
        .map_err(|e| format!("Failed to parse '{}': {}", path.display(), e))?;
    let docs: Vec<DocumentId> = ast.documents().iter().map(|d| d.id).collect();
    for &doc in &docs {
        ast.link(doc);
        typec_ast::scope::resolve_names(&mut ast, doc);
    }
    log::info!(
        "loaded {} document(s), {} node(s) from {}",
        docs.len(),
        ast.len(),
        path.display()
    );
    Ok((ast, docs))
}

fn uri(ast: &Ast, doc: DocumentId) -> String {
    ast.document(doc).map(|d| d.uri.clone()).unwrap_or_default()
}

fn print_types(tc: &mut TypeChecker, ast: &Ast, docs: &[DocumentId], json: bool) {
    for &doc in docs {
        let file = uri(ast, doc);
        let Some(root) = ast.root(doc) else {
            log::warn!("{} has no root node", file);
            continue;
        };
        let NodeKind::Module { items } = ast.kind(root) else {
            continue;
        };
        for &item in items {
            let Some(name) = ast.kind(item).decl_name() else {
                continue;
            };
            let ty = tc.get_type(ast, item);
            if json {
                let line = serde_json::json!({
                    "file": file,
                    "name": name,
                    "type": ty.to_string(),
                });
                println!("{}", line);
            } else {
                println!("{}: {}: {}", file, name, ty);
            }
        }
    }
}

/// Instantiations are recorded as a side effect of inference, so every node
/// is visited once before the registry is read.
fn infer_all(tc: &mut TypeChecker, ast: &Ast, docs: &[DocumentId]) {
    for &doc in docs {
        for node in ast.descendants(doc) {
            tc.get_type(ast, node);
        }
    }
    log::debug!("{} node computation(s)", tc.computations());
}

fn kind_label(kind: InstantiationKind) -> &'static str {
    match kind {
        InstantiationKind::Class => "class",
        InstantiationKind::Method => "method",
        InstantiationKind::Function => "function",
    }
}

fn print_instances(tc: &TypeChecker, json: bool) {
    let registry = tc.registry();
    for (kind, key) in registry.keys() {
        let mangled = registry.mangled_name(key);
        if json {
            let line = serde_json::json!({
                "kind": kind_label(kind),
                "key": key,
                "mangled": mangled,
            });
            println!("{}", line);
        } else {
            println!("{:<8} {} ({})", kind_label(kind), key, mangled);
        }
    }
}

/// Print every document's errors to stderr and return how many there were.
fn report_errors(
    tc: &mut TypeChecker,
    ast: &Ast,
    docs: &[DocumentId],
    source_dir: Option<&Path>,
    diag_opts: &DiagnosticOptions,
) -> usize {
    let mut total = 0;
    for &doc in docs {
        let file = uri(ast, doc);
        let source = source_dir.and_then(|dir| std::fs::read_to_string(dir.join(&file)).ok());
        let rendered = match &source {
            Some(source) => tc.render_errors(ast, doc, source, diag_opts),
            None if diag_opts.json => tc.render_errors(ast, doc, "", diag_opts),
            None => {
                log::debug!("no source for {}, reporting without snippets", file);
                tc.collect_errors(ast, doc)
                    .iter()
                    .map(|e| format!("{}: error[{}]: {}", file, e.code(), e))
                    .collect()
            }
        };
        total += rendered.len();
        for line in rendered {
            eprintln!("{}", line);
        }
    }
    total
}
