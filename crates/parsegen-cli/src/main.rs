//! Thin CLI surface: `compile` assembles a grammar into an artifact and
//! prints its diagnostics report; `parse` runs that artifact against an
//! input file and prints the resulting tree or the errors recovery
//! collected. The grammar source format itself is an external
//! collaborator — both subcommands take an already-lowered grammar via
//! `--ast`, a JSON encoding of `parsegen::GrammarAst` (serialization is
//! not this crate's concern; see `parsegen_core::grammar::ast`).

use clap::{arg, Command};
use std::process::ExitCode;

fn cli() -> Command {
  Command::new("parsegen")
    .about("LALR(1)/SLR(1) parser generator and runtime")
    .subcommand_required(true)
    .subcommand(
      Command::new("compile")
        .about("compile a grammar and print its diagnostics report")
        .arg(arg!(-g --grammar <FILE> "path to a grammar AST").required(true))
        .arg(arg!(--slr1 "use the SLR(1) class instead of LALR(1)"))
        .arg(arg!(--compression <LEVEL> "0=none, 1=row-deduplicated, 2=row-displaced").default_value("1")),
    )
    .subcommand(
      Command::new("parse")
        .about("compile a grammar, then parse an input file against it")
        .arg(arg!(-g --grammar <FILE> "path to a grammar AST").required(true))
        .arg(arg!(-i --input <FILE> "path to the input to parse").required(true)),
    )
    .subcommand(Command::new("show").about("print a grammar's symbol table and production list").arg(arg!(-g --grammar <FILE> "path to a grammar AST").required(true)))
    .subcommand(Command::new("test").about("run a grammar against a directory of input fixtures").arg(arg!(-g --grammar <FILE> "path to a grammar AST").required(true)).arg(arg!(-d --dir <DIR> "fixture directory").required(true)))
}

fn main() -> ExitCode {
  let matches = cli().get_matches();

  let result = match matches.subcommand() {
    Some(("compile", sub)) => run_compile(sub),
    Some(("parse", sub)) => run_parse(sub),
    Some(("show", sub)) => run_show(sub),
    Some(("test", sub)) => run_test(sub),
    _ => unreachable!("subcommand_required enforces one of the above"),
  };

  match result {
    Ok(()) => ExitCode::SUCCESS,
    Err(message) => {
      eprintln!("error: {message}");
      ExitCode::FAILURE
    }
  }
}

fn load_ast(path: &str) -> Result<parsegen::GrammarAst, String> {
  // Grammar ASTs are handed to this crate already lowered; reading and
  // decoding that representation is left to whatever front end produced
  // it — a textual grammar DSL is an explicit non-goal here.
  Err(format!("no grammar AST decoder is wired up yet for '{path}' — construct a `parsegen::GrammarAst` and call `parsegen::compile` directly"))
}

fn run_compile(sub: &clap::ArgMatches) -> Result<(), String> {
  let grammar_path = sub.get_one::<String>("grammar").expect("required");
  let slr1 = sub.get_flag("slr1");
  let compression = sub.get_one::<String>("compression").expect("has a default").parse::<u8>().map_err(|e| e.to_string())?;

  let ast = load_ast(grammar_path)?;
  let mut config = if slr1 { parsegen::GeneratorConfig::slr1() } else { parsegen::GeneratorConfig::new() };
  config = config.compression(match compression {
    0 => parsegen::CompressionLevel::Uncompressed,
    1 => parsegen::CompressionLevel::RowDeduplicated,
    _ => parsegen::CompressionLevel::RowDisplaced,
  });
  config = config.report(true);

  let mut journal = parsegen::Journal::new(config);
  match parsegen::compile_to_artifact(&ast, &mut journal) {
    Ok(artifact) => {
      println!("compiled '{}': {} states, {} terminals, {} productions", artifact.name, artifact.num_states, artifact.num_terminals, artifact.productions.len());
      if let Some(report) = journal.render_report() {
        println!("{report}");
      }
      Ok(())
    }
    Err(errors) => {
      for error in &errors {
        eprintln!("{error}");
      }
      Err(format!("{} error(s)", errors.len()))
    }
  }
}

fn run_parse(sub: &clap::ArgMatches) -> Result<(), String> {
  let grammar_path = sub.get_one::<String>("grammar").expect("required");
  let input_path = sub.get_one::<String>("input").expect("required");

  let ast = load_ast(grammar_path)?;
  let artifact = parsegen::compile(&ast, parsegen::GeneratorConfig::new()).map_err(|errors| format!("{} grammar error(s)", errors.len()))?;
  let input = std::fs::read(input_path).map_err(|e| e.to_string())?;
  let (tree, errors) = parsegen::parse(&artifact, &input);

  match tree {
    Some(root) => println!("{root:#?}"),
    None => println!("(no tree produced)"),
  }
  if !errors.is_empty() {
    for error in &errors {
      eprintln!("syntax error at byte {}: {}", error.position.byte_offset, error.message);
    }
  }
  Ok(())
}

fn run_show(sub: &clap::ArgMatches) -> Result<(), String> {
  let grammar_path = sub.get_one::<String>("grammar").expect("required");
  let ast = load_ast(grammar_path)?;
  let artifact = parsegen::compile(&ast, parsegen::GeneratorConfig::new()).map_err(|errors| format!("{} grammar error(s)", errors.len()))?;

  for terminal in &artifact.terminals {
    println!("terminal {:>4}  {}{}", terminal.id.0, terminal.name, if terminal.skip { "  (skip)" } else { "" });
  }
  for nonterminal in &artifact.nonterminals {
    println!("nonterm  {:>4}  {}", nonterminal.id.0, nonterminal.name);
  }
  for production in &artifact.productions {
    println!("production {:>3}: lhs={} rhs_len={}", production.number, production.lhs.0, production.rhs_len);
  }
  Ok(())
}

fn run_test(sub: &clap::ArgMatches) -> Result<(), String> {
  let grammar_path = sub.get_one::<String>("grammar").expect("required");
  let dir = sub.get_one::<String>("dir").expect("required");

  let ast = load_ast(grammar_path)?;
  let artifact = parsegen::compile(&ast, parsegen::GeneratorConfig::new()).map_err(|errors| format!("{} grammar error(s)", errors.len()))?;

  let mut failures = 0usize;
  let mut total = 0usize;
  for entry in std::fs::read_dir(dir).map_err(|e| e.to_string())? {
    let entry = entry.map_err(|e| e.to_string())?;
    if !entry.path().is_file() {
      continue;
    }
    total += 1;
    let input = std::fs::read(entry.path()).map_err(|e| e.to_string())?;
    let (tree, errors) = parsegen::parse(&artifact, &input);
    if tree.is_none() || !errors.is_empty() {
      failures += 1;
      println!("FAIL {}: {} error(s)", entry.path().display(), errors.len());
    }
  }
  println!("{}/{} fixtures parsed cleanly", total - failures, total);
  Ok(())
}
