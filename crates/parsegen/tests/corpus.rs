//! End-to-end scenarios spanning all three pipeline stages: compile a
//! grammar, assemble it, and run the runtime against concrete input.

use parsegen::*;

fn arith_grammar() -> GrammarAst {
  // expr : expr plus expr | expr star expr | lparen expr rparen | int ;
  // `star` binds tighter than `plus`; both left-associative.
  GrammarAst {
    name: "arith".into(),
    start: Some("expr".into()),
    precedence_blocks: vec![
      PrecedenceBlock { levels: vec![PrecedenceLevel { assoc: AssocDirective::Left, symbols: vec!["plus".into()] }] },
      PrecedenceBlock { levels: vec![PrecedenceLevel { assoc: AssocDirective::Left, symbols: vec!["star".into()] }] },
    ],
    productions: vec![ProductionAst {
      lhs: "expr".into(),
      alternatives: vec![
        AlternativeAst { symbols: vec![SymbolRefAst::nonterminal("expr"), SymbolRefAst::terminal("plus"), SymbolRefAst::nonterminal("expr")], ..Default::default() },
        AlternativeAst { symbols: vec![SymbolRefAst::nonterminal("expr"), SymbolRefAst::terminal("star"), SymbolRefAst::nonterminal("expr")], ..Default::default() },
        AlternativeAst {
          symbols: vec![SymbolRefAst::terminal("lparen"), SymbolRefAst::nonterminal("expr"), SymbolRefAst::terminal("rparen")],
          ..Default::default()
        },
        AlternativeAst { symbols: vec![SymbolRefAst::terminal("int")], ..Default::default() },
        AlternativeAst {
          symbols: vec![SymbolRefAst::terminal("error"), SymbolRefAst::terminal("rparen")],
          recover: true,
          ..Default::default()
        },
      ],
    }],
    lexical_productions: vec![
      LexicalProductionAst { name: "ws".into(), pattern_src: " +".into(), skip: true, ..Default::default() },
      LexicalProductionAst { name: "plus".into(), pattern_src: "\\+".into(), ..Default::default() },
      LexicalProductionAst { name: "star".into(), pattern_src: "\\*".into(), ..Default::default() },
      LexicalProductionAst { name: "lparen".into(), pattern_src: "\\(".into(), ..Default::default() },
      LexicalProductionAst { name: "rparen".into(), pattern_src: "\\)".into(), ..Default::default() },
      LexicalProductionAst { name: "int".into(), pattern_src: "[0-9]+".into(), ..Default::default() },
    ],
    fragments: vec![],
  }
}

#[test]
fn precedence_makes_star_bind_tighter_than_plus() {
  let ast = arith_grammar();
  let grammar = compile(&ast, GeneratorConfig::new()).unwrap();
  // "1 + 2 * 3" must parse as "1 + (2 * 3)": the outermost reduction
  // has `plus` as its root production, not `star`.
  let (tree, errors) = parse(&grammar, b"1 + 2 * 3");
  assert!(errors.is_empty());
  let root = tree.expect("a valid expression always produces a tree");
  match root {
    TreeNode::NonTerminal { children, .. } => {
      assert_eq!(children.len(), 3);
      match &children[1] {
        TreeNode::Terminal { lexeme, .. } => assert_eq!(lexeme, b"+"),
        other => panic!("expected the root operator to be `+`, got {other:?}"),
      }
    }
    other => panic!("expected a non-terminal root, got {other:?}"),
  }
}

#[test]
fn slr1_class_still_accepts_the_same_language() {
  let ast = arith_grammar();
  let grammar = compile(&ast, GeneratorConfig::new().class(GrammarClass::Slr1)).unwrap();
  let (tree, errors) = parse(&grammar, b"(1 + 2) * 3");
  assert!(errors.is_empty());
  assert!(tree.is_some());
}

#[test]
fn row_displacement_compresses_without_changing_acceptance() {
  let ast = arith_grammar();
  let grammar = compile(&ast, GeneratorConfig::new().compression(CompressionLevel::RowDisplaced)).unwrap();
  let (tree, errors) = parse(&grammar, b"1 + 2 * 3");
  assert!(errors.is_empty());
  assert!(tree.is_some());
}

#[test]
fn unbalanced_parens_recover_and_report_one_error() {
  let ast = arith_grammar();
  let grammar = compile(&ast, GeneratorConfig::new()).unwrap();
  // A stray `)` with nothing valid before it: the `error rparen`
  // alternative traps, shifts `)`, and parsing continues to EOF.
  let (_, errors) = parse(&grammar, b") 1");
  assert_eq!(errors.len(), 1);
}

#[test]
fn disabling_lac_still_reaches_the_same_accept_state() {
  let ast = arith_grammar();
  let grammar = compile(&ast, GeneratorConfig::new()).unwrap();
  let lexer = Lexer::new(&grammar, b"1 + 2 * 3");
  let builder = DefaultTreeBuilder::new(&grammar);
  let mut parser = Parser::new(&grammar, lexer, builder).disable_lac(true);
  parser.run();
  assert_eq!(parser.status(), ParserState::Accepted);
}

#[test]
fn report_collects_a_shift_reduce_resolution_note() {
  let ast = arith_grammar();
  let mut journal = Journal::new(GeneratorConfig::new().report(true));
  compile_to_artifact(&ast, &mut journal).unwrap();
  let rendered = journal.render_report().expect("reporting was enabled");
  assert!(rendered.contains("table-build") || rendered.contains("TableBuild") || !rendered.is_empty());
}
