//! Integration tests for scope resolution
//!
//! Covers the scope tags, the ambient policy, child filtering, the
//! finalize pass with scope-local variables and the grammar templates.

use ebnfkit::grammar::templates;
use ebnfkit::{
    CompileError, Compiler, CompilerConfig, ConfigError, Grammar, NodeId, ParseErrorKind,
    ScopeKind, Value,
};
use std::io::Cursor;

/// `digits letters`, with a root that collects its children into an array
fn digits_then_letters(tag: Option<ScopeKind>) -> (Grammar<Value>, NodeId) {
    let mut g: Grammar<Value> = Grammar::new();
    let digit = templates::digit(&mut g);
    let digits = g.repeat_min(digit, 1);
    if let Some(tag) = tag {
        g.node_mut(digits).scope(tag);
    }
    let letter = templates::lowercase(&mut g);
    let letters = g.repeat_min(letter, 1);
    let root = g.seq([digits, letters]);
    g.node_mut(root).reduce(|_, values| Ok(Value::array(values)));
    (g, root)
}

fn strings(items: &[&str]) -> Value {
    Value::array(items.iter().map(|s| Value::string(*s)).collect())
}

// ============================================================================
// Scope tags
// ============================================================================

#[test]
fn test_default_scope_aggregates_text() {
    let (g, root) = digits_then_letters(None);
    let value = Compiler::new(g, root).compile_str("12ab").unwrap();
    assert_eq!(value, strings(&["12", "ab"]));
}

#[test]
fn test_parent_scope_passes_children_through() {
    let (g, root) = digits_then_letters(Some(ScopeKind::Parent));
    let value = Compiler::new(g, root).compile_str("12ab").unwrap();
    assert_eq!(value, strings(&["1", "2", "ab"]));
}

#[test]
fn test_force_scope_without_callbacks_concatenates() {
    let (g, root) = digits_then_letters(Some(ScopeKind::Force));
    let value = Compiler::new(g, root).compile_str("12ab").unwrap();
    assert_eq!(value, strings(&["12", "ab"]));
}

#[test]
fn test_empty_scope_erases_content() {
    let (g, root) = digits_then_letters(Some(ScopeKind::Empty));
    let value = Compiler::new(g, root).compile_str("12ab").unwrap();
    assert_eq!(value, Value::array(vec![Value::Nil, Value::string("ab")]));
}

#[test]
fn test_empty_scope_in_text_aggregation() {
    let mut g: Grammar<String> = Grammar::new();
    let ws = g.repeat(' ');
    g.node_mut(ws).scope(ScopeKind::Empty);
    let word = g.text("x");
    let root = g.seq([ws, word, ws]);
    assert_eq!(Compiler::new(g, root).compile_str("   x ").unwrap(), "x");
}

#[test]
fn test_parent_root_is_rejected() {
    let mut g: Grammar<String> = Grammar::new();
    let root = g.text("ab");
    g.node_mut(root).scope(ScopeKind::Parent);
    let err = Compiler::new(g, root).compile_str("ab").unwrap_err();
    assert!(matches!(
        err,
        CompileError::Config(ConfigError::ParentRoot { .. })
    ));
}

// ============================================================================
// Ambient policy
// ============================================================================

#[test]
fn test_ambient_parent_flattens_untagged_nodes() {
    let (g, root) = digits_then_letters(None);
    let config = CompilerConfig::new().with_default_scope(ScopeKind::Parent);
    let value = Compiler::new(g, root)
        .with_config(config)
        .compile_str("12ab")
        .unwrap();
    assert_eq!(value, strings(&["1", "2", "a", "b"]));
}

#[test]
fn test_inherited_tag_ignores_ambient_policy() {
    let (g, root) = digits_then_letters(Some(ScopeKind::Inherited));
    let config = CompilerConfig::new().with_default_scope(ScopeKind::Parent);
    let value = Compiler::new(g, root)
        .with_config(config)
        .compile_str("12ab")
        .unwrap();
    assert_eq!(value, strings(&["12", "a", "b"]));
}

#[test]
fn test_ambient_empty_erases_untagged_nodes() {
    let (g, root) = digits_then_letters(None);
    let config = CompilerConfig::new().with_default_scope(ScopeKind::Empty);
    let value = Compiler::new(g, root)
        .with_config(config)
        .compile_str("12ab")
        .unwrap();
    // the root carries a reduce callback, so it still forms a scope
    assert_eq!(value, Value::array(vec![Value::Nil, Value::Nil]));
}

#[test]
fn test_config_loaded_from_json() {
    let config = CompilerConfig::from_json(r#"{"default_scope":"parent"}"#).unwrap();
    assert_eq!(config.default_scope, ScopeKind::Parent);
    assert_eq!(config.max_recursion_depth, 1000);

    let (g, root) = digits_then_letters(None);
    let value = Compiler::new(g, root)
        .with_config(config)
        .compile_str("1a")
        .unwrap();
    assert_eq!(value, strings(&["1", "a"]));
}

// ============================================================================
// Filtering
// ============================================================================

#[test]
fn test_is_necessary_drops_punctuation() {
    let mut g: Grammar<Value> = Grammar::new();
    let digit = templates::digit(&mut g);
    let open = g.char('(');
    let comma = g.char(',');
    let close = g.char(')');
    let pair = g.seq([open, digit, comma, digit, close]);
    g.node_mut(pair)
        .is_necessary(|child| child.text().chars().all(|c| c.is_ascii_digit()))
        .reduce(|_, values| Ok(Value::array(values)));
    let value = Compiler::new(g, pair).compile_str("(3,4)").unwrap();
    assert_eq!(value, strings(&["3", "4"]));
}

#[test]
fn test_is_necessary_sees_labels() {
    let mut g: Grammar<Value> = Grammar::new();
    let key = templates::identifier(&mut g);
    g.node_mut(key).label("key");
    let digit = templates::digit(&mut g);
    let value = g.repeat_min(digit, 1);
    g.node_mut(value).label("value");
    let equals = g.char('=');
    let entry = g.seq([key, equals, value]);
    g.node_mut(entry)
        .is_necessary(|child| child.label() == Some("value"))
        .reduce(|_, values| Ok(Value::array(values)));
    let result = Compiler::new(g, entry).compile_str("width=80").unwrap();
    assert_eq!(result, strings(&["80"]));
}

// ============================================================================
// Finalize and variables
// ============================================================================

/// `block = '{' (decl | block)* '}'` where every `decl` counts itself in the
/// locals of its block
fn block_grammar() -> (Grammar<Value>, NodeId) {
    let mut g: Grammar<Value> = Grammar::new();
    let block = g.empty_sequence();

    let decl = g.char('a');
    g.node_mut(decl)
        .label("decl")
        .finalize(|ctx, _| {
            let count = ctx.locals_mut().get_or_insert_with("count", || Value::int(0));
            *count = Value::int(count.as_int().unwrap_or(0) + 1);
            let total = ctx.globals_mut().get_or_insert_with("total", || Value::int(0));
            *total = Value::int(total.as_int().unwrap_or(0) + 1);
            Ok(())
        })
        .reduce(|ctx, _| Ok(ctx.lookup("count").cloned().unwrap_or_default()));

    let item = g.choice([decl, block]);
    g.node_mut(item).scope(ScopeKind::Parent);
    let items = g.repeat(item);
    g.node_mut(items).scope(ScopeKind::Parent);

    g.append(block, '{').unwrap();
    g.append(block, items).unwrap();
    g.append(block, '}').unwrap();
    g.node_mut(block)
        .label("block")
        .is_necessary(|child| child.is_scope())
        .reduce(|_, values| Ok(Value::array(values)));
    (g, block)
}

#[test]
fn test_finalize_counts_into_enclosing_scope() {
    let (g, root) = block_grammar();
    let value = Compiler::new(g, root).compile_str("{aa{a}}").unwrap();
    assert_eq!(
        value,
        Value::array(vec![
            Value::int(2),
            Value::int(2),
            Value::array(vec![Value::int(1)]),
        ])
    );
}

#[test]
fn test_finalize_updates_globals() {
    let (g, root) = block_grammar();
    let run = Compiler::new(g, root)
        .compile_run(Cursor::new("{a{a{a}}a}"))
        .unwrap();
    assert_eq!(run.globals.get("total"), Some(&Value::int(4)));
}

#[test]
fn test_find_scope_and_ancestors() {
    let mut g: Grammar<Value> = Grammar::new();
    let block = g.empty_sequence();
    let decl = g.char('a');
    g.node_mut(decl).reduce(|ctx, _| {
        let depth = std::iter::once(ctx.scope())
            .chain(ctx.ancestors())
            .filter(|&s| ctx.syntax(s).label() == Some("block"))
            .count();
        assert_eq!(ctx.find_scope("block"), Some(ctx.scope()));
        assert_eq!(ctx.find_scope("missing"), None);
        Ok(Value::int(depth as i64))
    });
    let item = g.choice([decl, block]);
    g.node_mut(item).scope(ScopeKind::Parent);
    let items = g.repeat(item);
    g.node_mut(items).scope(ScopeKind::Parent);
    g.append(block, '{').unwrap();
    g.append(block, items).unwrap();
    g.append(block, '}').unwrap();
    g.node_mut(block)
        .label("block")
        .is_necessary(|child| child.is_scope())
        .reduce(|_, values| Ok(Value::array(values)));

    let value = Compiler::new(g, block).compile_str("{a{a}}").unwrap();
    assert_eq!(
        value,
        Value::array(vec![Value::int(1), Value::array(vec![Value::int(2)])])
    );
}

#[test]
fn test_init_seeds_globals_before_finalize() {
    let mut g: Grammar<Value> = Grammar::new();
    let letter = templates::lowercase(&mut g);
    let word = g.repeat_min(letter, 1);
    g.node_mut(word)
        .label("word")
        .init(|globals| {
            globals.set("seen", Value::array(Vec::new()));
            Ok(())
        })
        .finalize(|ctx, children| {
            let text: String = children.iter().map(|&c| ctx.text(c)).collect();
            if let Some(Value::Array(seen)) = ctx.globals_mut().get_mut("seen") {
                seen.push(Value::string(text));
            }
            Ok(())
        });
    let space = g.char(' ');
    let more = g.seq([space, word]);
    g.node_mut(more).scope(ScopeKind::Parent);
    let tail = g.repeat(more);
    let root = g.seq([word, tail]);

    let run = Compiler::new(g, root)
        .compile_run(Cursor::new("one two three"))
        .unwrap();
    assert_eq!(run.globals.get("seen"), Some(&strings(&["one", "two", "three"])));
}

#[test]
fn test_finalize_error_is_callback_error() {
    let mut g: Grammar<Value> = Grammar::new();
    let newline = g.char('\n');
    let bad = g.char('!');
    g.node_mut(bad)
        .label("bang")
        .finalize(|_, _| Err("bang is reserved".into()));
    let x = g.char('x');
    let line = g.choice([newline, bad, x]);
    let root = g.repeat(line);

    let err = Compiler::new(g, root).compile_str("x\nx!").unwrap_err();
    let parse = err.as_parse().unwrap();
    assert_eq!(parse.kind, ParseErrorKind::Callback);
    assert_eq!(parse.label.as_deref(), Some("bang"));
    let position = parse.position.unwrap();
    assert_eq!((position.line, position.column), (2, 2));
    assert!(parse.message.contains("bang is reserved"));
}

// ============================================================================
// Templates
// ============================================================================

#[test]
fn test_identifier_is_one_unit() {
    let mut g: Grammar<Value> = Grammar::new();
    let ident = templates::identifier(&mut g);
    // a scope of its own keeps the fragment from merging into its users
    g.node_mut(ident).scope(ScopeKind::Force);
    let space = g.char(' ');
    let more = g.seq([space, ident]);
    g.node_mut(more).scope(ScopeKind::Parent);
    let tail = g.repeat(more);
    g.node_mut(tail).scope(ScopeKind::Parent);
    let root = g.seq([ident, tail]);
    g.node_mut(root)
        .is_necessary(|child| child.text() != " ")
        .reduce(|_, values| Ok(Value::array(values)));

    let value = Compiler::new(g, root).compile_str("foo _bar9 Baz").unwrap();
    assert_eq!(value, strings(&["foo", "_bar9", "Baz"]));
}

#[test]
fn test_separator_rejects_longer_word() {
    let mut g: Grammar<String> = Grammar::new();
    let keyword = g.text("if");
    let boundary = templates::separator(&mut g);
    let root = g.seq([keyword, boundary]);
    let compiler = Compiler::new(g, root);
    assert_eq!(compiler.compile_str("if x").unwrap(), "if");
    assert!(compiler.compile_str("iffy").is_err());
}

#[test]
fn test_alphanumeric_and_whitespace() {
    let mut g: Grammar<String> = Grammar::new();
    let alnum = templates::alphanumeric(&mut g);
    let word = g.repeat_min(alnum, 1);
    let blank = templates::whitespace(&mut g);
    let ws = g.repeat(blank);
    g.node_mut(ws).scope(ScopeKind::Empty);
    let entry = g.seq([word, ws]);
    let words = g.repeat(entry);
    let compiler = Compiler::new(g, words);
    assert_eq!(compiler.compile_str("ab1 \tC2\n").unwrap(), "ab1C2");
}
