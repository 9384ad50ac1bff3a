//! Compiler Benchmarks
//!
//! Three workloads are benchmarked:
//! 1. CSV - flat rows of fields reduced into nested arrays
//! 2. Arithmetic - recursive expressions folded into integers
//! 3. Text only - a grammar without callbacks, aggregated into one string
//!
//! Run with: cargo bench --bench compile

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ebnfkit::grammar::templates;
use ebnfkit::{CompiledValue, Compiler, Grammar, ScopeKind, Value};

// ============================================================================
// Grammars
// ============================================================================

fn csv_compiler() -> Compiler<Value> {
    let mut g: Grammar<Value> = Grammar::new();
    let comma = g.char(',');
    let newline = g.char('\n');

    let not_comma = g.exclude(comma);
    let not_newline = g.exclude(newline);
    let any = g.any();
    let field_char = g.seq([not_comma, not_newline, any]);
    g.node_mut(field_char).scope(ScopeKind::Parent);
    let field = g.repeat(field_char);
    g.node_mut(field).label("field").scope(ScopeKind::Force);

    let next_field = g.seq([comma, field]);
    g.node_mut(next_field).scope(ScopeKind::Parent);
    let more_fields = g.repeat(next_field);
    g.node_mut(more_fields).scope(ScopeKind::Parent);
    let row = g.seq([field, more_fields, newline]);
    g.node_mut(row)
        .label("row")
        .is_necessary(|child| child.is_scope())
        .reduce(|_, fields| Ok(Value::array(fields)));

    let rows = g.repeat(row);
    let end = g.end();
    let table = g.seq([rows, end]);
    g.node_mut(table).reduce(|_, rows| Ok(Value::array(rows)));
    Compiler::new(g, table)
}

/// `expr = term ('+' term)*`, `term = digits | '(' expr ')'`
fn arithmetic_compiler() -> Compiler<Value> {
    let mut g: Grammar<Value> = Grammar::new();
    let expr = g.empty_sequence();

    let digit = templates::digit(&mut g);
    let number = g.repeat_min(digit, 1);
    g.node_mut(number)
        .label("number")
        .reduce(|_, digits| Ok(Value::int(Value::concat(digits).text().parse()?)));

    let open = g.char('(');
    let close = g.char(')');
    let group = g.seq([open, expr, close]);
    g.node_mut(group)
        .is_necessary(|child| child.is_scope())
        .reduce(|_, mut inner| Ok(inner.pop().unwrap_or_default()));
    let term = g.choice([number, group]);
    g.node_mut(term).scope(ScopeKind::Parent);

    let plus = g.char('+');
    let next = g.seq([plus, term]);
    g.node_mut(next).scope(ScopeKind::Parent);
    let rest = g.repeat(next);
    g.node_mut(rest).scope(ScopeKind::Parent);
    g.append(expr, term).unwrap();
    g.append(expr, rest).unwrap();
    g.node_mut(expr)
        .label("expr")
        .is_necessary(|child| child.is_scope())
        .reduce(|_, terms| Ok(Value::int(terms.iter().filter_map(Value::as_int).sum())));

    Compiler::new(g, expr)
}

fn text_compiler() -> Compiler<String> {
    let mut g: Grammar<String> = Grammar::new();
    let ident = templates::identifier(&mut g);
    let blank = templates::whitespace(&mut g);
    let ws = g.repeat_min(blank, 1);
    let word = g.seq([ident, ws]);
    let words = g.repeat(word);
    let end = g.end();
    let root = g.seq([words, end]);
    Compiler::new(g, root)
}

// ============================================================================
// Test Data
// ============================================================================

fn csv_input(rows: usize) -> String {
    (0..rows)
        .map(|i| format!("{},name{},{}.5,yes\n", i, i, i * 3))
        .collect()
}

fn arithmetic_input(terms: usize) -> String {
    (0..terms)
        .map(|i| {
            if i % 4 == 0 {
                format!("({}+{})", i, i + 1)
            } else {
                i.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("+")
}

fn text_input(words: usize) -> String {
    (0..words).map(|i| format!("word_{} ", i)).collect()
}

// ============================================================================
// Benchmarks
// ============================================================================

fn bench_csv(c: &mut Criterion) {
    let compiler = csv_compiler();
    let mut group = c.benchmark_group("csv");
    for rows in [10, 100, 1000] {
        let input = csv_input(rows);
        group.throughput(Throughput::Bytes(input.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(rows), &input, |b, input| {
            b.iter(|| compiler.compile_str(black_box(input)))
        });
    }
    group.finish();
}

fn bench_arithmetic(c: &mut Criterion) {
    let compiler = arithmetic_compiler();
    let mut group = c.benchmark_group("arithmetic");
    for terms in [10, 100, 1000] {
        let input = arithmetic_input(terms);
        group.throughput(Throughput::Bytes(input.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(terms), &input, |b, input| {
            b.iter(|| compiler.compile_str(black_box(input)))
        });
    }
    group.finish();
}

fn bench_text(c: &mut Criterion) {
    let compiler = text_compiler();
    let mut group = c.benchmark_group("text");
    for words in [10, 100, 1000] {
        let input = text_input(words);
        group.throughput(Throughput::Bytes(input.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(words), &input, |b, input| {
            b.iter(|| compiler.compile_str(black_box(input)))
        });
    }
    group.finish();
}

fn bench_reader(c: &mut Criterion) {
    let compiler = csv_compiler();
    let input = csv_input(100);
    c.bench_function("csv_from_reader", |b| {
        b.iter(|| compiler.compile(std::io::Cursor::new(black_box(input.as_bytes()))))
    });
}

criterion_group!(
    benches,
    bench_csv,
    bench_arithmetic,
    bench_text,
    bench_reader
);
criterion_main!(benches);
