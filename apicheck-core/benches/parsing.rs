//! Benchmarks for type signature parsing and snapshot loading.

use apicheck_core::{check, loader, resolve, signature, DiagnosticRegistry, SeverityTable};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn bench_parse_signatures(c: &mut Criterion) {
    let exprs = [
        "int",
        "java.lang.String[][]",
        "java.util.Map<java.lang.String, java.util.List<java.util.Map.Entry<K, V>>>",
        "T extends java.lang.Comparable<? super T>",
        "java.lang.Object...",
    ];

    c.bench_function("parse_type_signatures", |b| {
        b.iter(|| {
            for expr in exprs {
                black_box(signature::parse(black_box(expr)).ok());
            }
        })
    });
}

/// A synthetic snapshot with `classes` classes of ten methods each.
fn synthetic_snapshot(classes: usize) -> String {
    let mut doc = String::from("<api>\n<package name=\"bench\">\n");
    for i in 0..classes {
        let extends = match i {
            0 => "java.lang.Object".to_string(),
            _ => format!("bench.C{}", i - 1),
        };
        doc.push_str(&format!(
            "<class name=\"C{i}&lt;T&gt;\" extends=\"{extends}\" visibility=\"public\">\n"
        ));
        doc.push_str(&format!("<constructor name=\"C{i}\" visibility=\"public\"/>\n"));
        for m in 0..10 {
            doc.push_str(&format!(
                "<method name=\"m{m}\" return=\"java.util.List&lt;T&gt;\" visibility=\"public\">\
                 <parameter name=\"a\" type=\"java.util.Map&lt;java.lang.String, T&gt;\"/>\
                 <parameter name=\"b\" type=\"int[]\"/></method>\n"
            ));
        }
        doc.push_str("<field name=\"F\" type=\"int\" visibility=\"public\" static=\"true\" final=\"true\" value=\"1\"/>\n");
        doc.push_str("</class>\n");
    }
    doc.push_str("</package>\n</api>\n");
    doc
}

fn bench_load_and_check(c: &mut Criterion) {
    let doc = synthetic_snapshot(500);

    c.bench_function("load_500_classes", |b| {
        b.iter(|| black_box(loader::load_str(black_box(&doc)).ok()))
    });

    let mut old = loader::load_str(&doc).unwrap();
    let mut new = loader::load_str(&doc).unwrap();
    resolve(&mut old);
    resolve(&mut new);

    c.bench_function("check_500_classes", |b| {
        b.iter(|| {
            let mut registry = DiagnosticRegistry::new(SeverityTable::new());
            check(black_box(&old), black_box(&new), &mut registry);
            black_box(registry.had_error())
        })
    });
}

criterion_group!(benches, bench_parse_signatures, bench_load_and_check);
criterion_main!(benches);
