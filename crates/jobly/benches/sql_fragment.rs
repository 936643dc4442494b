use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use jobly::{CriterionMap, FieldMap, build_set_clause, build_where_clause};
use serde_json::{Map, Value, json};

/// An update payload with `n` fields: {"field0": 0, "field1": "v1", ...}
fn update_payload(n: usize) -> Value {
    let mut map = Map::new();
    for i in 0..n {
        let value = if i % 2 == 0 { json!(i) } else { json!(format!("v{i}")) };
        map.insert(format!("field{i}"), value);
    }
    Value::Object(map)
}

/// A field map renaming every other field of [`update_payload`].
fn field_map(n: usize) -> FieldMap {
    let mut map = Map::new();
    for i in (0..n).step_by(2) {
        map.insert(format!("field{i}"), json!(format!("col_{i}")));
    }
    FieldMap::from_json(&Value::Object(map)).unwrap()
}

/// `n` filters alternating substring, bound and presence fragments, with
/// criteria enabling all of them.
fn filters(n: usize) -> (CriterionMap, Value) {
    let mut defs = Map::new();
    let mut criteria = Map::new();
    for i in 0..n {
        let name = format!("f{i}");
        match i % 3 {
            0 => {
                defs.insert(name.clone(), json!(format!("col{i} ILIKE")));
                criteria.insert(name, json!("needle"));
            }
            1 => {
                defs.insert(name.clone(), json!(format!("col{i} >=")));
                criteria.insert(name, json!(i));
            }
            _ => {
                defs.insert(name.clone(), json!(format!("col{i} > 0")));
                criteria.insert(name, json!(true));
            }
        }
    }
    (
        CriterionMap::from_json(&Value::Object(defs)).unwrap(),
        Value::Object(criteria),
    )
}

fn bench_set_clause(c: &mut Criterion) {
    let mut group = c.benchmark_group("sql_fragment/set_clause");

    for n in [1, 5, 10, 50, 100] {
        let payload = update_payload(n);
        let fields = field_map(n);
        group.bench_with_input(
            BenchmarkId::from_parameter(n),
            &(payload, fields),
            |b, (payload, fields)| {
                b.iter(|| black_box(build_set_clause(payload, fields).unwrap()));
            },
        );
    }

    group.finish();
}

fn bench_where_clause(c: &mut Criterion) {
    let mut group = c.benchmark_group("sql_fragment/where_clause");

    for n in [1, 5, 10, 50, 100] {
        let (defs, criteria) = filters(n);
        group.bench_with_input(
            BenchmarkId::from_parameter(n),
            &(defs, criteria),
            |b, (defs, criteria)| {
                b.iter(|| black_box(build_where_clause(criteria, defs).unwrap()));
            },
        );
    }

    group.finish();
}

fn bench_where_clause_mostly_dropped(c: &mut Criterion) {
    let mut group = c.benchmark_group("sql_fragment/where_clause_mostly_dropped");

    // Every criterion but the first is unknown or `false`.
    for n in [10, 100] {
        let (defs, mut criteria) = filters(n);
        if let Value::Object(map) = &mut criteria {
            for value in map.values_mut().skip(1) {
                *value = json!(false);
            }
            map.insert("unknown".to_string(), json!("ignored"));
        }
        group.bench_with_input(
            BenchmarkId::from_parameter(n),
            &(defs, criteria),
            |b, (defs, criteria)| {
                b.iter(|| black_box(build_where_clause(criteria, defs).unwrap()));
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_set_clause,
    bench_where_clause,
    bench_where_clause_mostly_dropped
);
criterion_main!(benches);
