use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use flatdb::{DataType, Database, QueryExecutor, Row, Value};
use std::hint::black_box;

fn setup_populated_db(n: usize) -> Database {
    let mut db = Database::in_memory();
    let mut executor = QueryExecutor::new();

    executor
        .run(
            "CREATE TABLE users (id INT PRIMARY KEY, name TEXT, age INT, active BOOL)",
            &mut db,
        )
        .unwrap();

    let table = db.get_table_mut("users").unwrap();

    for i in 0..n {
        let row = Row::new(vec![
            Value::integer(i as i64),
            Value::new(DataType::String, format!("user{i}")),
            Value::integer((i % 100) as i64),
            Value::boolean(i % 2 == 0),
        ]);
        table.insert_row(row, None).unwrap();
    }
    db
}

fn bench_insert_sql(c: &mut Criterion) {
    let mut group = c.benchmark_group("Insert_SQL_Pipeline");
    group.bench_function("insert_single_row_sql", |b| {
        let mut db = Database::in_memory();
        let mut executor = QueryExecutor::new();
        executor.run("CREATE TABLE tests (id INT)", &mut db).unwrap();
        b.iter(|| {
            executor
                .run(black_box("INSERT INTO tests VALUES (42)"), &mut db)
                .unwrap();
        });
    });
    group.finish();
}

fn bench_select_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("Select_Where_Performance");

    for n in [1000, 10000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(n), n, |b, &n| {
            let mut db = setup_populated_db(n);
            let mut executor = QueryExecutor::new();
            b.iter(|| {
                let res = executor
                    .run("SELECT * FROM users WHERE age = 42", &mut db)
                    .unwrap();
                black_box(res);
            });
        });
    }
    group.finish();
}

fn bench_group_by(c: &mut Criterion) {
    let mut group = c.benchmark_group("Group_By_Performance");

    for n in [1000, 10000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(n), n, |b, &n| {
            let mut db = setup_populated_db(n);
            let mut executor = QueryExecutor::new();
            b.iter(|| {
                let res = executor
                    .run(
                        "SELECT active, COUNT(*), AVG(age) FROM users GROUP BY active",
                        &mut db,
                    )
                    .unwrap();
                black_box(res);
            });
        });
    }
    group.finish();
}

fn bench_update_performance(c: &mut Criterion) {
    let mut group = c.benchmark_group("Update_Performance");

    for n in [1000, 10000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(n), n, |b, &n| {
            b.iter_with_setup(
                || setup_populated_db(n),
                |mut db| {
                    QueryExecutor::new()
                        .run("UPDATE users SET age = 99 WHERE active = TRUE", &mut db)
                        .unwrap();
                    black_box(db);
                },
            );
        });
    }
    group.finish();
}

fn bench_delete_performance(c: &mut Criterion) {
    let mut group = c.benchmark_group("Delete_Performance");

    for n in [1000, 10000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(n), n, |b, &n| {
            b.iter_with_setup(
                || setup_populated_db(n),
                |mut db| {
                    QueryExecutor::new()
                        .run("DELETE FROM users WHERE age > 90", &mut db)
                        .unwrap();
                    black_box(db);
                },
            );
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_insert_sql,
    bench_select_scaling,
    bench_group_by,
    bench_update_performance,
    bench_delete_performance
);
criterion_main!(benches);
