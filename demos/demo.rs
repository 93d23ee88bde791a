use flatdb::*;

fn print_table(columns: &[Column], rows: &[Row]) {
    let header: Vec<String> = columns.iter().map(|c| format!("{:<12}", c.name)).collect();
    println!("{}", header.join(" "));
    println!("{}", "-".repeat(13 * columns.len()));
    for row in rows {
        let cells: Vec<String> = row.values.iter().map(|v| format!("{v:<12}")).collect();
        println!("{}", cells.join(" "));
    }
}

fn main() -> Result<()> {
    println!("Flat-File Database Demo\n");

    let storage = std::env::temp_dir().join("flatdb-demo");
    let mut db = Database::new(&storage);
    db.load_all_tables()?;

    let mut executor = QueryExecutor::new()
        .on_output(|msg| println!("{msg}\n"))
        .on_error(|msg| eprintln!("error: {msg}\n"))
        .on_result_table(print_table)
        .on_schema_changed(|| println!("(schema changed)"));

    let statements = [
        "DROP TABLE IF EXISTS employees, departments",
        "CREATE TABLE departments (id INT PRIMARY KEY, name VARCHAR(20))",
        "CREATE TABLE employees (id INT PRIMARY KEY, name VARCHAR(20), dept INT REFERENCES departments(id), salary INT)",
        "INSERT INTO departments VALUES (1, 'eng')",
        "INSERT INTO departments VALUES (2, 'ops')",
        "INSERT INTO employees VALUES (1, 'Alice', 1, 100)",
        "INSERT INTO employees VALUES (2, 'Bob', 1, 200)",
        "INSERT INTO employees VALUES (3, 'Charlie', 2, 50)",
        "INSERT INTO employees (id, name) VALUES (4, 'Dana')",
        // rejected: no department 9
        "INSERT INTO employees VALUES (5, 'Eve', 9, 10)",
        "SELECT e.name, d.name FROM employees e LEFT JOIN departments d ON e.dept = d.id",
        "SELECT d.name, SUM(salary), COUNT(*) FROM employees e JOIN departments d ON e.dept = d.id GROUP BY d.name",
        "UPDATE employees SET salary = 120 WHERE name = 'Alice'",
        "SELECT * FROM employees WHERE salary > 60 OR dept = 2 ORDER BY salary DESC",
    ];

    for sql in statements {
        println!("> {sql}");
        // failures are printed by the error callback
        let _ = executor.run(sql, &mut db);
    }

    println!("Tables stored in {}:", storage.display());
    for table_name in db.table_names() {
        println!("  - {table_name}");
    }
    println!("Memory used by rows: {} bytes", db.memory_footprint());

    Ok(())
}
