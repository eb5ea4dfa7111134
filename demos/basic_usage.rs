//! Basic usage example for the tntsql driver.

use std::error::Error;
use tntsql::types::{CellValue, NamedValue, Time};
use tntsql::{Connection, Driver};
use uuid::Uuid;

const HOST: &str = "localhost";
const PORT: u16 = 3301;
const USER: &str = "admin";
const PASSWORD: &str = "secret";
const TABLE: &str = "tntsql_example";

/// Establishes a connection to the Tarantool instance.
async fn example_connection(driver: &Driver) -> Result<Connection, Box<dyn Error>> {
    let conn_string = format!("tarantool://{}:{}@{}:{}", USER, PASSWORD, HOST, PORT);
    let connection = driver.connect(&conn_string).await?;
    Ok(connection)
}

/// Executes a simple arithmetic query and returns its value.
async fn example_simple_select(conn: &Connection) -> Result<i64, Box<dyn Error>> {
    let mut rows = conn.query("SELECT 1 + 1", &[]).await?;
    let mut row = vec![CellValue::Null];
    if !rows.next(&mut row)? {
        return Err("SELECT returned no rows".into());
    }
    Ok(row[0].get()?)
}

/// Create a table, insert inside a transaction, read back, drop.
async fn example_transaction(conn: &mut Connection) -> Result<usize, Box<dyn Error>> {
    conn.execute(
        format!(
            r#"CREATE TABLE "{TABLE}" ("id" UUID PRIMARY KEY, "name" STRING, "created" DATETIME)"#
        ),
        &[],
    )
    .await?;

    conn.begin_transaction().await?;
    for name in ["Alice", "Bob", "Charlie"] {
        conn.execute(
            format!(r#"INSERT INTO "{TABLE}" VALUES (:id, :name, :created)"#),
            &[
                NamedValue::named(1, "id", Uuid::new_v4()),
                NamedValue::named(2, "name", name),
                NamedValue::named(3, "created", Time::now()?),
            ],
        )
        .await?;
    }
    conn.commit().await?;

    let mut rows = conn
        .query(
            format!(r#"SELECT "id", "name", "created" FROM "{TABLE}" ORDER BY "name""#),
            &[],
        )
        .await?;
    let mut count = 0;
    while let Some(row) = rows.next_row()? {
        let created: Time = row[2].get()?;
        println!("  {} {} {}", row[0], row[1], created);
        count += 1;
    }

    conn.execute(format!(r#"DROP TABLE "{TABLE}""#), &[]).await?;
    Ok(count)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let driver = Driver::new();
    let mut conn = example_connection(&driver).await?;
    println!("Connected with {}", driver);

    let value = example_simple_select(&conn).await?;
    println!("Simple select: {}", value);

    let rows = example_transaction(&mut conn).await?;
    println!("Transaction: {} row(s)", rows);

    conn.close().await?;
    println!("Done");

    Ok(())
}
