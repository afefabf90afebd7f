//! Row access, passthrough execution and client setup

mod common;

use pretty_assertions::assert_eq;
use std::io::Write;

use common::{id_column, memory_client};
use schema_evolve::{CanonicalType, ColumnDescriptor, Error, RowValue, SortOrder, SqlValue};

async fn people_client() -> schema_evolve::SchemaClient {
    let client = memory_client().await;
    client
        .create_table(
            "people",
            &[
                id_column(),
                ColumnDescriptor::new("Name", CanonicalType::Text),
                ColumnDescriptor::new("Age", CanonicalType::Integer),
                ColumnDescriptor::new("Photo", CanonicalType::Blob),
            ],
        )
        .await
        .unwrap();
    client
}

#[tokio::test]
async fn test_add_and_read_rows() {
    let client = people_client().await;
    let rows = client.rows();

    rows.add_row("people", &[RowValue::new("Name", "Ada"), RowValue::new("Age", 36_i64)])
        .await
        .unwrap();
    rows.add_row(
        "people",
        &[
            RowValue::new("Name", "Grace"),
            RowValue::new("Age", 85_i64),
            RowValue::new("Photo", vec![0xFF_u8, 0x00]),
        ],
    )
    .await
    .unwrap();

    assert_eq!(rows.row_count("people").await.unwrap(), 2);

    let second = rows.get_row("people", 1).await.unwrap().unwrap();
    assert_eq!(second.get("Id"), Some(&SqlValue::Integer(2)));
    assert_eq!(second.get("Photo"), Some(&SqlValue::Blob(vec![0xFF, 0x00])));

    let first = rows.get_row("people", 0).await.unwrap().unwrap();
    assert_eq!(first.get("Photo"), Some(&SqlValue::Null));

    assert!(rows.get_row("people", 2).await.unwrap().is_none());
}

#[tokio::test]
async fn test_default_values_row() {
    let client = people_client().await;

    client.rows().add_row("people", &[]).await.unwrap();

    let row = client.rows().get_row("people", 0).await.unwrap().unwrap();
    assert_eq!(row.get("Id"), Some(&SqlValue::Integer(1)));
    assert_eq!(row.get("Name"), Some(&SqlValue::Null));
}

#[tokio::test]
async fn test_values_are_bound_not_interpolated() {
    let client = people_client().await;
    let hostile = "Robert'); DROP TABLE people; --";

    client
        .rows()
        .add_row("people", &[RowValue::new("Name", hostile)])
        .await
        .unwrap();

    let row = client.rows().get_row("people", 0).await.unwrap().unwrap();
    assert_eq!(row.get("Name"), Some(&SqlValue::Text(hostile.to_string())));
    assert!(client.reader().table_exists("people").await.unwrap());
}

#[tokio::test]
async fn test_update_values() {
    let client = people_client().await;
    let rows = client.rows();
    for (name, age) in [("Ada", 36_i64), ("Alan", 41), ("Edsger", 36)] {
        rows.add_row("people", &[RowValue::new("Name", name), RowValue::new("Age", age)])
            .await
            .unwrap();
    }

    let changed = rows
        .update_value("people", "Age", SqlValue::Integer(36), SqlValue::Integer(37))
        .await
        .unwrap();
    assert_eq!(changed, 2);

    let by_age = rows
        .get_table_ordered("people", SortOrder::Descending, &["Age", "Name"])
        .await
        .unwrap();
    // The direction applies to the last ordering column only
    let names: Vec<_> = by_age.iter().map(|r| r.get("Name").cloned().unwrap()).collect();
    assert_eq!(
        names,
        vec![SqlValue::from("Edsger"), SqlValue::from("Ada"), SqlValue::from("Alan")]
    );

    assert_eq!(rows.update_all("people", "Age", SqlValue::Null).await.unwrap(), 3);
    let all = rows.get_table("people").await.unwrap();
    assert!(all.iter().all(|r| r.get("Age") == Some(&SqlValue::Null)));
}

#[tokio::test]
async fn test_reads_follow_column_changes() {
    let client = people_client().await;
    let rows = client.rows();
    rows.add_row("people", &[RowValue::new("Name", "Ada"), RowValue::new("Age", 36_i64)])
        .await
        .unwrap();

    let before = rows.get_row("people", 0).await.unwrap().unwrap();
    assert_eq!(before.columns(), vec!["Id", "Name", "Age", "Photo"]);
    assert_eq!(rows.get_table("people").await.unwrap().len(), 1);

    client.remove_column("people", "Photo").await.unwrap();

    let after_remove = rows.get_row("people", 0).await.unwrap().unwrap();
    assert_eq!(after_remove.columns(), vec!["Id", "Name", "Age"]);
    assert_eq!(after_remove.get("Name"), Some(&SqlValue::from("Ada")));

    client
        .add_column("people", &ColumnDescriptor::new("Email", CanonicalType::Text))
        .await
        .unwrap();

    let table = rows.get_table("people").await.unwrap();
    assert_eq!(table[0].columns(), vec!["Id", "Name", "Age", "Email"]);
    assert_eq!(table[0].get("Email"), Some(&SqlValue::Null));

    let passthrough = client.executor().fetch_rows("SELECT * FROM people", &[]).await.unwrap();
    assert_eq!(passthrough, table);
}

#[tokio::test]
async fn test_passthrough_execution() {
    let client = memory_client().await;
    let executor = client.executor();

    executor
        .execute_batch(&[
            "CREATE TABLE notes(Body TEXT)".to_string(),
            "INSERT INTO notes VALUES('a'), ('b')".to_string(),
        ])
        .await
        .unwrap();

    let count = executor
        .fetch_scalar("SELECT COUNT(*) FROM notes WHERE Body <> ?1", &[SqlValue::from("a")])
        .await
        .unwrap();
    assert_eq!(count, Some(SqlValue::Integer(1)));

    let none = executor
        .fetch_scalar("SELECT Body FROM notes WHERE Body = ?1", &[SqlValue::from("zzz")])
        .await
        .unwrap();
    assert_eq!(none, None);

    let affected = executor
        .execute("DELETE FROM notes WHERE Body = ?1", &[SqlValue::from("b")])
        .await
        .unwrap();
    assert_eq!(affected, 1);
}

#[tokio::test]
async fn test_transaction_is_all_or_nothing() {
    let client = memory_client().await;
    let executor = client.executor();

    let result = executor
        .execute_in_transaction(&[
            "CREATE TABLE staged(v INTEGER)".to_string(),
            "INSERT INTO staged VALUES(1)".to_string(),
            "INSERT INTO missing_table VALUES(1)".to_string(),
        ])
        .await;

    assert!(matches!(result, Err(Error::Engine(_))));
    assert!(!client.reader().table_exists("staged").await.unwrap());
}

#[tokio::test]
async fn test_init_from_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("app.db");
    let config_path = dir.path().join("schema_evolve.toml");

    let mut file = std::fs::File::create(&config_path).unwrap();
    writeln!(
        file,
        "[database]\nurl = \"sqlite://{}\"\n\n[rebuild]\nmax_name_attempts = 4\n",
        db_path.display()
    )
    .unwrap();

    let client = schema_evolve::init(config_path.to_str().unwrap()).await.unwrap();
    assert_eq!(client.config().rebuild.max_name_attempts, 4);

    client.create_table("people", &[id_column()]).await.unwrap();
    client.close().await.unwrap();

    // The database file outlives the session
    let reopened = schema_evolve::init(config_path.to_str().unwrap()).await.unwrap();
    assert!(reopened.reader().table_exists("people").await.unwrap());
    reopened.close().await.unwrap();
}

#[tokio::test]
async fn test_init_with_missing_config_file() {
    let result = schema_evolve::init("/nonexistent/schema_evolve.toml").await;
    assert!(matches!(result, Err(Error::ConfigError(_))));
}
