#![cfg(feature = "sqlite")]

use std::collections::HashMap;

use serde_json::Value;
use sql_mapper::prelude::*;
use tempfile::TempDir;

#[derive(Debug, Default, Clone, PartialEq)]
struct Book {
    id: i64,
    title: String,
    pages: u32,
    in_stock: bool,
    isbn: Option<String>,
}

sql_mapper::impl_record!(Book {
    id => "id",
    title => "title",
    pages => "pages",
    in_stock => "in_stock",
    isbn => "isbn",
});

async fn client_in(dir: &TempDir) -> Result<Client, Box<dyn std::error::Error>> {
    let db_path = dir.path().join("books.db");
    let client = ClientOptions::builder(db_path.to_string_lossy())
        .max_open_conns(4)
        .debug(true)
        .build()
        .await?;
    client
        .with_connection(|conn| {
            conn.execute_batch(
                "CREATE TABLE books (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    title TEXT NOT NULL,
                    pages INTEGER,
                    in_stock INTEGER,
                    isbn TEXT
                );",
            )?;
            Ok(())
        })
        .await?;
    Ok(client)
}

#[tokio::test]
async fn client_crud_round_trip() -> Result<(), Box<dyn std::error::Error>> {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let dir = tempfile::tempdir()?;
    let client = client_in(&dir).await?;

    let insert = "INSERT INTO books (title, pages, in_stock, isbn) VALUES (?1, ?2, ?3, ?4)";
    let dune = client
        .exec_last_id(
            insert,
            &[
                RowValues::Text("Dune".into()),
                RowValues::Int(412),
                RowValues::Bool(true),
                RowValues::Text("978-0441013593".into()),
            ],
        )
        .await?;
    let notes = client
        .exec_last_id(
            insert,
            &[
                RowValues::Text("Notes".into()),
                RowValues::Null,
                RowValues::Null,
                RowValues::Null,
            ],
        )
        .await?;
    assert_eq!((dune, notes), (1, 2));

    let books: Vec<Book> = client.find("SELECT * FROM books ORDER BY id", &[]).await?;
    assert_eq!(books.len(), 2);
    assert_eq!(books[0].isbn.as_deref(), Some("978-0441013593"));
    assert_eq!(
        books[1],
        Book {
            id: 2,
            title: "Notes".into(),
            ..Book::default()
        }
    );

    let mut found = Book::default();
    assert!(
        client
            .first("SELECT * FROM books WHERE id = ?1", &[RowValues::Int(dune)], &mut found)
            .await?
    );
    assert_eq!(found.pages, 412);
    assert!(found.in_stock);

    let mut missing = Book {
        title: "unchanged".into(),
        ..Book::default()
    };
    assert!(
        !client
            .first("SELECT * FROM books WHERE id = 99", &[], &mut missing)
            .await?
    );
    assert_eq!(missing.title, "unchanged");

    assert!(
        client
            .exec(
                "UPDATE books SET pages = ?1 WHERE id = ?2",
                &[RowValues::Int(88), RowValues::Int(notes)],
            )
            .await?
    );
    assert!(
        !client
            .exec("DELETE FROM books WHERE id = 99", &[])
            .await?
    );

    let mut pages: u32 = 0;
    assert!(
        client
            .first_col("SELECT SUM(pages) FROM books", &[], &mut pages)
            .await?
    );
    assert_eq!(pages, 500);
    Ok(())
}

#[tokio::test]
async fn client_generic_retrieval_and_json() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let client = client_in(&dir).await?;
    client
        .with_connection(|conn| {
            conn.execute_batch(
                "INSERT INTO books (title, pages, isbn) VALUES
                    ('A', 10, 'x-1'), ('B', NULL, NULL), ('C', 30, 'x-3');",
            )?;
            Ok(())
        })
        .await?;

    let titles: Option<Vec<String>> = client
        .find_array("SELECT title FROM books ORDER BY id", &[], "title")
        .await?;
    assert_eq!(titles.map(|t| t.join(",")), Some("A,B,C".to_string()));

    let isbns: Option<Vec<String>> = client
        .find_array("SELECT isbn FROM books ORDER BY id", &[], "isbn")
        .await?;
    assert_eq!(isbns, Some(vec!["x-1".to_string(), "x-3".to_string()]));

    let pages: Option<HashMap<String, i64>> = client
        .find_map("SELECT title, pages FROM books", &[], "title", "pages")
        .await?;
    let pages = pages.ok_or("expected pages")?;
    assert_eq!(pages["B"], 0);
    assert_eq!(pages["C"], 30);

    let by_id: Option<HashMap<i64, Book>> = client
        .find_map("SELECT * FROM books", &[], "id", "")
        .await?;
    assert_eq!(by_id.ok_or("expected books")?[&3].title, "C");

    let none: Option<i64> = client
        .first_col_any("SELECT id FROM books WHERE title = ?1", &[RowValues::Text("Z".into())])
        .await?;
    assert_eq!(none, None);

    let json = client
        .exec_json(
            "SELECT id, title FROM books ORDER BY id",
            &[],
            JsonShape::List,
        )
        .await?;
    let value: Value = serde_json::from_slice(&json)?;
    assert_eq!(value.as_array().map(Vec::len), Some(3));
    assert_eq!(value[1]["title"], "B");
    Ok(())
}

#[tokio::test]
async fn client_multi_target_on_single_result_set() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let client = client_in(&dir).await?;
    client
        .exec(
            "INSERT INTO books (title) VALUES (?1)",
            &[RowValues::Text("Solo".into())],
        )
        .await?;

    let mut books: Vec<Book> = Vec::new();
    let mut spare = Book {
        id: -1,
        ..Book::default()
    };
    client
        .find_multiple(
            "SELECT * FROM books",
            &[],
            &mut [ResultTarget::many(&mut books), ResultTarget::one(&mut spare)],
        )
        .await?;
    assert_eq!(books.len(), 1);
    assert_eq!(spare.id, -1);

    let err = client
        .find_multiple("SELECT * FROM books", &[], &mut [])
        .await
        .unwrap_err();
    assert!(matches!(err, SqlMapperError::ShapeError(_)));
    Ok(())
}

#[tokio::test]
async fn invalid_options_are_rejected() {
    let err = ClientOptions::builder("").build().await.unwrap_err();
    assert!(matches!(err, SqlMapperError::ConfigError(_)));

    let err = ClientOptions::builder("unused.db")
        .max_open_conns(0)
        .build()
        .await
        .unwrap_err();
    assert!(matches!(err, SqlMapperError::ConfigError(_)));
}

#[tokio::test]
async fn transaction_through_with_connection() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let client = client_in(&dir).await?;

    let inserted = client
        .with_connection(|conn| {
            let tx = conn.transaction()?;
            tx.execute("INSERT INTO books (title) VALUES ('one')", [])?;
            tx.execute("INSERT INTO books (title) VALUES ('two')", [])?;
            tx.commit()?;
            Ok(2)
        })
        .await?;
    assert_eq!(inserted, 2);

    let count: Option<i64> = client.first_col_any("SELECT COUNT(*) FROM books", &[]).await?;
    assert_eq!(count, Some(2));
    Ok(())
}

fn assert_send<F: std::future::Future + Send>(future: F) -> F {
    future
}

#[tokio::test]
async fn multi_target_call_can_be_spawned() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let client = client_in(&dir).await?;
    client
        .exec(
            "INSERT INTO books (title, pages) VALUES (?1, ?2)",
            &[RowValues::Text("Spawned".into()), RowValues::Int(7)],
        )
        .await?;

    let mut borrowed: Vec<Book> = Vec::new();
    {
        let mut targets = [ResultTarget::many(&mut borrowed)];
        assert_send(client.find_multiple("SELECT * FROM books", &[], &mut targets)).await?;
    }
    assert_eq!(borrowed.len(), 1);

    let task_client = client.clone();
    let handle = tokio::spawn(async move {
        let mut books: Vec<Book> = Vec::new();
        let mut first = Book::default();
        task_client
            .find_multiple(
                "SELECT * FROM books",
                &[],
                &mut [ResultTarget::many(&mut books), ResultTarget::one(&mut first)],
            )
            .await?;
        Ok::<_, SqlMapperError>(books)
    });
    let books = handle.await??;
    assert_eq!(books[0].title, "Spawned");
    assert_eq!(books[0].pages, 7);
    Ok(())
}

#[tokio::test]
async fn idle_pool_settings_reach_the_pool() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let db_path = dir.path().join("idle.db");
    let client = ClientOptions::builder(db_path.to_string_lossy())
        .max_open_conns(3)
        .min_idle_conns(Some(1))
        .idle_timeout(Some(std::time::Duration::from_secs(30)))
        .build()
        .await?;
    assert!(client.pool().state().connections >= 1);

    let err = ClientOptions::builder(db_path.to_string_lossy())
        .max_open_conns(1)
        .min_idle_conns(Some(2))
        .build()
        .await
        .unwrap_err();
    assert!(matches!(err, SqlMapperError::ConfigError(_)));
    Ok(())
}
