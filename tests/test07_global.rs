#![cfg(feature = "sqlite")]

use sql_mapper::global;
use sql_mapper::prelude::*;

#[derive(Debug, Default, Clone, PartialEq)]
struct Setting {
    key: String,
    value: String,
}

sql_mapper::impl_record!(Setting {
    key => "key",
    value => "value",
});

// The handle is process-wide, so the whole lifecycle lives in one test.
#[tokio::test]
async fn global_handle_lifecycle() -> Result<(), Box<dyn std::error::Error>> {
    assert!(!global::is_connected());
    let err = global::find::<Setting>("SELECT * FROM settings", &[])
        .await
        .unwrap_err();
    assert!(matches!(err, SqlMapperError::ConfigError(_)));

    let dir = tempfile::tempdir()?;
    let db_path = dir.path().join("global.db");
    let options = ClientOptions::builder(db_path.to_string_lossy()).finish();
    global::connect(options).await?;
    assert!(global::is_connected());

    global::exec(
        "CREATE TABLE settings (key TEXT PRIMARY KEY, value TEXT)",
        &[],
    )
    .await?;
    let id = global::exec_last_id(
        "INSERT INTO settings (key, value) VALUES (?1, ?2)",
        &[RowValues::Text("theme".into()), RowValues::Text("dark".into())],
    )
    .await?;
    assert_eq!(id, 1);

    let settings: Vec<Setting> = global::find("SELECT * FROM settings", &[]).await?;
    assert_eq!(
        settings,
        vec![Setting {
            key: "theme".into(),
            value: "dark".into()
        }]
    );

    let mut one = Setting::default();
    assert!(global::first("SELECT * FROM settings", &[], &mut one).await?);
    assert_eq!(one.value, "dark");

    let keys: Option<Vec<String>> =
        global::find_array("SELECT key FROM settings", &[], "key").await?;
    assert_eq!(keys, Some(vec!["theme".to_string()]));

    let count: Option<i64> = global::first_col_any("SELECT COUNT(*) FROM settings", &[]).await?;
    assert_eq!(count, Some(1));

    let json = global::exec_json("SELECT key FROM settings", &[], JsonShape::One).await?;
    assert_eq!(json, br#"{"key":"theme"}"#);

    let previous = global::shutdown();
    assert!(previous.is_some());
    assert!(!global::is_connected());
    assert!(global::client().is_err());
    Ok(())
}
