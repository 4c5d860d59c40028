use chrono::NaiveDate;
use sql_mapper::prelude::*;

#[derive(Debug, Default, Clone, PartialEq)]
struct Account {
    id: i64,
    name: String,
    balance: f64,
    active: bool,
    visits: u32,
    note: String,
    nickname: Option<String>,
}

sql_mapper::impl_record!(Account {
    id => "id",
    name => "name",
    balance => "balance",
    active => "active",
    visits => "visits",
    note => "",
    nickname => "nickname",
});

#[derive(Debug, Default, Clone, PartialEq)]
struct Event {
    id: i64,
    at: chrono::NaiveDateTime,
    closed_at: Option<chrono::NaiveDateTime>,
    payload: Vec<u8>,
}

sql_mapper::impl_record!(Event {
    id => "id",
    at => "at",
    closed_at => "closed_at",
    payload => "payload",
});

const ACCOUNTS: &str = "SELECT * FROM accounts";
const NO_ACCOUNTS: &str = "SELECT * FROM accounts WHERE 1 = 0";
const NULL_ACCOUNT: &str = "SELECT NULL AS id, NULL AS name";

fn account_columns() -> [&'static str; 7] {
    [
        "id", "name", "balance", "active", "visits", "nickname", "extra",
    ]
}

fn accounts_db() -> MemoryExecutor {
    MemoryExecutor::new()
        .with_rows(
            ACCOUNTS,
            ResultSet::from_rows(
                &account_columns(),
                vec![
                    vec![
                        RowValues::Int(1),
                        RowValues::Text("ann".into()),
                        RowValues::Float(10.25),
                        RowValues::Int(1),
                        RowValues::Int(3),
                        RowValues::Text("a".into()),
                        RowValues::Text("ignored".into()),
                    ],
                    vec![
                        RowValues::Int(2),
                        RowValues::Null,
                        RowValues::Null,
                        RowValues::Null,
                        RowValues::Null,
                        RowValues::Null,
                        RowValues::Null,
                    ],
                ],
            ),
        )
        .with_rows(NO_ACCOUNTS, ResultSet::from_rows(&account_columns(), vec![]))
        .with_rows(
            NULL_ACCOUNT,
            ResultSet::from_rows(&["id", "name"], vec![vec![RowValues::Null, RowValues::Null]]),
        )
}

fn assert_released(db: &MemoryExecutor) {
    assert_eq!(db.open_statements(), 0, "statement left open");
    assert_eq!(db.open_cursors(), 0, "cursor left open");
}

#[test]
fn find_maps_tagged_fields_and_zeroes_nulls() -> Result<(), Box<dyn std::error::Error>> {
    let db = accounts_db();
    let engine = Engine::new();

    let accounts: Vec<Account> = engine.find(&db, ACCOUNTS, &[])?;
    assert_eq!(
        accounts,
        vec![
            Account {
                id: 1,
                name: "ann".into(),
                balance: 10.25,
                active: true,
                visits: 3,
                note: String::new(),
                nickname: Some("a".into()),
            },
            Account {
                id: 2,
                ..Account::default()
            },
        ]
    );
    assert_released(&db);
    Ok(())
}

#[test]
fn first_without_rows_leaves_destination_alone() -> Result<(), Box<dyn std::error::Error>> {
    let db = accounts_db();
    let engine = Engine::new();

    let mut dest = Account {
        id: 99,
        name: "keep".into(),
        note: "scratch".into(),
        ..Account::default()
    };
    let before = dest.clone();
    let found = engine.first(&db, NO_ACCOUNTS, &[], &mut dest)?;
    assert!(!found);
    assert_eq!(dest, before);
    assert_released(&db);
    Ok(())
}

#[test]
fn first_on_null_row_sets_zero_values() -> Result<(), Box<dyn std::error::Error>> {
    let db = accounts_db();
    let engine = Engine::new();

    let mut dest = Account {
        id: 99,
        name: "old".into(),
        note: "scratch".into(),
        ..Account::default()
    };
    let found = engine.first(&db, NULL_ACCOUNT, &[], &mut dest)?;
    assert!(found);
    assert_eq!(dest.id, 0);
    assert_eq!(dest.name, "");
    // untagged fields are never written
    assert_eq!(dest.note, "scratch");
    Ok(())
}

#[test]
fn negative_value_into_unsigned_field_errors() {
    let db = MemoryExecutor::new().with_rows(
        "SELECT visits FROM accounts",
        ResultSet::from_rows(&["visits"], vec![vec![RowValues::Int(-4)]]),
    );
    let engine = Engine::new();

    let err = engine
        .find::<Account>(&db, "SELECT visits FROM accounts", &[])
        .unwrap_err();
    assert!(matches!(
        err,
        SqlMapperError::UnsignedUnderflow {
            value: -4,
            type_name: "u32"
        }
    ));
    assert_released(&db);
}

#[test]
fn failed_scan_leaves_slice_untouched() {
    let db = accounts_db().with_failure(ACCOUNTS, FailurePoint::Fetch { after_rows: 1 });
    let engine = Engine::new();

    let mut dest = vec![Account {
        id: 7,
        ..Account::default()
    }];
    let err = engine.find_into(&db, ACCOUNTS, &[], &mut dest).unwrap_err();
    assert!(matches!(err, SqlMapperError::ExecutionError(_)));
    assert_eq!(dest.len(), 1);
    assert_eq!(dest[0].id, 7);
    assert_released(&db);
}

#[test]
fn handles_are_released_on_prepare_and_execute_failures() {
    let engine = Engine::new();

    let db = accounts_db().with_failure(ACCOUNTS, FailurePoint::Prepare);
    assert!(engine.find::<Account>(&db, ACCOUNTS, &[]).is_err());
    assert_eq!(db.prepared_count(), 0);
    assert_released(&db);

    let db = accounts_db().with_failure(ACCOUNTS, FailurePoint::Execute);
    assert!(engine.find::<Account>(&db, ACCOUNTS, &[]).is_err());
    assert_eq!(db.prepared_count(), 1);
    assert_released(&db);

    let unknown = engine.find::<Account>(&db, "SELECT nothing", &[]);
    assert!(unknown.is_err());
    assert_released(&db);
}

#[test]
fn first_col_reads_exactly_one_column() -> Result<(), Box<dyn std::error::Error>> {
    let db = accounts_db()
        .with_rows(
            "SELECT COUNT(*) FROM accounts",
            ResultSet::from_rows(&["n"], vec![vec![RowValues::Int(2)]]),
        )
        .with_rows(
            "SELECT big",
            ResultSet::from_rows(&["n"], vec![vec![RowValues::Int(300)]]),
        )
        .with_rows(
            "SELECT nothing",
            ResultSet::from_rows(&["name"], vec![vec![RowValues::Null]]),
        )
        .with_rows("SELECT n FROM empty", ResultSet::from_rows(&["n"], vec![]));
    let engine = Engine::new();

    let mut count: u8 = 0;
    assert!(engine.first_col(&db, "SELECT COUNT(*) FROM accounts", &[], &mut count)?);
    assert_eq!(count, 2);

    let mut name = String::from("prior");
    assert!(engine.first_col(&db, "SELECT nothing", &[], &mut name)?);
    assert_eq!(name, "");

    let mut untouched: i64 = 41;
    assert!(!engine.first_col(&db, "SELECT n FROM empty", &[], &mut untouched)?);
    assert_eq!(untouched, 41);

    let err = engine
        .first_col(&db, ACCOUNTS, &[], &mut untouched)
        .unwrap_err();
    assert!(matches!(err, SqlMapperError::ColumnMismatch(_)));
    assert_eq!(untouched, 41);

    let mut flag = false;
    let err = engine
        .first_col(&db, "SELECT COUNT(*) FROM accounts", &[], &mut flag)
        .unwrap_err();
    assert!(matches!(err, SqlMapperError::UnsupportedKind(ref kind) if kind.contains("bool")));

    let mut small: i8 = 0;
    let err = engine
        .first_col(&db, "SELECT big", &[], &mut small)
        .unwrap_err();
    assert!(matches!(err, SqlMapperError::ColumnMismatch(_)));
    assert_released(&db);
    Ok(())
}

#[test]
fn custom_fields_receive_raw_driver_values() -> Result<(), Box<dyn std::error::Error>> {
    let at = NaiveDate::from_ymd_opt(2024, 1, 2)
        .and_then(|d| d.and_hms_opt(3, 4, 5))
        .ok_or("bad date")?;
    let db = MemoryExecutor::new().with_rows(
        "SELECT * FROM events",
        ResultSet::from_rows(
            &["id", "at", "closed_at", "payload"],
            vec![
                vec![
                    RowValues::Int(1),
                    RowValues::Text("2024-01-02 03:04:05".into()),
                    RowValues::Null,
                    RowValues::Blob(vec![1, 2, 3]),
                ],
                vec![
                    RowValues::Int(2),
                    RowValues::Timestamp(at),
                    RowValues::Timestamp(at),
                    RowValues::Null,
                ],
            ],
        ),
    );
    let engine = Engine::new();

    let events: Vec<Event> = engine.find(&db, "SELECT * FROM events", &[])?;
    assert_eq!(events[0].at, at);
    assert_eq!(events[0].closed_at, None);
    assert_eq!(events[0].payload, vec![1, 2, 3]);
    assert_eq!(events[1].closed_at, Some(at));
    assert!(events[1].payload.is_empty());
    Ok(())
}

#[test]
fn trace_sink_sees_final_query_text() -> Result<(), Box<dyn std::error::Error>> {
    use std::sync::{Arc, Mutex};

    let seen: Arc<Mutex<Vec<(String, usize)>>> = Arc::default();
    let sink = Arc::clone(&seen);
    let engine = Engine::builder()
        .trace_sink(Arc::new(move |query: &str, args: &[RowValues]| {
            if let Ok(mut seen) = sink.lock() {
                seen.push((query.to_string(), args.len()));
            }
        }))
        .build();

    let db = accounts_db();
    let _: Vec<Account> = engine.find(&db, ACCOUNTS, &[RowValues::Int(1)])?;
    let seen = seen.lock().map_err(|e| e.to_string())?;
    assert_eq!(seen.as_slice(), &[(ACCOUNTS.to_string(), 1)]);
    Ok(())
}
