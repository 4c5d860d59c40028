use sql_mapper::prelude::*;

#[derive(Debug, Default, Clone, PartialEq)]
struct User {
    id: i64,
    name: String,
}

sql_mapper::impl_record!(User {
    id => "id",
    name => "name",
});

#[derive(Debug, Default, Clone, PartialEq)]
struct Role {
    user_id: i64,
    role: String,
}

sql_mapper::impl_record!(Role {
    user_id => "user_id",
    role => "role",
});

#[derive(Debug, Default, Clone, PartialEq)]
struct Summary {
    total: i64,
}

sql_mapper::impl_record!(Summary { total => "total" });

fn users() -> ResultSet {
    ResultSet::from_rows(
        &["id", "name"],
        vec![
            vec![RowValues::Int(1), RowValues::Text("ann".into())],
            vec![RowValues::Int(2), RowValues::Text("bob".into())],
        ],
    )
}

fn roles() -> ResultSet {
    ResultSet::from_rows(
        &["user_id", "role"],
        vec![vec![RowValues::Int(1), RowValues::Text("admin".into())]],
    )
}

fn summary() -> ResultSet {
    ResultSet::from_rows(&["total"], vec![vec![RowValues::Int(2)]])
}

#[test]
fn fewer_sets_than_targets_leaves_the_rest_alone() -> Result<(), Box<dyn std::error::Error>> {
    let db = MemoryExecutor::new().with_result_sets("CALL `users_and_roles`()", vec![users(), roles()]);
    let engine = Engine::new();

    let mut found_users: Vec<User> = Vec::new();
    let mut found_roles: Vec<Role> = vec![Role::default(); 3];
    let mut found_summary = Summary { total: -1 };
    engine.find_multiple(
        &db,
        QueryText::procedure("users_and_roles"),
        &[],
        &mut [
            ResultTarget::many(&mut found_users),
            ResultTarget::many(&mut found_roles),
            ResultTarget::one(&mut found_summary),
        ],
    )?;

    assert_eq!(found_users.len(), 2);
    assert_eq!(found_users[1].name, "bob");
    assert_eq!(
        found_roles,
        vec![Role {
            user_id: 1,
            role: "admin".into()
        }]
    );
    assert_eq!(found_summary.total, -1);
    assert_eq!(db.open_cursors(), 0);
    assert_eq!(db.open_statements(), 0);
    Ok(())
}

#[test]
fn single_record_target_takes_first_row() -> Result<(), Box<dyn std::error::Error>> {
    let db = MemoryExecutor::new().with_result_sets(
        "CALL `report`(?)",
        vec![summary(), users()],
    );
    let engine = Engine::new();

    let mut total = Summary::default();
    let mut first_user = User::default();
    engine.find_multiple(
        &db,
        QueryText::procedure("report"),
        &[RowValues::Int(5)],
        &mut [ResultTarget::one(&mut total), ResultTarget::one(&mut first_user)],
    )?;
    assert_eq!(total.total, 2);
    assert_eq!(first_user.name, "ann");
    Ok(())
}

#[test]
fn more_sets_than_targets_is_an_error() {
    let db = MemoryExecutor::new().with_result_sets(
        "CALL `everything`()",
        vec![users(), roles(), summary(), users()],
    );
    let engine = Engine::new();

    let mut a: Vec<User> = Vec::new();
    let mut b: Vec<Role> = Vec::new();
    let mut c = Summary::default();
    let err = engine
        .find_multiple(
            &db,
            QueryText::procedure("everything"),
            &[],
            &mut [
                ResultTarget::many(&mut a),
                ResultTarget::many(&mut b),
                ResultTarget::one(&mut c),
            ],
        )
        .unwrap_err();
    assert_eq!(err.to_string(), "too many result sets, expected 3");
    // sets routed before the overflow keep their rows
    assert_eq!(a.len(), 2);
    assert_eq!(c.total, 2);
    assert_eq!(db.open_cursors(), 0);
    assert_eq!(db.open_statements(), 0);
}

#[test]
fn empty_target_list_runs_nothing() {
    let db = MemoryExecutor::new().with_result_sets("CALL `users_and_roles`()", vec![users()]);
    let engine = Engine::new();

    let err = engine
        .find_multiple(&db, QueryText::procedure("users_and_roles"), &[], &mut [])
        .unwrap_err();
    assert!(matches!(err, SqlMapperError::ShapeError(_)));
    assert_eq!(db.prepared_count(), 0);
    assert!(db.executed().is_empty());
}

#[test]
fn procedure_call_gets_one_placeholder_per_argument() -> Result<(), Box<dyn std::error::Error>> {
    let db = MemoryExecutor::new().with_result_sets("CALL `sp`(?,?)", vec![users()]);
    let engine = Engine::new();

    let mut out: Vec<User> = Vec::new();
    let args = [RowValues::Int(1), RowValues::Text("x".into())];
    engine.find_multiple(
        &db,
        QueryText::procedure("sp"),
        &args,
        &mut [ResultTarget::many(&mut out)],
    )?;
    assert_eq!(
        db.executed(),
        vec![("CALL `sp`(?,?)".to_string(), args.to_vec())]
    );
    assert_eq!(out.len(), 2);
    Ok(())
}

#[test]
fn failure_mid_dispatch_releases_handles() {
    let db = MemoryExecutor::new()
        .with_result_sets("CALL `broken`()", vec![users(), roles()])
        .with_failure("CALL `broken`()", FailurePoint::Fetch { after_rows: 2 });
    let engine = Engine::new();

    let mut a: Vec<User> = Vec::new();
    let mut b: Vec<Role> = Vec::new();
    let result = engine.find_multiple(
        &db,
        QueryText::procedure("broken"),
        &[],
        &mut [ResultTarget::many(&mut a), ResultTarget::many(&mut b)],
    );
    assert!(matches!(result, Err(SqlMapperError::ExecutionError(_))));
    assert!(a.is_empty());
    assert_eq!(db.open_cursors(), 0);
    assert_eq!(db.open_statements(), 0);
}
