//! Orchestration tests against scripted drivers.
//!
//! These exercise the save state machine and the dialect-specific
//! key-retrieval paths for the backends that have no embedded driver:
//! Postgres (RETURNING scalar), SQL Server (SCOPE_IDENTITY scalar) and
//! Oracle (RETURNING ... INTO output parameter).

mod common;

use std::sync::Arc;

use common::{MockExecutor, Reply};
use rowforge_db::{
    BulkMode, DbConnection, DbError, DialectKind, NamingConvention, SaveOptions, SqlValue,
    StatementKind, Synthesizer,
};
use rowforge_derive::Entity;

#[derive(Debug, Clone, Entity)]
#[entity(table = "orders")]
struct Order {
    #[field(primary_key)]
    id: i64,
    customer_name: String,
    total: f64,
}

fn order() -> Order {
    Order {
        id: 0,
        customer_name: String::from("Ada"),
        total: 12.5,
    }
}

fn connect(kind: DialectKind, mock: MockExecutor) -> DbConnection<MockExecutor> {
    let synthesizer = Arc::new(Synthesizer::new(kind, NamingConvention::SnakeCase));
    DbConnection::new(mock, synthesizer)
}

// =============================================================================
// Primary-key retrieval per dialect
// =============================================================================

#[tokio::test]
async fn test_postgres_insert_retrieves_key_via_returning() {
    let mock = MockExecutor::new().reply(Reply::Scalar(Some(SqlValue::Int(42))));
    let mut conn = connect(DialectKind::Postgres, mock);

    let mut entity = order();
    conn.save(&mut entity).await.unwrap();

    assert_eq!(entity.id, 42);
    let (sql, params) = &conn.executor().executed[0];
    assert_eq!(
        sql,
        "INSERT INTO orders (customer_name, total) VALUES (@p_customer_name, @p_total) RETURNING id"
    );
    assert_eq!(params.len(), 2);
}

#[tokio::test]
async fn test_sqlserver_insert_retrieves_key_via_scope_identity() {
    // SCOPE_IDENTITY() surfaces as a numeric scalar
    let mock = MockExecutor::new().reply(Reply::Scalar(Some(SqlValue::Float(42.0))));
    let mut conn = connect(DialectKind::SqlServer, mock);

    let mut entity = order();
    conn.save(&mut entity).await.unwrap();

    assert_eq!(entity.id, 42);
    let (sql, _) = &conn.executor().executed[0];
    assert!(sql.ends_with("; SELECT SCOPE_IDENTITY()"));
}

#[tokio::test]
async fn test_oracle_sequence_insert_retrieves_key_via_out_param() {
    let mock = MockExecutor::new().reply(Reply::OutValue {
        param: "p_out_id",
        value: SqlValue::Int(99),
    });
    let mut conn = connect(DialectKind::Oracle, mock);

    let mut entity = order();
    conn.save_with(&mut entity, "orders", &SaveOptions::with_sequence("orders_seq"))
        .await
        .unwrap();

    assert_eq!(entity.id, 99);
    let (sql, _) = &conn.executor().executed[0];
    assert!(sql.contains("orders_seq.NEXTVAL"));
    assert!(sql.ends_with(" RETURNING id INTO :p_out_id"));
}

#[tokio::test]
async fn test_included_pk_suppresses_retrieval() {
    let mock = MockExecutor::new().reply(Reply::Affected(1));
    let mut conn = connect(DialectKind::Postgres, mock);

    let mut entity = order();
    entity.id = 0; // absent key, but caller supplies the column
    conn.save_with(&mut entity, "orders", &SaveOptions::with_pk())
        .await
        .unwrap();

    assert_eq!(entity.id, 0);
    let (sql, params) = &conn.executor().executed[0];
    assert!(!sql.contains("RETURNING"));
    assert_eq!(params.len(), 3);
}

// =============================================================================
// Update-before-insert fallback
// =============================================================================

#[tokio::test]
async fn test_present_key_updates_first() {
    let mock = MockExecutor::new().reply(Reply::Affected(1));
    let mut conn = connect(DialectKind::Postgres, mock);

    let mut entity = order();
    entity.id = 7;
    conn.save(&mut entity).await.unwrap();

    let executed = &conn.executor().executed;
    assert_eq!(executed.len(), 1);
    assert_eq!(
        executed[0].0,
        "UPDATE orders SET customer_name = @p_customer_name, total = @p_total WHERE id = @p_id"
    );
    // key unchanged by an update
    assert_eq!(entity.id, 7);
}

#[tokio::test]
async fn test_zero_row_update_falls_back_to_insert() {
    let mock = MockExecutor::new()
        .reply(Reply::Affected(0))
        .reply(Reply::Scalar(Some(SqlValue::Int(8))));
    let mut conn = connect(DialectKind::Postgres, mock);

    let mut entity = order();
    entity.id = 7; // present, but no such row
    conn.save(&mut entity).await.unwrap();

    let executed = &conn.executor().executed;
    assert_eq!(executed.len(), 2);
    assert!(executed[0].0.starts_with("UPDATE orders"));
    assert!(executed[1].0.starts_with("INSERT INTO orders"));
    assert_eq!(entity.id, 8);
}

#[tokio::test]
async fn test_sentinel_minus_one_counts_as_absent() {
    let mock = MockExecutor::new().reply(Reply::Scalar(Some(SqlValue::Int(5))));
    let mut conn = connect(DialectKind::Postgres, mock);

    let mut entity = order();
    entity.id = -1;
    conn.save(&mut entity).await.unwrap();

    // no UPDATE attempt for the sentinel
    assert_eq!(conn.executor().executed.len(), 1);
    assert!(conn.executor().executed[0].0.starts_with("INSERT"));
    assert_eq!(entity.id, 5);
}

// =============================================================================
// Error tagging
// =============================================================================

#[tokio::test]
async fn test_database_error_carries_operation_kind() {
    let mock = MockExecutor::new().reply(Reply::Fail("duplicate key"));
    let mut conn = connect(DialectKind::Oracle, mock);

    let mut entity = order();
    entity.id = 3;
    let err = conn.save(&mut entity).await.unwrap_err();

    assert!(matches!(
        err,
        DbError::Database {
            op: StatementKind::Update,
            ..
        }
    ));
}

// =============================================================================
// Bulk save
// =============================================================================

#[tokio::test]
async fn test_bulk_save_first_row_single_path_rest_batched() {
    let mock = MockExecutor::new()
        .reply(Reply::Scalar(Some(SqlValue::Int(1))))
        .reply(Reply::Affected(2));
    let mut conn = connect(DialectKind::Postgres, mock);

    let mut batch = vec![order(), order(), order()];
    conn.save_all(&mut batch).await.unwrap();

    // element 0 got its key back; the rest were not retrieved
    assert_eq!(batch[0].id, 1);
    assert_eq!(batch[1].id, 0);

    let executor = conn.executor();
    assert_eq!(executor.begins, 1);
    assert_eq!(executor.commits, 1);
    assert_eq!(executor.rollbacks, 0);

    let (bulk_sql, bulk_params) = &executor.executed[1];
    assert!(bulk_sql.contains("VALUES (@p_customer_name_0, @p_total_0), (@p_customer_name_1, @p_total_1)"));
    // fields-per-row x (N - 1) parameters, all names unique
    assert_eq!(bulk_params.len(), 4);
    let mut names: Vec<_> = bulk_params.iter().map(|p| p.name.clone()).collect();
    names.sort_unstable();
    names.dedup();
    assert_eq!(names.len(), 4);
}

#[tokio::test]
async fn test_bulk_failure_rolls_back_and_rethrows() {
    let mock = MockExecutor::new()
        .reply(Reply::Scalar(Some(SqlValue::Int(1))))
        .reply(Reply::Fail("unique constraint violated"));
    let mut conn = connect(DialectKind::Postgres, mock);

    let mut batch = vec![order(), order(), order()];
    let err = conn.save_all(&mut batch).await.unwrap_err();

    assert!(matches!(
        err,
        DbError::Database {
            op: StatementKind::BulkInsert,
            ..
        }
    ));
    let executor = conn.executor();
    assert_eq!(executor.begins, 1);
    assert_eq!(executor.commits, 0);
    assert_eq!(executor.rollbacks, 1);
    assert!(!conn.in_transaction());
}

#[tokio::test]
async fn test_bulk_in_caller_transaction_leaves_rollback_to_caller() {
    let mock = MockExecutor::new()
        .reply(Reply::Scalar(Some(SqlValue::Int(1))))
        .reply(Reply::Fail("unique constraint violated"));
    let mut conn = connect(DialectKind::Postgres, mock);

    conn.begin().await.unwrap();
    let mut batch = vec![order(), order()];
    let err = conn
        .save_all_with(
            &mut batch,
            "orders",
            &SaveOptions::default(),
            BulkMode::SingleTransaction,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, DbError::Database { .. }));
    // the orchestrator neither committed nor rolled back the caller's
    // transaction
    let executor = conn.executor();
    assert_eq!(executor.begins, 1);
    assert_eq!(executor.commits, 0);
    assert_eq!(executor.rollbacks, 0);
    assert!(conn.in_transaction());

    conn.rollback().await.unwrap();
}

#[tokio::test]
async fn test_empty_batch_is_a_no_op() {
    let mock = MockExecutor::new();
    let mut conn = connect(DialectKind::Postgres, mock);

    let mut batch: Vec<Order> = vec![];
    conn.save_all(&mut batch).await.unwrap();
    assert!(conn.executor().executed.is_empty());
    assert_eq!(conn.executor().begins, 0);
}

#[tokio::test]
async fn test_oracle_bulk_uses_anonymous_block_for_sequences() {
    let mock = MockExecutor::new()
        .reply(Reply::OutValue {
            param: "p_out_id",
            value: SqlValue::Int(1),
        })
        .reply(Reply::Affected(2));
    let mut conn = connect(DialectKind::Oracle, mock);

    let mut batch = vec![order(), order(), order()];
    conn.save_all_with(
        &mut batch,
        "orders",
        &SaveOptions::with_sequence("orders_seq"),
        BulkMode::SingleTransaction,
    )
    .await
    .unwrap();

    let (bulk_sql, _) = &conn.executor().executed[1];
    assert!(bulk_sql.starts_with("BEGIN INSERT INTO orders"));
    assert!(bulk_sql.ends_with("END;"));
    assert_eq!(bulk_sql.matches("orders_seq.NEXTVAL").count(), 2);
}

// =============================================================================
// LOB handling
// =============================================================================

#[derive(Debug, Clone, Entity)]
#[entity(table = "documents")]
struct Document {
    #[field(primary_key)]
    id: i64,
    #[field(blob)]
    body: Vec<u8>,
    #[field(clob)]
    notes: String,
}

#[tokio::test]
async fn test_oracle_lob_params_flagged_and_disposed() {
    // plain insert without key retrieval keeps the script simple
    let mock = MockExecutor::new().reply(Reply::Affected(1));
    let mut conn = connect(DialectKind::Oracle, mock);

    let mut doc = Document {
        id: 0,
        body: vec![1, 2, 3],
        notes: String::from("long text"),
    };
    conn.save_with(
        &mut doc,
        "documents",
        &SaveOptions {
            retrieve_pk: false,
            ..SaveOptions::default()
        },
    )
    .await
    .unwrap();

    // the recorded snapshot still carries the bound LOB values
    let (_, params) = &conn.executor().executed[0];
    assert_eq!(params[0].value, SqlValue::Blob(vec![1, 2, 3]));
    assert!(params[0].is_lob());
}
