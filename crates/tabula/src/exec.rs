//! Serializes statements for the connection's flavor and runs them.

use tabula_core::{
    driver::operation::{QuerySql, Transaction},
    Connection, Result, Type, Value,
};
use tabula_sql::{Serializer, Statement};

pub(crate) fn serializer(conn: &dyn Connection) -> Serializer {
    Serializer::new(conn.capability().flavor)
}

/// Runs a statement that returns no rows, returning the affected row count.
pub(crate) async fn execute(conn: &mut dyn Connection, stmt: &Statement) -> Result<u64> {
    let mut params = Vec::<Value>::new();
    let sql = serializer(conn).serialize(stmt, &mut params);

    tracing::debug!(%sql, params = params.len(), "execute");
    let response = conn.exec(QuerySql::execute(sql, params).into()).await?;
    Ok(response.rows.into_count())
}

/// Runs a statement returning rows whose columns have the types in `ret`.
pub(crate) async fn query(
    conn: &mut dyn Connection,
    stmt: &Statement,
    ret: Vec<Type>,
) -> Result<Vec<Vec<Value>>> {
    debug_assert_eq!(stmt.returning_len(), Some(ret.len()), "stmt={stmt:#?}");

    let mut params = Vec::<Value>::new();
    let sql = serializer(conn).serialize(stmt, &mut params);

    tracing::debug!(%sql, params = params.len(), "query");
    let response = conn.exec(QuerySql::query(sql, params, ret).into()).await?;
    Ok(response.into_values())
}

pub(crate) async fn transaction(conn: &mut dyn Connection, op: Transaction) -> Result<()> {
    tracing::debug!(?op, "transaction");
    conn.exec(op.into()).await?;
    Ok(())
}

/// Commits when `ret` is a success and rolls back otherwise. The original
/// error wins over a failed rollback.
pub(crate) async fn finish<T>(conn: &mut dyn Connection, ret: Result<T>) -> Result<T> {
    match ret {
        Ok(value) => {
            transaction(conn, Transaction::Commit).await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback) = transaction(conn, Transaction::Rollback).await {
                tracing::warn!(error = %rollback, "rollback failed");
            }
            Err(err)
        }
    }
}
