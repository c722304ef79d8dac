//! Shared test support: a scripted executor that stands in for the
//! Postgres, SQL Server and Oracle drivers.

use std::collections::VecDeque;

use rowforge_db::{DbError, Executor, ParamDirection, SqlParam, SqlValue};

/// One scripted driver response.
#[derive(Debug, Clone)]
pub enum Reply {
    /// `execute` returns this affected-row count.
    Affected(u64),
    /// `fetch_scalar` returns this value.
    Scalar(Option<SqlValue>),
    /// `execute` writes `value` into the named output parameter and
    /// reports one affected row.
    OutValue {
        param: &'static str,
        value: SqlValue,
    },
    /// The call fails with a driver error.
    Fail(&'static str),
}

/// A scripted [`Executor`] recording every submitted statement.
#[derive(Debug, Default)]
pub struct MockExecutor {
    replies: VecDeque<Reply>,
    pub executed: Vec<(String, Vec<SqlParam>)>,
    pub begins: usize,
    pub commits: usize,
    pub rollbacks: usize,
}

impl MockExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(mut self, reply: Reply) -> Self {
        self.replies.push_back(reply);
        self
    }

    fn next_reply(&mut self) -> Reply {
        self.replies.pop_front().expect("mock reply queue exhausted")
    }
}

impl Executor for MockExecutor {
    async fn execute(
        &mut self,
        sql: &str,
        params: &mut [SqlParam],
    ) -> rowforge_db::Result<u64> {
        let reply = self.next_reply();
        self.executed.push((sql.to_string(), params.to_vec()));
        match reply {
            Reply::Affected(n) => Ok(n),
            Reply::OutValue { param, value } => {
                let slot = params
                    .iter_mut()
                    .find(|p| p.name == param && p.direction != ParamDirection::In)
                    .expect("scripted output parameter not bound");
                slot.value = value;
                Ok(1)
            }
            Reply::Fail(message) => {
                Err(DbError::Driver(sqlx::Error::Protocol(message.into())))
            }
            Reply::Scalar(_) => panic!("execute call received a scalar script entry"),
        }
    }

    async fn fetch_scalar(
        &mut self,
        sql: &str,
        params: &mut [SqlParam],
    ) -> rowforge_db::Result<Option<SqlValue>> {
        let reply = self.next_reply();
        self.executed.push((sql.to_string(), params.to_vec()));
        match reply {
            Reply::Scalar(value) => Ok(value),
            Reply::Fail(message) => {
                Err(DbError::Driver(sqlx::Error::Protocol(message.into())))
            }
            other => panic!("fetch_scalar call received {other:?}"),
        }
    }

    async fn begin(&mut self) -> rowforge_db::Result<()> {
        self.begins += 1;
        Ok(())
    }

    async fn commit(&mut self) -> rowforge_db::Result<()> {
        self.commits += 1;
        Ok(())
    }

    async fn rollback(&mut self) -> rowforge_db::Result<()> {
        self.rollbacks += 1;
        Ok(())
    }
}
