use std::time::Duration;

use diesel::prelude::*;
use diesel::query_dsl::methods::ExecuteDsl;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::Error as DieselError;
use diesel::sqlite::SqliteConnection;
use tracing::warn;

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;

/// Maximum number of attempts for a single statement before giving up
const MAX_ATTEMPTS: u32 = 5;

/// Initial backoff between attempts; doubles after each locked failure
const BASE_DELAY: Duration = Duration::from_millis(25);

pub fn init_pool(database_url: &str) -> DbPool {
    let manager = ConnectionManager::<SqliteConnection>::new(database_url);
    Pool::builder().build(manager).expect("Failed to create pool.")
}

/// Retries a write statement when SQLite reports the database as locked
///
/// SQLite allows a single writer at a time. Under a pooled server several
/// connections can race for the write lock, and the loser fails with
/// "database is locked". Writes in the repository layer go through this
/// trait so those failures are retried with exponential backoff instead of
/// surfacing to the client.
pub trait ExecuteWithRetry: Sized {
    fn execute_with_retry(
        self,
        conn: &mut SqliteConnection,
    ) -> impl Future<Output = QueryResult<usize>>;
}

impl<T> ExecuteWithRetry for T
where
    T: ExecuteDsl<SqliteConnection> + Clone,
{
    async fn execute_with_retry(self, conn: &mut SqliteConnection) -> QueryResult<usize> {
        let mut delay = BASE_DELAY;

        for attempt in 1..=MAX_ATTEMPTS {
            match ExecuteDsl::execute(self.clone(), conn) {
                Err(err) if attempt < MAX_ATTEMPTS && is_locked(&err) => {
                    warn!("Database locked (attempt {}), retrying in {:?}", attempt, delay);
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                }
                result => return result,
            }
        }

        unreachable!("loop returns on the final attempt")
    }
}

/// Whether a diesel error is SQLite's busy/locked condition
fn is_locked(err: &DieselError) -> bool {
    match err {
        DieselError::DatabaseError(_, info) => {
            let message = info.message();
            message.contains("database is locked") || message.contains("database table is locked")
        }
        _ => false,
    }
}
