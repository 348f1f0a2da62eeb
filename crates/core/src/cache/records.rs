//! Record read/write operations on the durable store.
//!
//! Both operations are failure-tolerant by contract: a missing row,
//! malformed JSON, or any storage error reads as absent, and a failed
//! write is logged and swallowed. The durable store must never block
//! the memory or network path.

use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

use super::connection::DurableStore;
use super::record::CacheRecord;
use crate::Error;

impl DurableStore {
    /// Read the record stored under `key`.
    ///
    /// Returns `None` for a missing key, an unparseable row, or any
    /// storage error. Faults are logged at `warn` and never surfaced.
    pub async fn read(&self, key: &str) -> Option<CacheRecord> {
        match self.try_read(key).await {
            Ok(record) => record,
            Err(err) => {
                tracing::warn!(key, error = %err, "durable read failed, treating as absent");
                None
            }
        }
    }

    /// Persist `record` under `key`, replacing any previous record.
    ///
    /// A failed write (e.g. out of disk) is logged and swallowed; it
    /// must not prevent the caller's current result from succeeding.
    pub async fn write(&self, key: &str, record: &CacheRecord) {
        if let Err(err) = self.try_write(key, record).await {
            tracing::warn!(key, error = %err, "durable write failed, continuing without persistence");
        }
    }

    async fn try_read(&self, key: &str) -> Result<Option<CacheRecord>, Error> {
        let key = key.to_owned();
        let raw = self
            .conn
            .call(move |conn| -> Result<Option<String>, Error> {
                let result = conn.query_row("SELECT record FROM records WHERE key = ?1", params![key], |row| {
                    row.get::<_, String>(0)
                });

                match result {
                    Ok(raw) => Ok(Some(raw)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)?;

        match raw {
            Some(raw) => {
                let record = serde_json::from_str(&raw).map_err(|e| Error::Store(format!("malformed record: {e}")))?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    async fn try_write(&self, key: &str, record: &CacheRecord) -> Result<(), Error> {
        let key = key.to_owned();
        let raw = serde_json::to_string(record).map_err(|e| Error::Store(format!("unserializable record: {e}")))?;

        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO records (key, record) VALUES (?1, ?2)
                     ON CONFLICT(key) DO UPDATE SET record = excluded.record",
                    params![key, raw],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }
}
