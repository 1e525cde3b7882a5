use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::{Connection, Row, params};
use tracing::{error, warn};
use uuid::Uuid;

use super::models::{
    AlertChannel, ChannelConfig, CheckResult, Incident, Monitor, MonitorConfig, NewCheckResult, Owner, from_millis,
    to_millis,
};
use crate::monitoring::transition::IncidentAction;
use crate::monitoring::types::CheckStatus;
use crate::pool::{LibsqlManager, LibsqlPool};

/// What happened to the incident table while recording a check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IncidentChange {
    Unchanged,
    Opened(Incident),
    /// An open incident already existed; no second one was created
    AlreadyOpen(Incident),
    Resolved(Incident),
    /// A resolve was requested but no incident was open
    NothingToResolve,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCheck {
    pub result: CheckResult,
    pub incident: IncidentChange,
}

/// Non-paused monitors, plus the number of rows that could not be read
#[derive(Debug, Clone, Default)]
pub struct ActiveMonitors {
    pub monitors: Vec<Monitor>,
    pub unreadable: usize,
}

/// Database trait for abstracting database operations
///
/// The engine treats persistence as a synchronous data store with last
/// write wins semantics. `record_check` and `record_ping` are the only
/// multi-row writes and run inside one transaction.
#[async_trait]
pub trait Database: Send + Sync {
    /// Get a monitor by id
    async fn get_monitor(&self, id: Uuid) -> Result<Option<Monitor>>;

    /// Get all monitors that are not paused; unreadable rows are counted, not returned
    async fn get_active_monitors(&self) -> Result<ActiveMonitors>;

    /// Insert or update a monitor
    async fn save_monitor(&self, monitor: &Monitor) -> Result<()>;

    /// Flip the paused flag and return the updated monitor
    async fn set_paused(&self, id: Uuid, paused: bool) -> Result<Option<Monitor>>;

    /// Delete a monitor; results, incidents and channels cascade
    async fn delete_monitor(&self, id: Uuid) -> Result<bool>;

    /// Most recent check result of a monitor
    async fn latest_check_result(&self, monitor_id: Uuid) -> Result<Option<CheckResult>>;

    /// Recent results, newest first
    async fn get_recent_results(&self, monitor_id: Uuid, limit: usize) -> Result<Vec<CheckResult>>;

    /// Append a check result and apply the incident action atomically
    async fn record_check(&self, result: &NewCheckResult, action: &IncidentAction) -> Result<RecordedCheck>;

    /// Heartbeat: set `last_ping_at`, append an UP result, resolve any open incident
    async fn record_ping(&self, monitor_id: Uuid, at: DateTime<Utc>) -> Result<RecordedCheck>;

    /// The open incident of a monitor, if any
    async fn get_open_incident(&self, monitor_id: Uuid) -> Result<Option<Incident>>;

    /// All incidents of a monitor, newest first
    async fn get_incidents(&self, monitor_id: Uuid) -> Result<Vec<Incident>>;

    /// Active alert channels of a monitor
    async fn get_active_alert_channels(&self, monitor_id: Uuid) -> Result<Vec<AlertChannel>>;

    /// Attach an alert channel to a monitor
    async fn save_alert_channel(&self, monitor_id: Uuid, config: &ChannelConfig, is_active: bool)
    -> Result<AlertChannel>;

    /// Get a monitor owner
    async fn get_owner(&self, id: Uuid) -> Result<Option<Owner>>;

    /// Insert or update a monitor owner
    async fn save_owner(&self, owner: &Owner) -> Result<()>;
}

/// LibSQL database implementation
pub struct DatabaseImpl {
    pool: LibsqlPool,
}

const MONITOR_COLUMNS: &str = "id, owner_id, name, config, interval_minutes, grace_period_minutes, is_paused, \
                               last_ping_at, created_at, updated_at";
const RESULT_COLUMNS: &str = "id, monitor_id, status, response_time_ms, http_status_code, error_message, checked_at";
const INCIDENT_COLUMNS: &str = "id, monitor_id, started_at, resolved_at, error_message";

impl DatabaseImpl {
    /// Create a new database instance from a pool
    pub fn new_from_pool(pool: LibsqlPool) -> Self {
        Self { pool }
    }

    /// Get a connection from the pool
    pub(crate) async fn get_conn(&self) -> Result<deadpool::managed::Object<LibsqlManager>> {
        self.pool.get().await.map_err(|e| anyhow!("Failed to get database connection: {e}"))
    }
}

fn parse_uuid(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).with_context(|| format!("invalid uuid in database: {raw}"))
}

/// Zero and negative minute columns mean "use the default"
fn positive_minutes(raw: Option<i64>) -> Option<u32> {
    raw.and_then(|v| u32::try_from(v).ok()).filter(|v| *v > 0)
}

fn monitor_from_row(row: &Row) -> Result<Monitor> {
    let id: String = row.get(0)?;
    let owner_id: String = row.get(1)?;
    let config: String = row.get(3)?;
    let config: MonitorConfig =
        serde_json::from_str(&config).with_context(|| format!("invalid config for monitor {id}"))?;

    Ok(Monitor {
        id: parse_uuid(&id)?,
        owner_id: parse_uuid(&owner_id)?,
        name: row.get(2)?,
        config,
        interval_minutes: positive_minutes(row.get(4)?),
        grace_period_minutes: positive_minutes(row.get(5)?),
        is_paused: row.get::<i64>(6)? != 0,
        last_ping_at: row.get::<Option<i64>>(7)?.map(from_millis),
        created_at: from_millis(row.get(8)?),
        updated_at: from_millis(row.get(9)?),
    })
}

fn result_from_row(row: &Row) -> Result<CheckResult> {
    let monitor_id: String = row.get(1)?;
    let status: String = row.get(2)?;

    Ok(CheckResult {
        id: row.get(0)?,
        monitor_id: parse_uuid(&monitor_id)?,
        status: CheckStatus::parse(&status).ok_or_else(|| anyhow!("unknown check status: {status}"))?,
        response_time_ms: row.get::<Option<i64>>(3)?.map(|v| v as u64),
        http_status_code: row.get::<Option<i64>>(4)?.map(|v| v as u16),
        error_message: row.get(5)?,
        checked_at: from_millis(row.get(6)?),
    })
}

fn incident_from_row(row: &Row) -> Result<Incident> {
    let monitor_id: String = row.get(1)?;

    Ok(Incident {
        id: row.get(0)?,
        monitor_id: parse_uuid(&monitor_id)?,
        started_at: from_millis(row.get(2)?),
        resolved_at: row.get::<Option<i64>>(3)?.map(from_millis),
        error_message: row.get(4)?,
    })
}

async fn insert_result(conn: &Connection, result: &NewCheckResult) -> Result<CheckResult> {
    conn.execute(
        "INSERT INTO check_results (monitor_id, status, response_time_ms, http_status_code, error_message, \
         checked_at) VALUES (?, ?, ?, ?, ?, ?)",
        params![
            result.monitor_id.to_string(),
            result.status.as_str(),
            result.response_time_ms.map(|v| v as i64),
            result.http_status_code.map(i64::from),
            result.error_message.clone(),
            to_millis(result.checked_at)
        ],
    )
    .await?;

    Ok(CheckResult {
        id: conn.last_insert_rowid(),
        monitor_id: result.monitor_id,
        status: result.status,
        response_time_ms: result.response_time_ms,
        http_status_code: result.http_status_code,
        error_message: result.error_message.clone(),
        checked_at: result.checked_at,
    })
}

async fn open_incident_on(conn: &Connection, monitor_id: Uuid) -> Result<Option<Incident>> {
    let mut rows = conn
        .query(
            &format!(
                "SELECT {INCIDENT_COLUMNS} FROM incidents WHERE monitor_id = ? AND resolved_at IS NULL \
                 ORDER BY started_at DESC LIMIT 1"
            ),
            params![monitor_id.to_string()],
        )
        .await?;

    match rows.next().await? {
        Some(row) => Ok(Some(incident_from_row(&row)?)),
        None => Ok(None),
    }
}

async fn open_incident(
    conn: &Connection,
    monitor_id: Uuid,
    started_at: DateTime<Utc>,
    error_message: Option<String>,
) -> Result<IncidentChange> {
    if let Some(existing) = open_incident_on(conn, monitor_id).await? {
        return Ok(IncidentChange::AlreadyOpen(existing));
    }

    conn.execute(
        "INSERT INTO incidents (monitor_id, started_at, error_message) VALUES (?, ?, ?)",
        params![monitor_id.to_string(), to_millis(started_at), error_message.clone()],
    )
    .await?;

    Ok(IncidentChange::Opened(Incident {
        id: conn.last_insert_rowid(),
        monitor_id,
        started_at,
        resolved_at: None,
        error_message,
    }))
}

async fn resolve_incident(conn: &Connection, monitor_id: Uuid, resolved_at: DateTime<Utc>) -> Result<IncidentChange> {
    let Some(mut incident) = open_incident_on(conn, monitor_id).await? else {
        return Ok(IncidentChange::NothingToResolve);
    };

    conn.execute("UPDATE incidents SET resolved_at = ? WHERE id = ?", params![to_millis(resolved_at), incident.id])
        .await?;

    incident.resolved_at = Some(resolved_at);
    Ok(IncidentChange::Resolved(incident))
}

#[async_trait]
impl Database for DatabaseImpl {
    async fn get_monitor(&self, id: Uuid) -> Result<Option<Monitor>> {
        let conn = self.get_conn().await?;
        let mut rows =
            conn.query(&format!("SELECT {MONITOR_COLUMNS} FROM monitors WHERE id = ?"), params![id.to_string()]).await?;

        match rows.next().await? {
            Some(row) => Ok(Some(monitor_from_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn get_active_monitors(&self) -> Result<ActiveMonitors> {
        let conn = self.get_conn().await?;
        let mut rows = conn
            .query(&format!("SELECT {MONITOR_COLUMNS} FROM monitors WHERE is_paused = 0 ORDER BY created_at"), ())
            .await?;

        let mut active = ActiveMonitors::default();
        while let Some(row) = rows.next().await? {
            match monitor_from_row(&row) {
                Ok(monitor) => active.monitors.push(monitor),
                Err(e) => {
                    // One corrupt row must not hide the others.
                    error!("Skipping unreadable monitor row: {:#}", e);
                    active.unreadable += 1;
                }
            }
        }
        Ok(active)
    }

    async fn save_monitor(&self, monitor: &Monitor) -> Result<()> {
        let conn = self.get_conn().await?;
        let config = serde_json::to_string(&monitor.config)?;

        conn.execute(
            "INSERT INTO monitors (id, owner_id, name, type, config, interval_minutes, grace_period_minutes, \
             is_paused, last_ping_at, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
             ON CONFLICT(id) DO UPDATE SET owner_id = excluded.owner_id, name = excluded.name, \
             type = excluded.type, config = excluded.config, interval_minutes = excluded.interval_minutes, \
             grace_period_minutes = excluded.grace_period_minutes, is_paused = excluded.is_paused, \
             last_ping_at = excluded.last_ping_at, updated_at = excluded.updated_at",
            params![
                monitor.id.to_string(),
                monitor.owner_id.to_string(),
                monitor.name.clone(),
                monitor.monitor_type().as_str(),
                config,
                monitor.interval_minutes.map(i64::from),
                monitor.grace_period_minutes.map(i64::from),
                if monitor.is_paused { 1 } else { 0 },
                monitor.last_ping_at.map(to_millis),
                to_millis(monitor.created_at),
                to_millis(monitor.updated_at)
            ],
        )
        .await?;

        Ok(())
    }

    async fn set_paused(&self, id: Uuid, paused: bool) -> Result<Option<Monitor>> {
        {
            let conn = self.get_conn().await?;
            let updated = conn
                .execute(
                    "UPDATE monitors SET is_paused = ?, updated_at = ? WHERE id = ?",
                    params![if paused { 1 } else { 0 }, to_millis(Utc::now()), id.to_string()],
                )
                .await?;
            if updated == 0 {
                return Ok(None);
            }
        }
        self.get_monitor(id).await
    }

    async fn delete_monitor(&self, id: Uuid) -> Result<bool> {
        let conn = self.get_conn().await?;

        // Related rows are removed via ON DELETE CASCADE
        let deleted = conn.execute("DELETE FROM monitors WHERE id = ?", params![id.to_string()]).await?;
        Ok(deleted > 0)
    }

    async fn latest_check_result(&self, monitor_id: Uuid) -> Result<Option<CheckResult>> {
        Ok(self.get_recent_results(monitor_id, 1).await?.into_iter().next())
    }

    async fn get_recent_results(&self, monitor_id: Uuid, limit: usize) -> Result<Vec<CheckResult>> {
        let conn = self.get_conn().await?;
        let mut rows = conn
            .query(
                &format!(
                    "SELECT {RESULT_COLUMNS} FROM check_results WHERE monitor_id = ? \
                     ORDER BY checked_at DESC, id DESC LIMIT ?"
                ),
                params![monitor_id.to_string(), limit as i64],
            )
            .await?;

        let mut results = Vec::new();
        while let Some(row) = rows.next().await? {
            results.push(result_from_row(&row)?);
        }
        Ok(results)
    }

    async fn record_check(&self, result: &NewCheckResult, action: &IncidentAction) -> Result<RecordedCheck> {
        let conn = self.get_conn().await?;
        let tx = conn.transaction().await?;

        let stored = insert_result(&tx, result).await?;
        let incident = match action {
            IncidentAction::None => IncidentChange::Unchanged,
            IncidentAction::Open { error_message } => {
                open_incident(&tx, result.monitor_id, result.checked_at, error_message.clone()).await?
            }
            IncidentAction::Resolve => resolve_incident(&tx, result.monitor_id, result.checked_at).await?,
        };

        tx.commit().await?;
        Ok(RecordedCheck { result: stored, incident })
    }

    async fn record_ping(&self, monitor_id: Uuid, at: DateTime<Utc>) -> Result<RecordedCheck> {
        let conn = self.get_conn().await?;
        let tx = conn.transaction().await?;

        tx.execute(
            "UPDATE monitors SET last_ping_at = ?, updated_at = ? WHERE id = ?",
            params![to_millis(at), to_millis(at), monitor_id.to_string()],
        )
        .await?;
        let stored = insert_result(&tx, &NewCheckResult::up(monitor_id, at)).await?;
        let incident = resolve_incident(&tx, monitor_id, at).await?;

        tx.commit().await?;
        Ok(RecordedCheck { result: stored, incident })
    }

    async fn get_open_incident(&self, monitor_id: Uuid) -> Result<Option<Incident>> {
        let conn = self.get_conn().await?;
        open_incident_on(&conn, monitor_id).await
    }

    async fn get_incidents(&self, monitor_id: Uuid) -> Result<Vec<Incident>> {
        let conn = self.get_conn().await?;
        let mut rows = conn
            .query(
                &format!(
                    "SELECT {INCIDENT_COLUMNS} FROM incidents WHERE monitor_id = ? \
                     ORDER BY started_at DESC, id DESC"
                ),
                params![monitor_id.to_string()],
            )
            .await?;

        let mut incidents = Vec::new();
        while let Some(row) = rows.next().await? {
            incidents.push(incident_from_row(&row)?);
        }
        Ok(incidents)
    }

    async fn get_active_alert_channels(&self, monitor_id: Uuid) -> Result<Vec<AlertChannel>> {
        let conn = self.get_conn().await?;
        let mut rows = conn
            .query(
                "SELECT id, monitor_id, config, is_active FROM alert_channels \
                 WHERE monitor_id = ? AND is_active = 1 ORDER BY id",
                params![monitor_id.to_string()],
            )
            .await?;

        let mut channels = Vec::new();
        while let Some(row) = rows.next().await? {
            let id: i64 = row.get(0)?;
            let monitor_id: String = row.get(1)?;
            let config: String = row.get(2)?;
            let config: ChannelConfig = match serde_json::from_str(&config) {
                Ok(config) => config,
                Err(e) => {
                    // One malformed channel must not hide the others.
                    warn!("Skipping alert channel {} with invalid config: {}", id, e);
                    continue;
                }
            };

            channels.push(AlertChannel {
                id,
                monitor_id: parse_uuid(&monitor_id)?,
                config,
                is_active: row.get::<i64>(3)? != 0,
            });
        }
        Ok(channels)
    }

    async fn save_alert_channel(
        &self,
        monitor_id: Uuid,
        config: &ChannelConfig,
        is_active: bool,
    ) -> Result<AlertChannel> {
        let conn = self.get_conn().await?;
        conn.execute(
            "INSERT INTO alert_channels (monitor_id, type, config, is_active) VALUES (?, ?, ?, ?)",
            params![
                monitor_id.to_string(),
                config.channel_type().to_string(),
                serde_json::to_string(config)?,
                if is_active { 1 } else { 0 }
            ],
        )
        .await?;

        Ok(AlertChannel { id: conn.last_insert_rowid(), monitor_id, config: config.clone(), is_active })
    }

    async fn get_owner(&self, id: Uuid) -> Result<Option<Owner>> {
        let conn = self.get_conn().await?;
        let mut rows =
            conn.query("SELECT id, telegram_chat_id FROM owners WHERE id = ?", params![id.to_string()]).await?;

        match rows.next().await? {
            Some(row) => {
                let id: String = row.get(0)?;
                Ok(Some(Owner { id: parse_uuid(&id)?, telegram_chat_id: row.get(1)? }))
            }
            None => Ok(None),
        }
    }

    async fn save_owner(&self, owner: &Owner) -> Result<()> {
        let conn = self.get_conn().await?;
        conn.execute(
            "INSERT INTO owners (id, telegram_chat_id) VALUES (?, ?) \
             ON CONFLICT(id) DO UPDATE SET telegram_chat_id = excluded.telegram_chat_id",
            params![owner.id.to_string(), owner.telegram_chat_id.clone()],
        )
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{ChannelType, CronConfig, HttpProbeConfig};
    use crate::test_support::{create_test_database, execute_raw};

    fn http_monitor() -> Monitor {
        let mut config = HttpProbeConfig::new("https://example.com/health");
        config.expected_keyword = Some("ok".into());
        Monitor::new(Uuid::new_v4(), "api", MonitorConfig::Http(config))
    }

    /// Run raw SQL bound to one monitor id, bypassing the typed writers
    #[tokio::test]
    async fn test_monitor_upsert_and_read_back() {
        let (_dir, db) = create_test_database().await.unwrap();
        let mut monitor = http_monitor();
        db.save_monitor(&monitor).await.unwrap();

        monitor.name = "renamed".into();
        monitor.interval_minutes = Some(10);
        db.save_monitor(&monitor).await.unwrap();

        let stored = db.get_monitor(monitor.id).await.unwrap().unwrap();
        assert_eq!(stored.name, "renamed");
        assert_eq!(stored.interval_minutes, Some(10));
        assert_eq!(stored.config, monitor.config);
        assert_eq!(stored.created_at.timestamp_millis(), monitor.created_at.timestamp_millis());
        assert!(db.get_monitor(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_non_positive_minutes_read_as_unset() {
        let (_dir, db) = create_test_database().await.unwrap();
        let monitor = http_monitor();
        db.save_monitor(&monitor).await.unwrap();

        let sql = "UPDATE monitors SET interval_minutes = 0, grace_period_minutes = -1 WHERE id = ?";
        execute_raw(&db, sql, monitor.id).await.unwrap();

        let stored = db.get_monitor(monitor.id).await.unwrap().unwrap();
        assert_eq!(stored.interval_minutes, None);
        assert_eq!(stored.grace_period_minutes, None);
        assert_eq!(stored.interval_or(5), 5);
        assert_eq!(stored.grace_period_or(5), 5);
    }

    #[tokio::test]
    async fn test_active_monitors_exclude_paused() {
        let (_dir, db) = create_test_database().await.unwrap();
        let active = http_monitor();
        let mut paused = http_monitor();
        paused.is_paused = true;
        db.save_monitor(&active).await.unwrap();
        db.save_monitor(&paused).await.unwrap();

        let listed = db.get_active_monitors().await.unwrap();
        assert_eq!(listed.monitors.len(), 1);
        assert_eq!(listed.monitors[0].id, active.id);
        assert_eq!(listed.unreadable, 0);

        let resumed = db.set_paused(paused.id, false).await.unwrap().unwrap();
        assert!(!resumed.is_paused);
        assert!(db.set_paused(Uuid::new_v4(), true).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_corrupt_monitor_row_is_skipped() {
        let (_dir, db) = create_test_database().await.unwrap();
        let healthy = http_monitor();
        let corrupt = http_monitor();
        db.save_monitor(&healthy).await.unwrap();
        db.save_monitor(&corrupt).await.unwrap();

        execute_raw(&db, r#"UPDATE monitors SET config = '{"type":"http"}' WHERE id = ?"#, corrupt.id).await.unwrap();

        let listed = db.get_active_monitors().await.unwrap();
        assert_eq!(listed.monitors.len(), 1);
        assert_eq!(listed.monitors[0].id, healthy.id);
        assert_eq!(listed.unreadable, 1);
    }

    #[tokio::test]
    async fn test_latest_result_is_most_recent() {
        let (_dir, db) = create_test_database().await.unwrap();
        let monitor = http_monitor();
        db.save_monitor(&monitor).await.unwrap();

        let t0 = Utc::now();
        let later = t0 + chrono::Duration::seconds(30);
        db.record_check(&NewCheckResult::up(monitor.id, t0), &IncidentAction::None).await.unwrap();
        db.record_check(&NewCheckResult::down(monitor.id, "boom", later), &IncidentAction::None).await.unwrap();

        let latest = db.latest_check_result(monitor.id).await.unwrap().unwrap();
        assert_eq!(latest.status, CheckStatus::Down);
        assert_eq!(latest.error_message.as_deref(), Some("boom"));
        assert_eq!(db.get_recent_results(monitor.id, 10).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_resolve_without_open_incident() {
        let (_dir, db) = create_test_database().await.unwrap();
        let monitor = http_monitor();
        db.save_monitor(&monitor).await.unwrap();

        let recorded =
            db.record_check(&NewCheckResult::up(monitor.id, Utc::now()), &IncidentAction::Resolve).await.unwrap();
        assert_eq!(recorded.incident, IncidentChange::NothingToResolve);
        assert_eq!(recorded.result.status, CheckStatus::Up);
    }

    #[tokio::test]
    async fn test_ping_updates_monitor_and_resolves() {
        let (_dir, db) = create_test_database().await.unwrap();
        let monitor = Monitor::new(Uuid::new_v4(), "cron", MonitorConfig::Cron(CronConfig::default()));
        db.save_monitor(&monitor).await.unwrap();
        db.record_check(
            &NewCheckResult::down(monitor.id, "Never received initial ping", Utc::now()),
            &IncidentAction::Open { error_message: Some("Never received initial ping".into()) },
        )
        .await
        .unwrap();

        let at = Utc::now();
        let recorded = db.record_ping(monitor.id, at).await.unwrap();
        let IncidentChange::Resolved(incident) = recorded.incident else {
            panic!("ping should resolve the open incident");
        };
        assert_eq!(incident.error_message.as_deref(), Some("Never received initial ping"));

        let stored = db.get_monitor(monitor.id).await.unwrap().unwrap();
        assert_eq!(stored.last_ping_at.map(|t| t.timestamp_millis()), Some(at.timestamp_millis()));
        assert!(db.get_open_incident(monitor.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_cascades() {
        let (_dir, db) = create_test_database().await.unwrap();
        let monitor = http_monitor();
        db.save_monitor(&monitor).await.unwrap();
        let down = NewCheckResult::down(monitor.id, "boom", Utc::now());
        db.record_check(&down, &IncidentAction::Open { error_message: None }).await.unwrap();
        db.save_alert_channel(monitor.id, &ChannelConfig::Email { address: "ops@example.com".into() }, true)
            .await
            .unwrap();

        assert!(db.delete_monitor(monitor.id).await.unwrap());
        assert!(!db.delete_monitor(monitor.id).await.unwrap());
        assert!(db.get_recent_results(monitor.id, 10).await.unwrap().is_empty());
        assert!(db.get_incidents(monitor.id).await.unwrap().is_empty());
        assert!(db.get_active_alert_channels(monitor.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_channel_is_skipped() {
        let (_dir, db) = create_test_database().await.unwrap();
        let monitor = http_monitor();
        db.save_monitor(&monitor).await.unwrap();
        db.save_alert_channel(monitor.id, &ChannelConfig::Slack { webhook_url: "https://hooks".into() }, true)
            .await
            .unwrap();

        execute_raw(
            &db,
            "INSERT INTO alert_channels (monitor_id, type, config, is_active) \
             VALUES (?, 'pager', '{\"type\":\"pager\"}', 1)",
            monitor.id,
        )
        .await
        .unwrap();

        let channels = db.get_active_alert_channels(monitor.id).await.unwrap();
        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].channel_type(), ChannelType::Slack);
    }
}
