//! PostgreSQL connection implementation

use async_trait::async_trait;
use pgprof_core::{
    ColumnMeta, Connection, PgprofError, Result, ResultSet, Row, StatementResult, Value,
};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use tokio_postgres::config::Host;
use tokio_postgres::error::SqlState;
use tokio_postgres::tls::MakeTlsConnect;
use tokio_postgres::{Client, Config, NoTls, Row as PgRow, Socket};

use crate::tls::{TlsOptions, build_tls_connector, requires_tls};

fn format_postgres_error(error: &tokio_postgres::Error) -> String {
    let Some(db_error) = error.as_db_error() else {
        return error.to_string();
    };

    let mut message = db_error.message().to_string();

    if let Some(detail) = db_error.detail()
        && !detail.trim().is_empty()
    {
        message.push_str(&format!(" (detail: {})", detail));
    }

    if let Some(hint) = db_error.hint()
        && !hint.trim().is_empty()
    {
        message.push_str(&format!(" (hint: {})", hint));
    }

    format!("{} (code: {})", message, db_error.code().code())
}

/// Maps a driver failure onto the shared error taxonomy
fn classify_error(
    code: Option<&SqlState>,
    connection_closed: bool,
    message: String,
) -> PgprofError {
    if code == Some(&SqlState::QUERY_CANCELED) {
        PgprofError::Timeout(message)
    } else if connection_closed {
        PgprofError::Connection(message)
    } else {
        PgprofError::Query(message)
    }
}

fn map_postgres_error(error: &tokio_postgres::Error) -> PgprofError {
    classify_error(error.code(), error.is_closed(), format_postgres_error(error))
}

/// Host, port, database and user of a config, without credentials
pub fn describe_config(config: &Config) -> String {
    let host = match config.get_hosts().first() {
        Some(Host::Tcp(host)) => host.clone(),
        #[cfg(unix)]
        Some(Host::Unix(path)) => path.display().to_string(),
        None => "localhost".to_string(),
    };
    let port = config.get_ports().first().copied().unwrap_or(5432);
    let user = config.get_user().unwrap_or("<default>");
    let dbname = config.get_dbname().unwrap_or(user);

    format!("{}@{}:{}/{}", user, host, port, dbname)
}

/// PostgreSQL connection wrapper
pub struct PostgresConnection {
    client: Mutex<Client>,
    closed: AtomicBool,
}

impl PostgresConnection {
    /// Connect using a libpq-style DSN (`host=... user=...` or `postgresql://...`)
    pub async fn connect(dsn: &str) -> Result<Self> {
        Self::connect_with_tls(dsn, &TlsOptions::default()).await
    }

    pub async fn connect_with_tls(dsn: &str, tls: &TlsOptions) -> Result<Self> {
        let config: Config = dsn
            .parse()
            .map_err(|e| PgprofError::Configuration(format!("Invalid DSN: {}", e)))?;
        let server = describe_config(&config);
        let use_tls = requires_tls(&config);

        tracing::info!(server = %server, tls = use_tls, "connecting to PostgreSQL database");

        let client = if use_tls {
            establish(&config, build_tls_connector(tls)?).await?
        } else {
            establish(&config, NoTls).await?
        };

        tracing::info!(server = %server, "PostgreSQL connection established");
        Ok(Self {
            client: Mutex::new(client),
            closed: AtomicBool::new(false),
        })
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(PgprofError::Connection("connection is closed".into()));
        }
        Ok(())
    }
}

/// Opens the session and spawns its connection task on the current runtime
async fn establish<T>(config: &Config, tls: T) -> Result<Client>
where
    T: MakeTlsConnect<Socket>,
    T::Stream: Send + 'static,
{
    let (client, connection) = config.connect(tls).await.map_err(|e| {
        PgprofError::Connection(format!(
            "Failed to connect to PostgreSQL: {}",
            format_postgres_error(&e)
        ))
    })?;

    tokio::spawn(async move {
        if let Err(e) = connection.await {
            tracing::error!(error = %e, "PostgreSQL connection error");
        }
    });

    Ok(client)
}

#[async_trait]
impl Connection for PostgresConnection {
    #[tracing::instrument(skip(self, sql), fields(sql_preview = %sql.chars().take(100).collect::<String>()))]
    async fn execute(&self, sql: &str) -> Result<StatementResult> {
        self.ensure_open()?;
        let client = self.client.lock().await;

        let affected_rows = client
            .execute(sql, &[])
            .await
            .map_err(|e| map_postgres_error(&e))?;

        tracing::debug!(affected_rows, "statement executed");
        Ok(StatementResult { affected_rows })
    }

    #[tracing::instrument(skip(self, sql), fields(sql_preview = %sql.chars().take(100).collect::<String>()))]
    async fn query(&self, sql: &str) -> Result<ResultSet> {
        self.ensure_open()?;
        let client = self.client.lock().await;

        let statement = client
            .prepare(sql)
            .await
            .map_err(|e| map_postgres_error(&e))?;
        let pg_rows = client
            .query(&statement, &[])
            .await
            .map_err(|e| map_postgres_error(&e))?;

        let columns: Vec<ColumnMeta> = statement
            .columns()
            .iter()
            .map(|col| ColumnMeta::new(col.name(), col.type_().name()))
            .collect();

        let rows: Vec<Row> = pg_rows
            .iter()
            .map(|pg_row| {
                let values = (0..columns.len())
                    .map(|idx| postgres_to_value(pg_row, idx))
                    .collect();
                Row::new(values)
            })
            .collect();

        tracing::debug!(row_count = rows.len(), "query executed");
        Ok(ResultSet::new(columns, rows))
    }

    async fn close(&self) -> Result<()> {
        tracing::info!("closing PostgreSQL connection");
        self.closed.store(true, Ordering::Release);
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
            || self
                .client
                .try_lock()
                .is_ok_and(|client| client.is_closed())
    }
}

fn postgres_to_value(row: &PgRow, idx: usize) -> Value {
    let type_name = row.columns()[idx].type_().name();

    match type_name {
        "json" | "jsonb" => row
            .try_get::<_, Option<serde_json::Value>>(idx)
            .ok()
            .flatten()
            .map(Value::Json)
            .unwrap_or(Value::Null),
        "bool" => row
            .try_get::<_, Option<bool>>(idx)
            .ok()
            .flatten()
            .map(Value::Bool)
            .unwrap_or(Value::Null),
        "int2" => row
            .try_get::<_, Option<i16>>(idx)
            .ok()
            .flatten()
            .map(|v| Value::Int64(v.into()))
            .unwrap_or(Value::Null),
        "int4" => row
            .try_get::<_, Option<i32>>(idx)
            .ok()
            .flatten()
            .map(|v| Value::Int64(v.into()))
            .unwrap_or(Value::Null),
        "int8" => row
            .try_get::<_, Option<i64>>(idx)
            .ok()
            .flatten()
            .map(Value::Int64)
            .unwrap_or(Value::Null),
        "float4" => row
            .try_get::<_, Option<f32>>(idx)
            .ok()
            .flatten()
            .map(|v| Value::Float64(v.into()))
            .unwrap_or(Value::Null),
        "float8" => row
            .try_get::<_, Option<f64>>(idx)
            .ok()
            .flatten()
            .map(Value::Float64)
            .unwrap_or(Value::Null),
        // EXPLAIN in text or YAML format, and every other text-like column
        _ => row
            .try_get::<_, Option<String>>(idx)
            .ok()
            .flatten()
            .map(Value::String)
            .unwrap_or(Value::Null),
    }
}
