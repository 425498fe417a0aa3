use crate::error::ConnectorError;
use engine_config::{connection::ConnectionConfig, settings::ReplicationSettings};
use native_tls::TlsConnector;
use postgres_native_tls::MakeTlsConnector;
use tokio_postgres::{Client, Config, NoTls, config::SslMode};
use tracing::error;

const APPLICATION_NAME: &str = "dbmirror";
const SESSION_DATESTYLE: &str = "ISO";
const SESSION_CLIENT_ENCODING: &str = "UTF8";

/// Builds the driver config for one endpoint, including the session options
/// every replication connection runs with.
pub fn build_config(conn: &ConnectionConfig, settings: &ReplicationSettings) -> Config {
    let mut config = Config::new();
    config
        .host(&conn.host)
        .port(conn.port)
        .dbname(&conn.database)
        .user(&conn.user)
        .password(conn.password())
        .application_name(APPLICATION_NAME)
        .connect_timeout(settings.connect_timeout())
        .options(&session_options(settings))
        .ssl_mode(if conn.require_tls {
            SslMode::Require
        } else {
            SslMode::Disable
        });
    config
}

pub(crate) fn session_options(settings: &ReplicationSettings) -> String {
    format!(
        "-c datestyle={SESSION_DATESTYLE} -c client_encoding={SESSION_CLIENT_ENCODING} -c search_path={} -c statement_timeout={}",
        settings.schema.replace(' ', "\\ "),
        settings.statement_timeout().as_millis()
    )
}

pub async fn connect_client(config: Config) -> Result<Client, ConnectorError> {
    match config.get_ssl_mode() {
        SslMode::Disable => connect_without_tls(config).await,
        _ => connect_with_tls(config).await,
    }
}

pub(crate) async fn connect_with_tls(config: Config) -> Result<Client, ConnectorError> {
    let connector = TlsConnector::builder().build()?;
    let tls = MakeTlsConnector::new(connector);
    let (client, connection) = config.connect(tls).await?;
    tokio::spawn(async move {
        if let Err(err) = connection.await {
            error!(%err, "Postgres connection error");
        }
    });
    Ok(client)
}

pub(crate) async fn connect_without_tls(config: Config) -> Result<Client, ConnectorError> {
    let (client, connection) = config.connect(NoTls).await?;
    tokio::spawn(async move {
        if let Err(err) = connection.await {
            error!(%err, "Postgres connection error");
        }
    });
    Ok(client)
}

/// Escapes a value for use inside a single-quoted SQL literal.
pub(crate) fn quote_literal(value: &str) -> String {
    value.replace('\'', "''")
}
