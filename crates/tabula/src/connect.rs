use tabula_core::{err, Connection, Result};
use url::Url;

/// Opens a connection for `url`, picking the driver by scheme. Drivers are
/// compiled in through the `sqlite` and `postgresql` features.
pub async fn connect(url: &str) -> Result<Box<dyn Connection>> {
    let parsed = Url::parse(url).map_err(|e| err!("invalid database url; url={url}; {e}"))?;

    match parsed.scheme() {
        "postgres" | "postgresql" => connect_postgresql(url).await,
        "sqlite" => connect_sqlite(url),
        scheme => Err(err!("unsupported database; scheme={scheme}; url={url}")),
    }
}

#[cfg(feature = "postgresql")]
async fn connect_postgresql(url: &str) -> Result<Box<dyn Connection>> {
    let conn = tabula_driver_postgresql::PostgreSQL::connect(url).await?;
    Ok(Box::new(conn))
}

#[cfg(not(feature = "postgresql"))]
async fn connect_postgresql(_url: &str) -> Result<Box<dyn Connection>> {
    Err(err!("`postgresql` feature not enabled"))
}

#[cfg(feature = "sqlite")]
fn connect_sqlite(url: &str) -> Result<Box<dyn Connection>> {
    let conn = tabula_driver_sqlite::Sqlite::connect(url)?;
    Ok(Box::new(conn))
}

#[cfg(not(feature = "sqlite"))]
fn connect_sqlite(_url: &str) -> Result<Box<dyn Connection>> {
    Err(err!("`sqlite` feature not enabled"))
}
