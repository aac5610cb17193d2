//! Commands that talk to the root server.
//!
//! Every command runs the connection handshake first; the session lives for
//! one invocation only.

use chrono::NaiveDate;
use serde_json::json;
use tracing::info;

use bmlt_session::{ChangeQuery, DeletedQuery};

use crate::cli::Cli;
use crate::config::ClientConfig;
use crate::driver::Driver;
use crate::error::{ClientError, ClientResult};
use crate::render;

/// Change filters collected from the command line.
#[derive(Debug, Default, Clone, Copy)]
pub struct ChangeFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub meeting: Option<i64>,
    pub service_body: Option<i64>,
}

impl ChangeFilter {
    fn to_query(self) -> ChangeQuery {
        let mut query = ChangeQuery::new().between(self.from, self.to);
        if let Some(id) = self.meeting {
            query = query.for_meeting(id);
        }
        if let Some(id) = self.service_body {
            query = query.for_service_body(id);
        }
        query
    }
}

async fn connected(cli: &Cli, config: &ClientConfig) -> ClientResult<Driver> {
    let session = config
        .session_config(cli.server.as_deref(), cli.timeout)
        .map_err(ClientError::Config)?;
    let mut driver = Driver::https(session)?;
    driver.connect().await?;
    info!(root = %driver.handler().config().root_uri(), "Connected");
    Ok(driver)
}

fn print_json(value: &serde_json::Value) -> ClientResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Runs the handshake and prints what the server offers.
pub async fn connect(cli: &Cli, config: &ClientConfig) -> ClientResult<()> {
    let driver = connected(cli, config).await?;
    let handler = driver.handler();
    let cache = handler.cache().ok_or(ClientError::NoResult("session"))?;
    let root = handler.config().root_uri();
    if cli.json {
        print_json(&render::server_json(root, cache))
    } else {
        println!("{}", render::server_summary(root, cache));
        Ok(())
    }
}

pub async fn search(cli: &Cli, config: &ClientConfig, criteria: &str) -> ClientResult<()> {
    let mut driver = connected(cli, config).await?;
    let output = driver.search(criteria).await?;
    if cli.json {
        return print_json(&json!({
            "meetings": render::meetings_json(&output.meetings),
            "formats": output.formats,
        }));
    }
    if !output.formats.is_empty() {
        println!("{}\n", render::formats(&output.formats));
    }
    println!("{}", render::meetings(&output.meetings));
    Ok(())
}

/// Change history. The admin user filter needs a login, so it is not
/// offered here.
pub async fn changes(cli: &Cli, config: &ClientConfig, filter: ChangeFilter) -> ClientResult<()> {
    let mut driver = connected(cli, config).await?;
    let changes = driver.changes(&filter.to_query()).await?;
    if cli.json {
        return print_json(&serde_json::to_value(&changes)?);
    }
    println!("{}", render::changes(&changes));
    Ok(())
}

pub async fn deleted(
    cli: &Cli,
    config: &ClientConfig,
    service_bodies: &[i64],
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> ClientResult<()> {
    let mut driver = connected(cli, config).await?;
    let query = DeletedQuery::new()
        .between(from, to)
        .in_service_bodies(service_bodies.iter().copied());
    let changes = driver.deleted(&query).await?;
    if cli.json {
        return print_json(&serde_json::to_value(&changes)?);
    }
    println!("{}", render::changes(&changes));
    Ok(())
}

/// Logs in, prints the service bodies with the granted permission levels,
/// and logs out again.
pub async fn login(
    cli: &Cli,
    config: &ClientConfig,
    user: Option<&str>,
    password: Option<&str>,
) -> ClientResult<()> {
    let user = user
        .or(config.admin.login.as_deref())
        .ok_or_else(|| ClientError::Config("no admin login; pass --user or set [admin] login".into()))?;
    let password = match password {
        Some(p) => p.to_string(),
        None => config.admin_password().map_err(ClientError::Config)?.ok_or_else(|| {
            ClientError::Config(
                "no admin password; set BMLT_ADMIN_PASSWORD or [admin] password".into(),
            )
        })?,
    };

    let mut driver = connected(cli, config).await?;
    driver.login(user, &password).await?;
    let handler = driver.handler();
    let cache = handler.cache().ok_or(ClientError::NoResult("session"))?;
    if cli.json {
        print_json(&json!({
            "login": user,
            "service_bodies": render::tree_json(&cache.hierarchy),
        }))?;
    } else {
        println!("Logged in as {}", user);
        print!("{}", render::service_body_tree(&cache.hierarchy, true));
    }
    driver.logout().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn change_filter_targets_meeting() {
        let filter = ChangeFilter {
            meeting: Some(42),
            service_body: Some(5),
            ..Default::default()
        };
        let query = filter.to_query();
        assert_eq!(query.target_meeting(), Some(42));
        assert_eq!(query.service_body_id, Some(5));
    }

    #[test]
    fn change_filter_dates() {
        let from = NaiveDate::from_ymd_opt(2024, 3, 1);
        let query = ChangeFilter {
            from,
            ..Default::default()
        }
        .to_query();
        assert_eq!(query.from, from);
        assert!(query.target_meeting().is_none());
    }
}
