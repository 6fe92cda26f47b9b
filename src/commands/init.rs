use crate::commands::Out;
use crate::{Config, Result};
use anyhow::Context;
use std::path::Path;

/// Creates the home directory and an initial `config.json` file with default settings.
///
/// # Arguments
/// - `home` - The directory that will hold the configuration, e.g. `$HOME/spendview`
/// - `rows` - The rows file that `view` should read by default, if any.
///
/// # Errors
/// - Returns an error if any file operations fail.
pub async fn init(home: &Path, rows: Option<&Path>) -> Result<Out<()>> {
    let config = Config::create(home, rows)
        .await
        .context("Unable to create the home directory and config")?;
    Ok(format!(
        "Successfully created the spendview config at {}",
        config.config_path().display()
    )
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_init() {
        let dir = TempDir::new().unwrap();
        let home = dir.path().join("home");
        let out = init(&home, Some(Path::new("rows.csv"))).await.unwrap();
        assert!(out.message().contains("config.json"));
        let config = Config::load(&home).await.unwrap();
        assert!(config.rows_path().unwrap().ends_with("rows.csv"));
    }
}
