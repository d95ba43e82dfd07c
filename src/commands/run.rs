use crate::autopilot::Autopilot;
use crate::cli::Cli;
use crate::config::Config;
use crate::error::Result;
use crate::settings::SettingsStore;

pub async fn run(cli: &Cli) -> Result<()> {
    let config = Config::load()?;
    let session = super::prepare_session(cli, &config).await?;
    let settings_store = SettingsStore::open();

    Autopilot::new(session, config, settings_store).run().await
}
