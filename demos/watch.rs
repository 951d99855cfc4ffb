//! Poll the mouse battery forever, one independent query per interval.

use vxe_battery::config::POLL_INTERVAL;
use vxe_battery::ClientConfig;

#[tokio::main(flavor = "current_thread")]
pub async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ClientConfig::default();
    let mut api = hidapi::HidApi::new()?;
    loop {
        // Re-enumerate every time so the dongle can be replugged between polls
        api.refresh_devices()?;
        match vxe_battery::read_battery(&api, &config).await {
            Ok(battery_state) => println!("{battery_state}"),
            Err(err) => log::error!("Error getting battery level: {err}"),
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}
