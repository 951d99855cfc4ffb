use anyhow::Context;
use hidapi::HidApi;
use log::info;
use vxe_battery::ClientConfig;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ClientConfig::default();
    info!(
        "Looking for VXE mouse {:04x}:{:04x} on interface {}",
        config.vendor_id, config.product_id, config.interface
    );

    let api = HidApi::new()
        .map_err(vxe_battery::Error::HidApi)
        .context("Failed to initialise the HID library")?;

    let state = vxe_battery::read_battery(&api, &config)
        .await
        .context("Error getting battery level")?;
    info!("{state}");

    Ok(())
}
