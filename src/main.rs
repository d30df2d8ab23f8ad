use color_eyre::Result;
use vkswap::app::App;
use vkswap::app::config::AppConfig;

fn main() -> Result<()> {
    color_eyre::install()?;
    env_logger::init();

    let config = AppConfig::load()?;
    let app = App::new(config);
    app.run()?;

    Ok(())
}
