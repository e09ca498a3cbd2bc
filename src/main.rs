use showroom::{AppConfig, ShowroomConfig};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::new();
    let scene = ShowroomConfig::new();
    log::info!("Loading models from {}", scene.assets.car.display());

    if let Err(e) = showroom::run(config, scene) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
