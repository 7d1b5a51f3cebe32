use elegance_studio::{logger, server, Config};

#[tokio::main]
async fn main() -> std::io::Result<()> {
    match dotenv::dotenv() {
        Ok(_) => eprintln!(".env file loaded"),
        Err(_) => eprintln!("No .env file found, using system environment variables"),
    }

    let logger_config = if std::env::var("GATEWAY_ENV").as_deref() == Ok("production") {
        logger::LoggerConfig::production()
    } else {
        logger::LoggerConfig::development()
    };
    logger::init_with_config(logger_config)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

    let config = Config::from_env();

    if config.provider.endpoint_url.is_none() {
        log::error!("PROVIDER_ENDPOINT_URL is not set");
    }
    if config.provider.credential.is_none() {
        log::error!("PROVIDER_API_KEY is not set");
    }

    let port = config.port.unwrap_or(8000);
    logger::log_startup_info("elegance-gateway", env!("CARGO_PKG_VERSION"), port);

    server::run(config).await
}
