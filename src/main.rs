use std::io::{Error, ErrorKind};

use newsletter_lifecycle::config::get_configuration;
use newsletter_lifecycle::startup::Application;
use newsletter_lifecycle::telemetry::{get_subscriber, init_subscriber};

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let subscriber = get_subscriber(
        String::from("newsletter_lifecycle"),
        String::from("info"),
        std::io::stdout,
    );

    init_subscriber(subscriber).map_err(|err| Error::new(ErrorKind::Other, err))?;

    let config = get_configuration().map_err(|err| Error::new(ErrorKind::InvalidData, err))?;
    let address = config.get_address();
    let application = Application::build(config).await?;

    tracing::info!("Server listening on {}", address);

    application.run_until_stop().await
}
