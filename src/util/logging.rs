use std::sync::Once;

static LOGGER_INIT: Once = Once::new();

/// Initializes the `log4rs` logger from `log4rs.yaml`, falling back to a
/// basic console appender when the config file is missing or invalid.
pub fn init() {
    LOGGER_INIT.call_once(|| {
        if log4rs::init_file("log4rs.yaml", Default::default()).is_ok() {
            log::info!("logging initialized from log4rs.yaml");
            return;
        }

        let stdout = log4rs::append::console::ConsoleAppender::builder()
            .encoder(Box::new(log4rs::encode::pattern::PatternEncoder::new(
                "{d(%Y-%m-%d %H:%M:%S)(utc)} {l} {t} - {m}{n}",
            )))
            .build();
        let config = log4rs::config::Config::builder()
            .appender(log4rs::config::Appender::builder().build("stdout", Box::new(stdout)))
            .build(
                log4rs::config::Root::builder()
                    .appender("stdout")
                    .build(log::LevelFilter::Info),
            );
        match config {
            Ok(config) => {
                if let Err(e) = log4rs::init_config(config) {
                    eprintln!("ERROR: failed to initialize fallback logger: {e}");
                }
            }
            Err(e) => eprintln!("ERROR: failed to build fallback logging configuration: {e}"),
        }
    });
}
