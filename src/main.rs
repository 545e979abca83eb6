//! Binary entry point: resolve the data directory, load saved state, and run
//! the Ratatui event loop until the user exits.
use library_manager::logging::init_logging;
use library_manager::{run_app, App, Config, PersistenceGateway};

fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    if let Err(err) = init_logging(&config) {
        eprintln!("warning: logging disabled: {err:#}");
    }

    let gateway = PersistenceGateway::new(config.db_path());
    let (library, warning) = gateway.load().into_library();

    let mut app = App::new(library, gateway);
    if let Some(warning) = warning {
        app.report_load_warning(&warning);
    }
    run_app(&mut app)
}
