mod ui;

use gettextrs::{LocaleCategory, bind_textdomain_codeset, bindtextdomain, setlocale, textdomain};
use tracing::warn;

const GETTEXT_PACKAGE: &str = "pairs";
const LOCALEDIR: &str = "/usr/share/locale";

fn init_i18n() {
    setlocale(LocaleCategory::LcAll, "");
    if let Err(err) = bindtextdomain(GETTEXT_PACKAGE, LOCALEDIR) {
        warn!(%err, "unable to bind text domain");
        return;
    }
    if let Err(err) = bind_textdomain_codeset(GETTEXT_PACKAGE, "UTF-8") {
        warn!(%err, "unable to set text domain codeset");
    }
    if let Err(err) = textdomain(GETTEXT_PACKAGE) {
        warn!(%err, "unable to switch text domain");
    }
}

fn main() -> glib::ExitCode {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init();

    init_i18n();
    ui::app::run()
}
