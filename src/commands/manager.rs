//! Top-level session loop

use tracing::warn;

use crate::client::Connector;
use crate::commands::intake::add_new_session;
use crate::commands::menu::manage_session;
use crate::console::Console;
use crate::error::{Error, Result};
use crate::session::{SessionRecord, SessionStorage};

/// Errors that end the program rather than just the current session.
fn is_fatal(err: &Error) -> bool {
    matches!(
        err,
        Error::IoError(_) | Error::SerializationError(_) | Error::PromptError(_)
    )
}

/// One numbered line per stored session: `1. +5212345`.
fn session_choices(sessions: &[SessionRecord]) -> Vec<String> {
    sessions
        .iter()
        .enumerate()
        .map(|(idx, s)| format!("{}. {}", idx + 1, s.phone))
        .collect()
}

/// Select a stored session, run its menu, and repeat until the user stops.
///
/// With an empty store the user is asked for one account first.
pub async fn run<K: Connector>(
    connector: &K,
    store: &dyn SessionStorage,
    console: &mut dyn Console,
) -> Result<()> {
    let mut sessions = store.load()?;

    if sessions.is_empty() {
        console.print("⚠️ No tienes sesiones guardadas. Añade una nueva sesión.");
        add_new_session(store, console)?;
        sessions = store.load()?;
    }

    loop {
        console.panel("🔹 Menú de Sesiones 🔹");
        let choices = session_choices(&sessions);
        let idx = console.select("Selecciona el número de sesión", &choices, 0)?;
        let session = sessions
            .get(idx)
            .ok_or_else(|| Error::InvalidArgument(format!("session {} out of range", idx + 1)))?;

        if let Err(err) = manage_session(connector, store, idx, console).await {
            if is_fatal(&err) {
                return Err(err);
            }
            warn!(session = %session.name, "Session ended with error: {}", err);
            console.print(&format!("⚠️ Error en la sesión {}: {}", session.phone, err));
        }

        if !console.confirm("¿Deseas continuar con otra sesión o salir? [s/n]", Some(false))? {
            console.print("👋 ¡Hasta luego!");
            return Ok(());
        }

        sessions = store.load()?;
    }
}
