//! Credential intake for a new account

use tracing::info;

use crate::console::Console;
use crate::error::Result;
use crate::session::{append_session, SessionRecord, SessionStorage};

const REGISTRATION_HELP: &[&str] = &[
    "Si aún no tienes un API ID y API Hash:",
    "  1. Visita https://my.telegram.org/auth",
    "  2. Inicia sesión con tu número de teléfono.",
    "  3. Crea una nueva aplicación para obtener tu API ID y API Hash.",
];

/// Prompt for phone and API credentials, then append the new record.
///
/// Input is stored as typed; no format or duplicate checks are made.
pub fn add_new_session(
    store: &dyn SessionStorage,
    console: &mut dyn Console,
) -> Result<SessionRecord> {
    console.panel("📱 Agregar una nueva sesión de Telegram");
    for line in REGISTRATION_HELP {
        console.print(line);
    }

    let phone = console.input("Introduce tu número de teléfono (+52xxxxxxxxxxx)")?;
    let api_id = console.input("Introduce tu API ID (consulta en https://my.telegram.org/auth)")?;
    let api_hash =
        console.input("Introduce tu API Hash (consulta en https://my.telegram.org/auth)")?;

    let record = SessionRecord::new(&phone, &api_id, &api_hash);
    append_session(store, record.clone())?;

    info!(session = %record.name, "Stored new session");
    console.print(&format!("✅ Sesión para {} agregada correctamente!", phone));
    Ok(record)
}
