//! Menu action handlers
//!
//! Bulk handlers walk the current dialog list and issue one client call
//! per matching dialog. A failing dialog is reported and recorded in the
//! returned [`BulkReport`]; the remaining dialogs are still processed.
//! Only console failures abort a handler.

use tracing::{info, warn};

use crate::client::{AccountClient, Dialog, DialogKind};
use crate::console::Console;
use crate::error::Result;
use crate::metrics;
use crate::session::{update_credentials, SessionRecord, SessionStorage};

/// One dialog the handler could not process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFailure {
    pub id: i64,
    pub name: String,
    pub reason: String,
}

/// Outcome of a bulk handler.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkReport {
    pub succeeded: Vec<i64>,
    pub failed: Vec<ItemFailure>,
}

impl BulkReport {
    /// Number of dialogs a client call was issued for.
    pub fn attempted(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    fn settle(
        &mut self,
        action: &'static str,
        dialog: &Dialog,
        outcome: Result<()>,
        console: &mut dyn Console,
        done: String,
        failed: &str,
    ) {
        match outcome {
            Ok(()) => {
                metrics::record_item(action, true);
                console.print(&done);
                self.succeeded.push(dialog.id);
            }
            Err(err) => {
                metrics::record_item(action, false);
                warn!(
                    action,
                    dialog_id = dialog.id,
                    kind = dialog.kind.as_str(),
                    "{}",
                    err
                );
                console.print(&format!("⚠️ {} {}: {}", failed, dialog.name, err));
                self.failed.push(ItemFailure {
                    id: dialog.id,
                    name: dialog.name.clone(),
                    reason: err.to_string(),
                });
            }
        }
    }

    fn print_summary(&self, console: &mut dyn Console) {
        if self.attempted() == 0 {
            return;
        }
        console.print(&format!(
            "Resumen: {} completados, {} con error",
            self.succeeded.len(),
            self.failed.len()
        ));
    }
}

/// Outcome of sending a single message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendReport {
    pub target: String,
    /// Id of the resolved target, or the failure reason.
    pub outcome: std::result::Result<i64, String>,
}

impl SendReport {
    pub fn is_sent(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Totals printed by the statistics option.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InteractionStats {
    pub unread_total: i64,
    pub dialog_count: usize,
}

impl InteractionStats {
    pub fn from_dialogs(dialogs: &[Dialog]) -> Self {
        Self {
            unread_total: dialogs.iter().map(|d| i64::from(d.unread_count)).sum(),
            dialog_count: dialogs.len(),
        }
    }
}

/// Ask per person-chat or channel whether to delete it. Groups are skipped.
pub async fn delete_chats_or_channels<C: AccountClient + ?Sized>(
    client: &C,
    dialogs: &[Dialog],
    console: &mut dyn Console,
) -> Result<BulkReport> {
    const ACTION: &str = "delete_chats_or_channels";

    console.print("");
    console.print("🗑 Eliminar chats o canales seleccionados");

    let mut report = BulkReport::default();
    for dialog in dialogs {
        let (question, done) = match dialog.kind {
            DialogKind::Person => (
                format!("Eliminar chat con {}?", dialog.name),
                format!("✅ Chat con {} eliminado.", dialog.name),
            ),
            DialogKind::Channel => (
                format!("Eliminar canal {}?", dialog.name),
                format!("✅ Canal {} eliminado.", dialog.name),
            ),
            DialogKind::Group => continue,
        };

        if !console.confirm(&question, None)? {
            continue;
        }

        let outcome = client.delete_dialog(dialog.id).await;
        report.settle(ACTION, dialog, outcome, console, done, "Error al eliminar");
    }

    report.print_summary(console);
    Ok(report)
}

/// Ask per group whether to leave it.
pub async fn leave_groups<C: AccountClient + ?Sized>(
    client: &C,
    dialogs: &[Dialog],
    console: &mut dyn Console,
) -> Result<BulkReport> {
    const ACTION: &str = "leave_groups";

    console.print("");
    console.print("👥 Salir de grupos seleccionados");

    let mut report = BulkReport::default();
    for dialog in dialogs.iter().filter(|d| d.is_group()) {
        if !console.confirm(&format!("Salir del grupo {}?", dialog.name), None)? {
            continue;
        }

        let outcome = client.leave_group(dialog.id).await;
        let done = format!("✅ Saliste del grupo {}.", dialog.name);
        report.settle(ACTION, dialog, outcome, console, done, "Error al salir del grupo");
    }

    report.print_summary(console);
    Ok(report)
}

/// Delete every dialog, whatever its kind, without asking per item.
pub async fn delete_all<C: AccountClient + ?Sized>(
    client: &C,
    dialogs: &[Dialog],
    console: &mut dyn Console,
) -> Result<BulkReport> {
    const ACTION: &str = "delete_all";

    console.print("");
    console.print("🗑 Eliminando todos los chats, grupos y canales...");
    info!(count = dialogs.len(), "Deleting all dialogs");

    let mut report = BulkReport::default();
    for dialog in dialogs {
        let outcome = client.delete_dialog(dialog.id).await;
        let done = format!("✅ Eliminado {}", dialog.name);
        report.settle(ACTION, dialog, outcome, console, done, "Error al eliminar");
    }

    report.print_summary(console);
    Ok(report)
}

/// Resolve a group by name and send it one message.
pub async fn send_message_to_group<C: AccountClient + ?Sized>(
    client: &C,
    console: &mut dyn Console,
) -> Result<SendReport> {
    let group_name =
        console.input("Introduce el nombre del grupo al que deseas enviar un mensaje")?;
    let message = console.input("Escribe el mensaje que deseas enviar")?;

    let outcome: Result<i64> = async {
        let target = client.resolve_entity(&group_name).await?;
        client.send_message(&target, &message).await?;
        Ok(target.id)
    }
    .await;

    let outcome = match outcome {
        Ok(id) => {
            metrics::record_item("send_message_to_group", true);
            console.print(&format!(
                "✅ Mensaje enviado correctamente al grupo {}",
                group_name
            ));
            Ok(id)
        }
        Err(err) => {
            metrics::record_item("send_message_to_group", false);
            warn!(target = %group_name, "Failed to send message: {}", err);
            console.print(&format!("⚠️ Error al enviar mensaje: {}", err));
            Err(err.to_string())
        }
    };

    Ok(SendReport {
        target: group_name,
        outcome,
    })
}

/// Print one line per dialog, labelled by kind.
pub fn show_current_chats(dialogs: &[Dialog], console: &mut dyn Console) {
    console.print("");
    console.print("📝 Detalles de tus chats actuales:");
    for dialog in dialogs {
        let line = match dialog.kind {
            DialogKind::Person => format!("💬 Chat con: {}", dialog.name),
            DialogKind::Group => format!("👥 Grupo: {}", dialog.name),
            DialogKind::Channel => format!("📡 Canal: {}", dialog.name),
        };
        console.print(&line);
    }
}

/// Prompt for a new API id/hash and store them on the active session,
/// which sits at `index` in the store.
pub fn update_api_credentials(
    store: &dyn SessionStorage,
    index: usize,
    session_name: &str,
    console: &mut dyn Console,
) -> Result<SessionRecord> {
    console.print("🔑 Actualizar tus credenciales de Telegram");
    let api_id = console.input("Introduce el nuevo API ID")?;
    let api_hash = console.input("Introduce el nuevo API Hash")?;

    let record = update_credentials(store, index, session_name, &api_id, &api_hash)?;

    info!(session = %session_name, "Updated API credentials");
    console.print(&format!(
        "✅ Las credenciales de {} han sido actualizadas correctamente!",
        session_name
    ));
    Ok(record)
}

/// Re-fetch dialogs and print the unread total and dialog count.
pub async fn view_interaction_statistics<C: AccountClient + ?Sized>(
    client: &C,
    console: &mut dyn Console,
) -> Result<InteractionStats> {
    let dialogs = client.list_dialogs().await?;
    let stats = InteractionStats::from_dialogs(&dialogs);

    console.print("");
    console.print("📊 Estadísticas de interacciones");
    console.print(&format!("Total de mensajes no leídos: {}", stats.unread_total));
    console.print(&format!("Total de chats: {}", stats.dialog_count));
    Ok(stats)
}
