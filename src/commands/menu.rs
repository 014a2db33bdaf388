//! Per-session menu: option table, dispatch and connection scope

use std::time::Instant;

use tracing::{info, warn};

use crate::client::{AccountClient, Connector, Dialog};
use crate::commands::actions;
use crate::console::Console;
use crate::error::{Error, Result};
use crate::metrics;
use crate::session::{session_at, SessionRecord, SessionStorage};

/// The eight fixed menu entries, numbered as shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuOption {
    DeleteChatsOrChannels,
    LeaveGroups,
    DeleteAll,
    SendMessageToGroup,
    ShowCurrentChats,
    UpdateApiCredentials,
    ViewInteractionStatistics,
    Exit,
}

impl MenuOption {
    pub const ALL: [MenuOption; 8] = [
        MenuOption::DeleteChatsOrChannels,
        MenuOption::LeaveGroups,
        MenuOption::DeleteAll,
        MenuOption::SendMessageToGroup,
        MenuOption::ShowCurrentChats,
        MenuOption::UpdateApiCredentials,
        MenuOption::ViewInteractionStatistics,
        MenuOption::Exit,
    ];

    /// 1-based number shown in the menu.
    pub fn number(self) -> usize {
        Self::ALL
            .iter()
            .position(|o| *o == self)
            .map(|idx| idx + 1)
            .unwrap_or(Self::ALL.len())
    }

    pub fn from_number(number: usize) -> Option<Self> {
        number
            .checked_sub(1)
            .and_then(|idx| Self::ALL.get(idx))
            .copied()
    }

    pub fn label(self) -> &'static str {
        match self {
            MenuOption::DeleteChatsOrChannels => "🗑 Eliminar chats o canales seleccionados",
            MenuOption::LeaveGroups => "👥 Salir de grupos seleccionados",
            MenuOption::DeleteAll => "🧹 Eliminar todos los chats, grupos y canales",
            MenuOption::SendMessageToGroup => "📩 Enviar un mensaje a un grupo",
            MenuOption::ShowCurrentChats => "🗂 Ver detalles de tus chats actuales",
            MenuOption::UpdateApiCredentials => "📝 Actualizar API ID y API Hash",
            MenuOption::ViewInteractionStatistics => "💬 Ver estadísticas de tus interacciones",
            MenuOption::Exit => "🚪 Salir de la sesión",
        }
    }

    /// Metric/log label.
    pub fn action_name(self) -> &'static str {
        match self {
            MenuOption::DeleteChatsOrChannels => "delete_chats_or_channels",
            MenuOption::LeaveGroups => "leave_groups",
            MenuOption::DeleteAll => "delete_all",
            MenuOption::SendMessageToGroup => "send_message_to_group",
            MenuOption::ShowCurrentChats => "show_current_chats",
            MenuOption::UpdateApiCredentials => "update_api_credentials",
            MenuOption::ViewInteractionStatistics => "view_interaction_statistics",
            MenuOption::Exit => "exit",
        }
    }

    fn menu_line(self) -> String {
        format!("[{}] {}", self.number(), self.label())
    }
}

/// What the menu loop does after an option ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Show the option panel and read a choice; defaults to Exit.
pub fn prompt_option(console: &mut dyn Console) -> Result<MenuOption> {
    console.panel("🔹 Menú de Opciones 🔹");
    let lines: Vec<String> = MenuOption::ALL.iter().map(|o| o.menu_line()).collect();
    let idx = console.select("Selecciona una opción", &lines, MenuOption::ALL.len() - 1)?;
    MenuOption::from_number(idx + 1)
        .ok_or_else(|| Error::InvalidArgument(format!("menu option {} out of range", idx + 1)))
}

/// Run exactly one handler for `option`. `record` is the active session,
/// stored at `index`.
pub async fn dispatch<C: AccountClient + ?Sized>(
    option: MenuOption,
    client: &C,
    store: &dyn SessionStorage,
    index: usize,
    record: &SessionRecord,
    dialogs: &[Dialog],
    console: &mut dyn Console,
) -> Result<Flow> {
    if option == MenuOption::Exit {
        console.print("👋 Saliendo de la sesión. ¡Hasta pronto!");
        return Ok(Flow::Exit);
    }

    let action = option.action_name();
    info!(session = %record.name, action, "Running menu action");
    metrics::record_action_start(action);
    let start = Instant::now();

    let result = match option {
        MenuOption::DeleteChatsOrChannels => {
            actions::delete_chats_or_channels(client, dialogs, console)
                .await
                .map(|r| r.is_clean())
        }
        MenuOption::LeaveGroups => actions::leave_groups(client, dialogs, console)
            .await
            .map(|r| r.is_clean()),
        MenuOption::DeleteAll => actions::delete_all(client, dialogs, console)
            .await
            .map(|r| r.is_clean()),
        MenuOption::SendMessageToGroup => actions::send_message_to_group(client, console)
            .await
            .map(|r| r.is_sent()),
        MenuOption::ShowCurrentChats => {
            actions::show_current_chats(dialogs, console);
            Ok(true)
        }
        MenuOption::UpdateApiCredentials => {
            match actions::update_api_credentials(store, index, &record.name, console) {
                Err(Error::SessionNotFound(name)) => {
                    warn!(session = %name, "Credential update for unknown session");
                    console.print(&format!("⚠️ No existe la sesión {}", name));
                    Ok(false)
                }
                other => other.map(|_| true),
            }
        }
        MenuOption::ViewInteractionStatistics => {
            actions::view_interaction_statistics(client, console)
                .await
                .map(|_| true)
        }
        MenuOption::Exit => Ok(true),
    };

    metrics::record_action_result(action, start.elapsed(), matches!(result, Ok(true)));
    result.map(|_| Flow::Continue)
}

/// Show the menu repeatedly until the user picks Exit. Dialogs are
/// re-fetched every round so earlier deletions are reflected.
pub async fn run_menu<C: AccountClient + ?Sized>(
    client: &C,
    store: &dyn SessionStorage,
    index: usize,
    record: &SessionRecord,
    console: &mut dyn Console,
) -> Result<()> {
    loop {
        let dialogs = client.list_dialogs().await?;
        let option = prompt_option(console)?;
        let flow = dispatch(option, client, store, index, record, &dialogs, console).await?;
        if flow == Flow::Exit {
            return Ok(());
        }
    }
}

/// Connect the session stored at `index` (zero-based), run its menu, and
/// disconnect afterwards whether or not the menu succeeded.
pub async fn manage_session<K: Connector>(
    connector: &K,
    store: &dyn SessionStorage,
    index: usize,
    console: &mut dyn Console,
) -> Result<()> {
    let record = session_at(store, index)?;
    let client = connector.authenticate(&record, console).await?;

    let result = run_menu(&client, store, index, &record, console).await;
    client.disconnect().await;
    result
}
