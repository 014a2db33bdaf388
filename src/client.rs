//! Account client adapter
//!
//! The menu logic talks to Telegram only through [`AccountClient`] and
//! [`Connector`]. [`TelegramConnector`] is the grammers-backed
//! implementation; tests substitute their own.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use grammers_client::types::peer::Peer;
use grammers_client::{Client, SignInError};
use grammers_mtsender::{SenderPool, SenderPoolHandle};
use grammers_session::storages::SqliteSession;
use grammers_tl_types as tl;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::console::Console;
use crate::error::{Error, Result};
use crate::session::SessionRecord;

/// Offset Telegram clients use to mark channel ids as negative and disjoint.
const CHANNEL_ID_OFFSET: i64 = 1_000_000_000_000;

/// Kind of conversation, as classified by the client library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DialogKind {
    Person,
    Group,
    Channel,
}

impl DialogKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DialogKind::Person => "person",
            DialogKind::Group => "group",
            DialogKind::Channel => "channel",
        }
    }
}

/// Read-only view of one conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dialog {
    pub id: i64,
    pub name: String,
    pub kind: DialogKind,
    pub unread_count: i32,
}

impl Dialog {
    pub fn new(id: i64, name: impl Into<String>, kind: DialogKind, unread_count: i32) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            unread_count,
        }
    }

    pub fn is_group(&self) -> bool {
        self.kind == DialogKind::Group
    }
}

/// A resolved message target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityHandle {
    pub id: i64,
    pub name: String,
}

/// Operations the menu needs from a connected account.
#[async_trait]
pub trait AccountClient: Send + Sync {
    async fn list_dialogs(&self) -> Result<Vec<Dialog>>;
    async fn delete_dialog(&self, id: i64) -> Result<()>;
    async fn leave_group(&self, id: i64) -> Result<()>;
    async fn resolve_entity(&self, name: &str) -> Result<EntityHandle>;
    async fn send_message(&self, target: &EntityHandle, text: &str) -> Result<()>;
    /// Release the connection. Must be safe to call once per client.
    async fn disconnect(&self);
}

/// Produces an authenticated client for a stored session.
#[async_trait]
pub trait Connector: Send + Sync {
    type Client: AccountClient;

    async fn authenticate(
        &self,
        record: &SessionRecord,
        console: &mut dyn Console,
    ) -> Result<Self::Client>;
}

/// How a message target typed by the user is looked up.
#[derive(Debug, PartialEq, Eq)]
enum Target<'a> {
    Username(&'a str),
    Title(&'a str),
}

fn parse_target(target: &str) -> Target<'_> {
    match target.strip_prefix('@') {
        Some(username) => Target::Username(username),
        None => Target::Title(target),
    }
}

/// Raw peer shape, finer than [`DialogKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PeerClass {
    User,
    BasicGroup,
    Megagroup,
    Broadcast,
}

impl PeerClass {
    fn kind(self) -> DialogKind {
        match self {
            PeerClass::User => DialogKind::Person,
            PeerClass::BasicGroup | PeerClass::Megagroup => DialogKind::Group,
            PeerClass::Broadcast => DialogKind::Channel,
        }
    }
}

/// Users keep their id, basic groups are negated, channels get the -100 prefix.
fn mark_id(class: PeerClass, raw_id: i64) -> i64 {
    match class {
        PeerClass::User => raw_id,
        PeerClass::BasicGroup => -raw_id,
        PeerClass::Megagroup | PeerClass::Broadcast => -(CHANNEL_ID_OFFSET + raw_id),
    }
}

fn classify_peer(peer: &Peer) -> (PeerClass, i64) {
    match peer {
        Peer::User(u) => (PeerClass::User, u.raw.id()),
        Peer::Channel(c) => (PeerClass::Broadcast, c.raw.id),
        Peer::Group(g) => match &g.raw {
            tl::enums::Chat::Empty(c) => (PeerClass::BasicGroup, c.id),
            tl::enums::Chat::Chat(c) => (PeerClass::BasicGroup, c.id),
            tl::enums::Chat::Forbidden(c) => (PeerClass::BasicGroup, c.id),
            tl::enums::Chat::Channel(c) => (PeerClass::Megagroup, c.id),
            tl::enums::Chat::ChannelForbidden(c) => (PeerClass::Megagroup, c.id),
        },
    }
}

fn peer_title(peer: &Peer) -> String {
    match peer {
        Peer::Channel(c) => c.title().to_string(),
        Peer::Group(g) => g.title().unwrap_or("Group").to_string(),
        Peer::User(u) => u.full_name(),
    }
}

fn unread_count(dialog: &grammers_client::types::Dialog) -> i32 {
    match &dialog.raw {
        tl::enums::Dialog::Dialog(d) => d.unread_count,
        tl::enums::Dialog::Folder(folder) => {
            folder.unread_muted_messages_count + folder.unread_unmuted_messages_count
        }
    }
}

fn peer_to_input(peer: &Peer) -> tl::enums::InputPeer {
    match peer {
        Peer::User(user) => {
            let (user_id, access_hash) = match &user.raw {
                tl::enums::User::User(u) => (u.id, u.access_hash.unwrap_or(0)),
                tl::enums::User::Empty(u) => (u.id, 0),
            };
            tl::enums::InputPeer::User(tl::types::InputPeerUser {
                user_id,
                access_hash,
            })
        }
        Peer::Channel(channel) => tl::enums::InputPeer::Channel(tl::types::InputPeerChannel {
            channel_id: channel.raw.id,
            access_hash: channel.raw.access_hash.unwrap_or(0),
        }),
        Peer::Group(group) => match &group.raw {
            tl::enums::Chat::Chat(c) => {
                tl::enums::InputPeer::Chat(tl::types::InputPeerChat { chat_id: c.id })
            }
            tl::enums::Chat::Forbidden(c) => {
                tl::enums::InputPeer::Chat(tl::types::InputPeerChat { chat_id: c.id })
            }
            tl::enums::Chat::Channel(c) => {
                tl::enums::InputPeer::Channel(tl::types::InputPeerChannel {
                    channel_id: c.id,
                    access_hash: c.access_hash.unwrap_or(0),
                })
            }
            _ => tl::enums::InputPeer::Empty,
        },
    }
}

fn peer_to_input_channel(peer: &Peer) -> Option<tl::enums::InputChannel> {
    match peer_to_input(peer) {
        tl::enums::InputPeer::Channel(c) => {
            Some(tl::enums::InputChannel::Channel(tl::types::InputChannel {
                channel_id: c.channel_id,
                access_hash: c.access_hash,
            }))
        }
        _ => None,
    }
}

/// grammers-backed account connection.
pub struct TelegramClient {
    client: Client,
    handle: SenderPoolHandle,
    runner: Mutex<Option<JoinHandle<()>>>,
    dialog_limit: Option<usize>,
    peers: Mutex<HashMap<i64, Peer>>,
    titles: Mutex<Vec<(String, i64)>>,
}

impl TelegramClient {
    /// Open the MTProto session file and start the sender pool.
    pub async fn connect(
        record: &SessionRecord,
        session_dir: PathBuf,
        dialog_limit: Option<usize>,
    ) -> Result<Self> {
        let api_id: i32 = record.api_id.trim().parse().map_err(|_| {
            Error::InvalidArgument(format!("API ID '{}' is not a number", record.api_id))
        })?;

        std::fs::create_dir_all(&session_dir)?;
        let session_file = record.session_file(&session_dir);
        let session = SqliteSession::open(&session_file).map_err(|e| {
            Error::TelegramError(format!(
                "Failed to open session {}: {}",
                session_file.display(),
                e
            ))
        })?;
        let session = Arc::new(session);

        let pool = SenderPool::new(session, api_id);
        let client = Client::new(&pool);
        let SenderPool { runner, handle, .. } = pool;

        let runner = tokio::spawn(async move {
            runner.run().await;
        });

        info!(session = %record.name, "Connected to Telegram");

        Ok(Self {
            client,
            handle,
            runner: Mutex::new(Some(runner)),
            dialog_limit,
            peers: Mutex::new(HashMap::new()),
            titles: Mutex::new(Vec::new()),
        })
    }

    async fn login(&self, record: &SessionRecord, console: &mut dyn Console) -> Result<()> {
        if self.client.is_authorized().await? {
            debug!(session = %record.name, "Session already authorized");
            return Ok(());
        }

        console.print(&format!("📱 Iniciando sesión para {}...", record.phone));
        let token = self
            .client
            .request_login_code(&record.phone, &record.api_hash)
            .await
            .map_err(|e| Error::AuthorizationFailed(format!("Failed to request code: {}", e)))?;

        let code = console.input("Introduce el código recibido en Telegram")?;

        match self.client.sign_in(&token, code.trim()).await {
            Ok(_) => Ok(()),
            Err(SignInError::PasswordRequired(password_token)) => {
                let prompt = match password_token.hint() {
                    Some(hint) => {
                        format!("Contraseña de verificación en dos pasos (pista: {})", hint)
                    }
                    None => "Contraseña de verificación en dos pasos".to_string(),
                };
                let password = console.password(&prompt)?;
                self.client
                    .check_password(password_token, password.trim())
                    .await
                    .map(|_| ())
                    .map_err(|e| {
                        Error::AuthorizationFailed(format!("Failed to check password: {}", e))
                    })
            }
            Err(e) => Err(Error::AuthorizationFailed(format!("Failed to sign in: {}", e))),
        }
    }

    fn lock_err<T>(err: std::sync::PoisonError<T>) -> Error {
        Error::TelegramError(format!("peer cache poisoned: {}", err))
    }

    fn cached_peer(&self, id: i64) -> Result<Peer> {
        self.peers
            .lock()
            .map_err(Self::lock_err)?
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::EntityNotFound(id.to_string()))
    }

    fn remember(&self, id: i64, peer: Peer) -> Result<()> {
        self.peers.lock().map_err(Self::lock_err)?.insert(id, peer);
        Ok(())
    }

    async fn delete_history(&self, peer: &Peer) -> Result<()> {
        self.client
            .invoke(&tl::functions::messages::DeleteHistory {
                just_clear: false,
                revoke: false,
                peer: peer_to_input(peer),
                max_id: 0,
                min_date: None,
                max_date: None,
            })
            .await?;
        Ok(())
    }

    async fn leave_basic_group(&self, chat_id: i64) -> Result<()> {
        self.client
            .invoke(&tl::functions::messages::DeleteChatUser {
                revoke_history: false,
                chat_id,
                user_id: tl::enums::InputUser::UserSelf,
            })
            .await?;
        Ok(())
    }

    async fn leave_channel(&self, peer: &Peer) -> Result<()> {
        let channel = peer_to_input_channel(peer)
            .ok_or_else(|| Error::InvalidArgument("peer is not a channel".to_string()))?;
        self.client
            .invoke(&tl::functions::channels::LeaveChannel { channel })
            .await?;
        Ok(())
    }
}

#[async_trait]
impl AccountClient for TelegramClient {
    async fn list_dialogs(&self) -> Result<Vec<Dialog>> {
        let mut result = Vec::new();
        let mut peers = HashMap::new();
        let mut titles = Vec::new();
        let mut dialogs = self.client.iter_dialogs();

        while let Some(dialog) = dialogs.next().await? {
            let peer = dialog.peer.clone();
            let (class, raw_id) = classify_peer(&peer);
            let id = mark_id(class, raw_id);
            let name = peer_title(&peer);

            titles.push((name.clone(), id));
            peers.insert(id, peer);
            result.push(Dialog::new(id, name, class.kind(), unread_count(&dialog)));

            if self.dialog_limit.is_some_and(|limit| result.len() >= limit) {
                break;
            }
        }

        debug!(count = result.len(), "Fetched dialogs");
        *self.peers.lock().map_err(Self::lock_err)? = peers;
        *self.titles.lock().map_err(Self::lock_err)? = titles;
        Ok(result)
    }

    async fn delete_dialog(&self, id: i64) -> Result<()> {
        let peer = self.cached_peer(id)?;
        let (class, raw_id) = classify_peer(&peer);
        match class {
            PeerClass::User => self.delete_history(&peer).await,
            PeerClass::BasicGroup => {
                self.leave_basic_group(raw_id).await?;
                self.delete_history(&peer).await
            }
            PeerClass::Megagroup | PeerClass::Broadcast => self.leave_channel(&peer).await,
        }
    }

    async fn leave_group(&self, id: i64) -> Result<()> {
        let peer = self.cached_peer(id)?;
        let (class, raw_id) = classify_peer(&peer);
        match class {
            PeerClass::BasicGroup => self.leave_basic_group(raw_id).await,
            PeerClass::Megagroup => self.leave_channel(&peer).await,
            PeerClass::User | PeerClass::Broadcast => Err(Error::InvalidArgument(format!(
                "dialog {} is not a group",
                id
            ))),
        }
    }

    async fn resolve_entity(&self, name: &str) -> Result<EntityHandle> {
        let username = match parse_target(name) {
            Target::Username(username) => username,
            Target::Title(title) => {
                let found = self
                    .titles
                    .lock()
                    .map_err(Self::lock_err)?
                    .iter()
                    .find(|(t, _)| t == title)
                    .map(|(_, id)| *id);
                if let Some(id) = found {
                    return Ok(EntityHandle {
                        id,
                        name: title.to_string(),
                    });
                }
                title
            }
        };

        let peer = self
            .client
            .resolve_username(username)
            .await?
            .ok_or_else(|| Error::EntityNotFound(name.to_string()))?;
        let (class, raw_id) = classify_peer(&peer);
        let id = mark_id(class, raw_id);
        let title = peer_title(&peer);
        self.remember(id, peer)?;

        Ok(EntityHandle { id, name: title })
    }

    async fn send_message(&self, target: &EntityHandle, text: &str) -> Result<()> {
        let peer = self.cached_peer(target.id)?;
        self.client.send_message(&peer, text).await?;
        Ok(())
    }

    async fn disconnect(&self) {
        let _ = self.handle.quit();
        let runner = match self.runner.lock() {
            Ok(mut guard) => guard.take(),
            Err(err) => {
                warn!("Runner handle lock poisoned: {}", err);
                None
            }
        };
        if let Some(runner) = runner {
            if let Err(err) = runner.await {
                warn!("Sender pool runner ended abnormally: {}", err);
            }
        }
        info!("Disconnected from Telegram");
    }
}

/// Connects stored sessions through grammers.
#[derive(Debug, Clone)]
pub struct TelegramConnector {
    session_dir: PathBuf,
    dialog_limit: Option<usize>,
}

impl TelegramConnector {
    pub fn new(session_dir: impl Into<PathBuf>, dialog_limit: Option<usize>) -> Self {
        Self {
            session_dir: session_dir.into(),
            dialog_limit,
        }
    }
}

#[async_trait]
impl Connector for TelegramConnector {
    type Client = TelegramClient;

    async fn authenticate(
        &self,
        record: &SessionRecord,
        console: &mut dyn Console,
    ) -> Result<TelegramClient> {
        let client =
            TelegramClient::connect(record, self.session_dir.clone(), self.dialog_limit).await?;

        if let Err(err) = client.login(record, console).await {
            client.disconnect().await;
            return Err(err);
        }

        Ok(client)
    }
}
