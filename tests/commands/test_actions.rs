//! Tests for the menu action handlers

use tempfile::tempdir;
use tg_session_manager::commands::actions;
use tg_session_manager::session::{JsonFileStore, SessionRecord, SessionStorage};
use tg_session_manager::{Dialog, DialogKind, Error};

use super::{calls, sample_dialogs, Call, FakeClient, ScriptedConsole};

#[tokio::test]
async fn delete_all_deletes_every_dialog_once() {
    let dialogs = sample_dialogs();
    let client = FakeClient::new(dialogs.clone());
    let mut console = ScriptedConsole::default();

    let report = actions::delete_all(&client, &dialogs, &mut console)
        .await
        .unwrap();

    let expected: Vec<Call> = dialogs.iter().map(|d| Call::Delete(d.id)).collect();
    assert_eq!(calls(&client.log()), expected);
    assert_eq!(report.succeeded.len(), 5);
    assert!(report.is_clean());
    // No per-item confirmation is asked.
    assert_eq!(console.remaining_answers(), 0);
    assert!(console.printed("✅ Eliminado Familia"));
}

#[tokio::test]
async fn delete_all_continues_after_a_failure() {
    let dialogs = sample_dialogs();
    let client = FakeClient::new(dialogs.clone()).failing_on(-1_000_000_000_303);
    let mut console = ScriptedConsole::default();

    let report = actions::delete_all(&client, &dialogs, &mut console)
        .await
        .unwrap();

    assert_eq!(calls(&client.log()).len(), 5);
    assert_eq!(report.succeeded, vec![101, -202, 404, -1_000_000_000_505]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].id, -1_000_000_000_303);
    assert_eq!(report.failed[0].name, "Noticias");
    assert!(report.failed[0].reason.contains("CHAT_ADMIN_REQUIRED"));
    assert!(console.printed("⚠️ Error al eliminar Noticias"));
    assert!(console.printed("Resumen: 4 completados, 1 con error"));
}

#[tokio::test]
async fn delete_chats_or_channels_never_offers_groups() {
    let dialogs = sample_dialogs();
    let client = FakeClient::new(dialogs.clone());
    // Ana, Noticias, Luis are asked; both groups are skipped.
    let mut console = ScriptedConsole::new(["y", "y", "y"]);

    let report = actions::delete_chats_or_channels(&client, &dialogs, &mut console)
        .await
        .unwrap();

    assert_eq!(
        calls(&client.log()),
        vec![
            Call::Delete(101),
            Call::Delete(-1_000_000_000_303),
            Call::Delete(404)
        ]
    );
    assert_eq!(report.attempted(), 3);
    assert!(!console.printed("Familia"));
    assert!(!console.printed("Rust ES"));
    assert!(console.printed("Eliminar chat con Ana?"));
    assert!(console.printed("Eliminar canal Noticias?"));
}

#[tokio::test]
async fn delete_chats_or_channels_respects_no() {
    let dialogs = sample_dialogs();
    let client = FakeClient::new(dialogs.clone());
    let mut console = ScriptedConsole::new(["n", "y", "n"]);

    let report = actions::delete_chats_or_channels(&client, &dialogs, &mut console)
        .await
        .unwrap();

    assert_eq!(calls(&client.log()), vec![Call::Delete(-1_000_000_000_303)]);
    assert_eq!(report.succeeded, vec![-1_000_000_000_303]);
    assert!(console.printed("✅ Canal Noticias eliminado."));
}

#[tokio::test]
async fn one_failing_dialog_among_five_does_not_stop_the_rest() {
    let dialogs: Vec<Dialog> = (1..=5)
        .map(|i| Dialog::new(i, format!("Contacto {}", i), DialogKind::Person, 0))
        .collect();
    let client = FakeClient::new(dialogs.clone()).failing_on(3);
    let mut console = ScriptedConsole::new(["y"; 5]);

    let report = actions::delete_chats_or_channels(&client, &dialogs, &mut console)
        .await
        .unwrap();

    let expected: Vec<Call> = (1..=5).map(Call::Delete).collect();
    assert_eq!(calls(&client.log()), expected);
    assert_eq!(report.succeeded, vec![1, 2, 4, 5]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].id, 3);
}

#[tokio::test]
async fn leave_groups_only_asks_about_groups() {
    let dialogs = sample_dialogs();
    let client = FakeClient::new(dialogs.clone()).failing_on(-202);
    let mut console = ScriptedConsole::new(["y", "y"]);

    let report = actions::leave_groups(&client, &dialogs, &mut console)
        .await
        .unwrap();

    assert_eq!(
        calls(&client.log()),
        vec![Call::Leave(-202), Call::Leave(-1_000_000_000_505)]
    );
    assert_eq!(report.succeeded, vec![-1_000_000_000_505]);
    assert_eq!(report.failed[0].id, -202);
    assert!(console.printed("Salir del grupo Familia?"));
    assert!(console.printed("⚠️ Error al salir del grupo Familia"));
    assert!(console.printed("✅ Saliste del grupo Rust ES."));
    assert!(!console.printed("Ana"));
}

#[tokio::test]
async fn leave_groups_with_no_groups_does_nothing() {
    let dialogs = vec![Dialog::new(1, "Ana", DialogKind::Person, 0)];
    let client = FakeClient::new(dialogs.clone());
    let mut console = ScriptedConsole::default();

    let report = actions::leave_groups(&client, &dialogs, &mut console)
        .await
        .unwrap();

    assert!(calls(&client.log()).is_empty());
    assert_eq!(report.attempted(), 0);
    assert!(!console.printed("Resumen"));
}

#[tokio::test]
async fn console_failure_aborts_bulk_handler() {
    let dialogs = sample_dialogs();
    let client = FakeClient::new(dialogs.clone());
    let mut console = ScriptedConsole::new(["y"]);

    let result = actions::delete_chats_or_channels(&client, &dialogs, &mut console).await;

    assert!(matches!(result, Err(Error::PromptError(_))));
    assert_eq!(calls(&client.log()), vec![Call::Delete(101)]);
}

#[tokio::test]
async fn send_message_resolves_group_and_sends() {
    let client = FakeClient::new(sample_dialogs());
    let mut console = ScriptedConsole::new(["Rust ES", "Hola a todos"]);

    let report = actions::send_message_to_group(&client, &mut console)
        .await
        .unwrap();

    assert!(report.is_sent());
    assert_eq!(report.outcome, Ok(-1_000_000_000_505));
    assert_eq!(
        calls(&client.log()),
        vec![
            Call::Resolve("Rust ES".into()),
            Call::Send(-1_000_000_000_505, "Hola a todos".into())
        ]
    );
    assert!(console.printed("✅ Mensaje enviado correctamente al grupo Rust ES"));
}

#[tokio::test]
async fn send_message_to_unknown_group_is_reported() {
    let client = FakeClient::new(sample_dialogs());
    let mut console = ScriptedConsole::new(["Inexistente", "Hola"]);

    let report = actions::send_message_to_group(&client, &mut console)
        .await
        .unwrap();

    assert!(!report.is_sent());
    assert_eq!(report.target, "Inexistente");
    assert_eq!(calls(&client.log()), vec![Call::Resolve("Inexistente".into())]);
    assert!(console.printed("⚠️ Error al enviar mensaje"));
}

#[tokio::test]
async fn send_message_failure_is_reported() {
    let client = FakeClient::new(sample_dialogs()).failing_on(-202);
    let mut console = ScriptedConsole::new(["Familia", "Hola"]);

    let report = actions::send_message_to_group(&client, &mut console)
        .await
        .unwrap();

    assert!(matches!(report.outcome, Err(ref reason) if reason.contains("CHAT_ADMIN_REQUIRED")));
}

#[test]
fn show_current_chats_labels_each_kind() {
    let mut console = ScriptedConsole::default();

    actions::show_current_chats(&sample_dialogs(), &mut console);

    assert!(console.printed("💬 Chat con: Ana"));
    assert!(console.printed("👥 Grupo: Familia"));
    assert!(console.printed("📡 Canal: Noticias"));
    assert!(console.printed("👥 Grupo: Rust ES"));
    let listed = console
        .output()
        .iter()
        .filter(|l| l.contains(": "))
        .count();
    assert_eq!(listed, 5);
}

#[test]
fn update_api_credentials_changes_only_target_record() {
    let dir = tempdir().unwrap();
    let store = JsonFileStore::new(dir.path().join("sessions.json"));
    let first = SessionRecord::new("+5212345", "1", "a");
    let second = SessionRecord::new("+34600111222", "2", "b");
    store.save(&[first.clone(), second.clone()]).unwrap();

    let mut console = ScriptedConsole::new(["42", "nuevo_hash"]);
    let updated =
        actions::update_api_credentials(&store, 1, "plus34600111222", &mut console).unwrap();

    assert_eq!(updated.api_id, "42");
    let reloaded = JsonFileStore::new(store.path()).load().unwrap();
    assert_eq!(reloaded[0], first);
    assert_eq!(
        reloaded[1],
        SessionRecord {
            api_id: "42".into(),
            api_hash: "nuevo_hash".into(),
            ..second
        }
    );
    assert!(console.printed("han sido actualizadas correctamente"));
}

#[test]
fn update_api_credentials_for_missing_session_fails() {
    let dir = tempdir().unwrap();
    let store = JsonFileStore::new(dir.path().join("sessions.json"));
    let mut console = ScriptedConsole::new(["42", "h"]);

    let err = actions::update_api_credentials(&store, 0, "plus000", &mut console).unwrap_err();

    assert!(matches!(err, Error::SessionNotFound(_)));
    assert!(store.load().unwrap().is_empty());
}

#[tokio::test]
async fn statistics_sum_unread_counts() {
    let dialogs = vec![
        Dialog::new(1, "Ana", DialogKind::Person, 0),
        Dialog::new(-2, "Familia", DialogKind::Group, 2),
        Dialog::new(-1_000_000_000_003, "Noticias", DialogKind::Channel, 5),
    ];
    let client = FakeClient::new(dialogs);
    let mut console = ScriptedConsole::default();

    let stats = actions::view_interaction_statistics(&client, &mut console)
        .await
        .unwrap();

    assert_eq!(stats.unread_total, 7);
    assert_eq!(stats.dialog_count, 3);
    assert_eq!(calls(&client.log()), vec![Call::List]);
    assert!(console.printed("Total de mensajes no leídos: 7"));
    assert!(console.printed("Total de chats: 3"));
}
