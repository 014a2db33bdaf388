//! Tests for credential intake

use tg_session_manager::commands::add_new_session;
use tg_session_manager::session::{MemoryStore, SessionStorage};

use super::ScriptedConsole;

#[test]
fn appends_record_with_derived_name() {
    let store = MemoryStore::new();
    let mut console = ScriptedConsole::new(["+5212345", "1", "a"]);

    let record = add_new_session(&store, &mut console).unwrap();

    assert_eq!(record.name, "plus5212345");
    assert_eq!(store.load().unwrap(), vec![record]);
    assert!(console.printed("agregada correctamente"));
    assert!(console.printed("my.telegram.org"));
}

#[test]
fn stores_input_without_validation() {
    let store = MemoryStore::new();
    let mut console = ScriptedConsole::new(["not a phone", "abc", ""]);

    let record = add_new_session(&store, &mut console).unwrap();

    assert_eq!(record.name, "not a phone");
    assert_eq!(record.api_id, "abc");
    assert_eq!(record.api_hash, "");
}

#[test]
fn missing_answer_leaves_store_untouched() {
    let store = MemoryStore::new();
    let mut console = ScriptedConsole::new(["+34600"]);

    assert!(add_new_session(&store, &mut console).is_err());
    assert!(store.load().unwrap().is_empty());
}
