mod common;

use crossterm::event::KeyCode;
use zvault::models::SecretKind;
use zvault::storage::Vault;
use zvault::ui::theme::MASK;
use zvault::ui::ViewId;

use common::Harness;

#[test]
fn create_reveal_and_delete_password() {
    let mut h = Harness::new();

    h.press(KeyCode::Enter);
    assert_eq!(h.model.view_id(), ViewId::SecretList);
    h.key('n');
    assert_eq!(h.model.view_id(), ViewId::SecretForm);
    assert_eq!(h.model.secret_form().kind(), SecretKind::Password);

    // type selector -> name -> url -> username -> password
    h.press(KeyCode::Enter);
    h.type_str("github");
    h.press(KeyCode::Tab);
    h.press(KeyCode::Tab);
    h.type_str("octocat");
    h.press(KeyCode::Tab);
    h.type_str("hunter2");
    h.ctrl('s');

    assert_eq!(h.model.view_id(), ViewId::SecretList);
    let stored = h.vault.secrets().list().unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].password_value(), "hunter2");

    // all -> password
    h.press(KeyCode::Tab);
    assert_eq!(h.model.secret_list().filter().labels()[1], "password");
    let names: Vec<_> = h.model.secret_list().items().iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, ["github"]);
    assert!(h.screen().contains("github [pw]"));

    h.press(KeyCode::Enter);
    assert_eq!(h.model.view_id(), ViewId::SecretDetail);
    let masked = h.screen();
    assert!(masked.contains(MASK));
    assert!(!masked.contains("hunter2"));

    h.key('s');
    assert!(h.model.secret_detail().is_revealed());
    assert!(h.screen().contains("hunter2"));

    h.key('d');
    assert!(h.screen().contains("(y/n)"));
    h.key('y');
    assert_eq!(h.model.view_id(), ViewId::SecretList);
    assert!(h.model.secret_list().items().is_empty());
    assert!(h.vault.secrets().list().unwrap().is_empty());
}

#[test]
fn search_narrows_the_list() {
    let mut h = Harness::new();
    h.press(KeyCode::Enter);
    for name in ["github", "gitlab", "aws"] {
        h.key('n');
        h.press(KeyCode::Enter);
        h.type_str(name);
        h.press(KeyCode::Tab);
        h.press(KeyCode::Tab);
        h.type_str("me");
        h.press(KeyCode::Tab);
        h.type_str("pw");
        h.ctrl('s');
    }
    assert_eq!(h.model.secret_list().items().len(), 3);

    h.key('/');
    h.type_str("git");
    assert_eq!(h.model.secret_list().items().len(), 2);
    // q is text while searching
    h.key('q');
    assert!(h.effects.is_empty());
    h.press(KeyCode::Esc);
    assert_eq!(h.model.secret_list().items().len(), 3);
}

#[test]
fn missing_name_keeps_the_form_open() {
    let mut h = Harness::new();
    h.press(KeyCode::Enter);
    h.key('n');
    h.ctrl('s');
    assert_eq!(h.model.view_id(), ViewId::SecretForm);
    assert_eq!(h.model.secret_form().error(), Some("name is required"));
    assert!(h.screen().contains("name is required"));
}
