use parley_transport::{CommandScope, MarkupMode};

use super::support::{text_from, Harness, CHAT};

fn persisted_users(h: &Harness) -> Vec<String> {
    let raw = std::fs::read_to_string(h.path("users.json")).unwrap();
    let doc: serde_json::Value = serde_json::from_str(&raw).unwrap();
    doc["users"]
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u.as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_unknown_user_is_denied() {
    let h = Harness::new();

    h.bot.handle(text_from("mallory", "hello")).await.unwrap();

    assert!(h.client.requests().is_empty());
    assert_eq!(
        h.transport.last_text(),
        "You don't have access to Parley. Ask @root to grant you access."
    );
    assert_eq!(h.transport.sent()[0].mode, MarkupMode::Plain);
}

#[tokio::test]
async fn test_user_without_username_is_denied() {
    let h = Harness::new();
    let mut message = text_from("ada", "hello");
    message.sender.username = None;

    h.bot.handle(message).await.unwrap();
    assert!(h.client.requests().is_empty());
}

#[tokio::test]
async fn test_grant_then_revoke() {
    let h = Harness::new();

    h.bot.handle(text_from("root", "/grant @bob")).await.unwrap();
    assert_eq!(h.transport.last_text(), "Granted access to user @bob");
    assert!(persisted_users(&h).contains(&"bob".to_string()));

    h.bot.handle(text_from("bob", "hi")).await.unwrap();
    assert_eq!(h.client.requests().len(), 1);

    h.bot.handle(text_from("root", "/revoke bob")).await.unwrap();
    assert_eq!(h.transport.last_text(), "Revoked access to user @bob");
    assert!(!persisted_users(&h).contains(&"bob".to_string()));

    h.bot.handle(text_from("bob", "still there?")).await.unwrap();
    assert_eq!(h.client.requests().len(), 1);
    assert!(h.transport.last_text().starts_with("You don't have access"));
}

#[tokio::test]
async fn test_grant_reports_existing_users() {
    let h = Harness::new();

    h.bot.handle(text_from("root", "/grant ada carl dora")).await.unwrap();
    assert_eq!(
        h.transport.last_text(),
        "User @ada already had access!\nGranted access to 2 users"
    );
    assert_eq!(persisted_users(&h), vec!["root", "ada", "carl", "dora"]);
}

#[tokio::test]
async fn test_grant_without_names_shows_usage() {
    let h = Harness::new();
    h.bot.handle(text_from("root", "/grant")).await.unwrap();
    assert_eq!(h.transport.last_text(), "Usage: /grant <username...>");
}

#[tokio::test]
async fn test_admins_cannot_be_revoked() {
    let h = Harness::new();

    h.bot.handle(text_from("root", "/revoke root ghost")).await.unwrap();
    assert_eq!(
        h.transport.last_text(),
        "User @root is an admin and can't be revoked\nUser @ghost didn't have access"
    );
    assert!(persisted_users(&h).contains(&"root".to_string()));
}

#[tokio::test]
async fn test_admin_commands_are_invalid_for_users() {
    let h = Harness::new();

    h.bot.handle(text_from("ada", "/grant eve")).await.unwrap();
    assert_eq!(h.transport.last_text(), "Command /grant is invalid");
    assert!(!persisted_users(&h).contains(&"eve".to_string()));
}

#[tokio::test]
async fn test_list_users_rereads_the_file() {
    let h = Harness::new();
    std::fs::write(h.path("users.json"), r#"{"users": ["root", "ada", "zoe"]}"#).unwrap();

    h.bot.handle(text_from("root", "/list_users")).await.unwrap();
    assert_eq!(h.transport.last_text(), "Current users are:\n\nroot\nada\nzoe");
}

#[tokio::test]
async fn test_usage_reports() {
    let h = Harness::new();

    h.bot.handle(text_from("root", "/token_usage")).await.unwrap();
    assert_eq!(h.transport.last_text(), "No token usage so far...");
    h.bot.handle(text_from("root", "/image_usage")).await.unwrap();
    assert_eq!(h.transport.last_text(), "No image usage so far...");

    h.client.reply("a", 5);
    h.bot.handle(text_from("root", "hi")).await.unwrap();
    h.client.reply("b", 40);
    h.bot.handle(text_from("ada", "hi")).await.unwrap();
    h.bot.handle(text_from("ada", "/image a lighthouse")).await.unwrap();

    h.bot.handle(text_from("root", "/token_usage")).await.unwrap();
    assert_eq!(h.transport.last_text(), "Token usage per Username:\n@ada: 40\n@root: 5");
    h.bot.handle(text_from("root", "/image_usage")).await.unwrap();
    assert_eq!(
        h.transport.last_text(),
        "Number of images generated per Username:\n@ada: 1"
    );
}

#[tokio::test]
async fn test_admin_menu_installed_once_per_chat() {
    let h = Harness::new();

    h.bot.handle(text_from("ada", "hi")).await.unwrap();
    assert!(h.transport.menus().is_empty());

    h.bot.handle(text_from("root", "/context")).await.unwrap();
    h.bot.handle(text_from("root", "/context")).await.unwrap();

    let menus = h.transport.menus();
    assert_eq!(menus.len(), 1);
    assert_eq!(menus[0].1, CommandScope::Chat(CHAT));
    assert_eq!(menus[0].0.len(), 9);
}

#[tokio::test]
async fn test_register_public_commands() {
    let h = Harness::new();
    h.bot.register_commands().await.unwrap();

    let menus = h.transport.menus();
    assert_eq!(menus.len(), 1);
    assert_eq!(menus[0].1, CommandScope::Default);
    let names: Vec<&str> = menus[0].0.iter().map(|c| c.command.as_str()).collect();
    assert_eq!(names, vec!["context", "context_length", "clear_context", "image"]);
}
