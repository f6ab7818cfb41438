//! Session store behaviour on top of the file-backed key-value store

use nexus_core::{StorageConfig, StoredUser, User};
use nexus_session::{FileStore, KeyValueStore, SessionStore, StorageKeys};

fn sample_users() -> Vec<StoredUser> {
    vec![
        StoredUser::new(
            User {
                id: "7f3c".to_string(),
                username: "ada".to_string(),
                email: "ada@example.com".to_string(),
                banner_url: Some("https://cdn.example.com/banners/ada.png".to_string()),
            },
            "$argon2id$v=19$stub",
        ),
        StoredUser::new(
            User {
                id: "91ab".to_string(),
                username: "grace".to_string(),
                email: "grace@example.com".to_string(),
                banner_url: None,
            },
            "$argon2id$v=19$other",
        ),
    ]
}

#[test]
fn users_survive_reopening_the_store() {
    let dir = tempfile::tempdir().unwrap();
    let users = sample_users();

    {
        let sessions = SessionStore::new(FileStore::new(dir.path()).unwrap());
        sessions.save_users(&users).unwrap();
        sessions.save_current_user(&users[0]).unwrap();
    }

    let sessions = SessionStore::new(FileStore::new(dir.path()).unwrap());
    assert_eq!(sessions.get_users(), users);
    assert_eq!(sessions.get_current_user(), Some(users[0].user.clone()));
}

#[test]
fn session_file_never_contains_the_hash() {
    let dir = tempfile::tempdir().unwrap();
    let sessions = SessionStore::new(FileStore::new(dir.path()).unwrap());

    for user in sample_users() {
        sessions.save_current_user(user.clone()).unwrap();

        let raw = std::fs::read_to_string(dir.path().join("nexus_current_user.json")).unwrap();
        assert!(!raw.contains("passwordHash"));
        assert!(!raw.contains(&user.password_hash));
    }
}

#[test]
fn corrupt_files_read_as_absent() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("nexus_all_users.json"), "[{\"id\":").unwrap();
    std::fs::write(dir.path().join("nexus_current_user.json"), "garbage").unwrap();

    let sessions = SessionStore::new(FileStore::new(dir.path()).unwrap());
    assert!(sessions.get_users().is_empty());
    assert!(sessions.get_current_user().is_none());

    // Writing replaces the corrupt content
    sessions.save_users(&sample_users()).unwrap();
    assert_eq!(sessions.get_users().len(), 2);
}

#[test]
fn clear_removes_the_session_file() {
    let dir = tempfile::tempdir().unwrap();
    let sessions = SessionStore::new(FileStore::new(dir.path()).unwrap());

    sessions.save_current_user(&sample_users()[1]).unwrap();
    assert!(dir.path().join("nexus_current_user.json").exists());

    sessions.clear_current_user().unwrap();
    assert!(!dir.path().join("nexus_current_user.json").exists());
    assert!(sessions.get_current_user().is_none());
}

#[test]
fn keys_from_configuration() {
    let dir = tempfile::tempdir().unwrap();
    let config = StorageConfig {
        data_dir: dir.path().display().to_string(),
        users_key: "demo_users".to_string(),
        session_key: "demo_session".to_string(),
    };

    let store = FileStore::new(config.resolved_data_dir()).unwrap();
    let sessions = SessionStore::with_keys(store.clone(), StorageKeys::from(&config));
    sessions.save_users(&sample_users()).unwrap();

    assert!(store.get("demo_users").unwrap().is_some());
    assert!(dir.path().join("demo_users.json").exists());
}

#[test]
fn invalid_configured_key_surfaces_on_write_but_not_on_read() {
    let dir = tempfile::tempdir().unwrap();
    let keys = StorageKeys {
        users: "../users".to_string(),
        session: "session".to_string(),
    };
    let sessions = SessionStore::with_keys(FileStore::new(dir.path()).unwrap(), keys);

    assert!(sessions.get_users().is_empty());
    assert!(sessions.save_users(&sample_users()).is_err());
}
