//! Startup fixtures: users (with their session tokens) and tasks.
//!
//! The task and user subsystems live in another service; the seed file gives
//! this one the collaborator records it needs to resolve authors, validate
//! task ids, and authenticate sessions. Extra sessions can come from the
//! `PVDESK_SESSION_TOKENS` env var as `token=userId,token=userId`.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use pvdesk_storage::{PvStorage, TaskRecord, UserRecord};

#[derive(Debug, Deserialize)]
pub struct SeedFile {
    #[serde(default)]
    pub users: Vec<SeedUser>,
    #[serde(default)]
    pub tasks: Vec<SeedTask>,
}

#[derive(Debug, Deserialize)]
pub struct SeedUser {
    pub id: String,
    pub name: String,
    pub email: String,
    /// Session token granting this user's identity, if any.
    pub token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SeedTask {
    pub id: String,
    #[serde(default)]
    pub title: String,
}

/// Load a seed file into the store. Returns the token -> user-id session map.
pub async fn load<S: PvStorage>(
    path: &Path,
    store: &S,
) -> Result<HashMap<String, String>, Box<dyn std::error::Error>> {
    let raw = std::fs::read_to_string(path)?;
    let seed: SeedFile = serde_json::from_str(&raw)?;

    let mut sessions = HashMap::new();
    let (user_count, task_count) = (seed.users.len(), seed.tasks.len());

    for user in seed.users {
        if let Some(token) = &user.token {
            sessions.insert(token.clone(), user.id.clone());
        }
        store
            .insert_user(UserRecord {
                id: user.id,
                name: user.name,
                email: user.email,
            })
            .await?;
    }
    for task in seed.tasks {
        store.insert_task(TaskRecord::new(task.id, task.title)).await?;
    }

    eprintln!(
        "Loaded seed {}: {user_count} user(s), {task_count} task(s)",
        path.display()
    );
    Ok(sessions)
}

/// Parse `PVDESK_SESSION_TOKENS` (`token=userId,token=userId`) into the
/// session map. Malformed entries are skipped with a warning.
pub fn sessions_from_env(sessions: &mut HashMap<String, String>) {
    let Ok(raw) = std::env::var("PVDESK_SESSION_TOKENS") else {
        return;
    };
    for entry in raw.split(',').filter(|e| !e.trim().is_empty()) {
        match entry.trim().split_once('=') {
            Some((token, user_id)) if !token.is_empty() && !user_id.is_empty() => {
                sessions.insert(token.to_string(), user_id.to_string());
            }
            _ => eprintln!("Warning: ignoring malformed PVDESK_SESSION_TOKENS entry '{entry}'"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_file_parses_with_defaults() {
        let seed: SeedFile = serde_json::from_str(
            r#"{
                "users": [{"id": "u1", "name": "Amina", "email": "a@x.com", "token": "tok-1"}],
                "tasks": [{"id": "t1"}]
            }"#,
        )
        .unwrap();
        assert_eq!(seed.users[0].token.as_deref(), Some("tok-1"));
        assert_eq!(seed.tasks[0].title, "");
    }
}
