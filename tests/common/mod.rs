#![allow(dead_code)]

use std::path::PathBuf;
use std::process::{Command, Output};
use std::sync::Arc;

use serde_json::{Value, json};
use tempfile::TempDir;

use mailboard::cache::CacheOptions;
use mailboard::fixtures::demo_user;
use mailboard::remote::ApiClient;
use mailboard::remote::mock::MockTransport;
use mailboard::session::SessionStore;

/// Runs the mailboard binary against a private config and session file.
pub struct MailboardTest {
    pub temp_dir: TempDir,
}

impl MailboardTest {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        MailboardTest { temp_dir }
    }

    pub fn config_path(&self) -> PathBuf {
        self.temp_dir.path().join("config.yaml")
    }

    pub fn session_path(&self) -> PathBuf {
        self.temp_dir.path().join("session.json")
    }

    pub fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_mailboard"))
            .args(args)
            .current_dir(self.temp_dir.path())
            .env("MAILBOARD_CONFIG", self.config_path())
            .env("MAILBOARD_SESSION", self.session_path())
            // Nothing listens here, so an accidental network call fails fast.
            .env("MAILBOARD_API_URL", "http://127.0.0.1:9")
            .env_remove("RUST_LOG")
            .output()
            .expect("Failed to execute mailboard command")
    }

    pub fn run_success(&self, args: &[&str]) -> String {
        let output = self.run(args);
        if !output.status.success() {
            panic!(
                "Command {:?} failed with status {:?}\nstdout: {}\nstderr: {}",
                args,
                output.status,
                String::from_utf8_lossy(&output.stdout),
                String::from_utf8_lossy(&output.stderr)
            );
        }
        String::from_utf8_lossy(&output.stdout).to_string()
    }

    pub fn run_failure(&self, args: &[&str]) -> String {
        let output = self.run(args);
        assert!(
            !output.status.success(),
            "Expected command {:?} to fail, but it succeeded",
            args
        );
        String::from_utf8_lossy(&output.stderr).to_string()
    }

    pub fn run_json(&self, args: &[&str]) -> Value {
        let stdout = self.run_success(args);
        serde_json::from_str(&stdout).expect("Command did not print valid JSON")
    }
}

pub fn contact_json(id: &str, company: &str) -> Value {
    json!({
        "id": id,
        "email": format!("{id}@example.com"),
        "firstName": "Test",
        "lastName": id.to_uppercase(),
        "company": company,
        "isSubscribed": true,
        "source": "website"
    })
}

/// A `GET /contacts` body holding `ids` on page `page` of `total` records.
pub fn contact_page(ids: &[&str], page: u32, total: u64) -> Value {
    json!({
        "data": ids.iter().map(|id| contact_json(id, "Acme")).collect::<Vec<_>>(),
        "pagination": {
            "page": page,
            "limit": 10,
            "total": total,
            "totalPages": total.div_ceil(10)
        }
    })
}

/// Signed-in session kept in memory only.
pub fn signed_in_session() -> SessionStore {
    let session = SessionStore::in_memory();
    session
        .sign_in("test-token".to_string(), demo_user())
        .expect("sign in");
    session
}

pub fn client(mock: &Arc<MockTransport>, session: SessionStore) -> ApiClient {
    ApiClient::new(mock.clone(), session)
}

pub fn no_retry() -> CacheOptions {
    let mut options = CacheOptions::default();
    options.retry.max_retries = 0;
    options
}
