// Fake `bw` executable shared by the integration test binaries.
#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const CLIENT_ID: &str = "user.test";
pub const CLIENT_SECRET: &str = "s3cret";
pub const MASTER_PASSWORD: &str = "master";
pub const SESSION: &str = "abc123";
pub const SERVER_URL: &str = "https://vault.example.com";

/// Items printed by `bw list items`, shaped like real output: unset members
/// are `null`, a secure note has no `login`, and one login has no `uris`.
pub const ITEMS_JSON: &str = r#"[
  {
    "passwordHistory": null,
    "revisionDate": "2024-01-02T03:04:05.000Z",
    "creationDate": "2023-06-01T00:00:00.000Z",
    "deletedDate": null,
    "object": "item",
    "id": "0c3d9e5a-0001",
    "organizationId": null,
    "folderId": "f-work",
    "type": 1,
    "reprompt": 0,
    "name": "GitHub",
    "notes": null,
    "favorite": true,
    "login": {
      "uris": [{"match": null, "uri": "https://github.com"}],
      "username": "octocat",
      "password": "ghp_secret",
      "totp": null,
      "passwordRevisionDate": null
    },
    "collectionIds": []
  },
  {
    "passwordHistory": [{"lastUsedDate": "2024-02-01T12:00:00.000Z", "password": "1234"}],
    "revisionDate": "2024-02-02T00:00:00.000Z",
    "creationDate": "2024-02-01T00:00:00.000Z",
    "deletedDate": null,
    "object": "item",
    "id": "0c3d9e5a-0002",
    "organizationId": null,
    "folderId": null,
    "type": 2,
    "reprompt": 1,
    "name": "Bank PIN",
    "notes": "4321",
    "favorite": false,
    "secureNote": {"type": 0},
    "collectionIds": []
  },
  {
    "revisionDate": "2024-03-03T00:00:00.000Z",
    "creationDate": "2024-03-03T00:00:00.000Z",
    "deletedDate": null,
    "object": "item",
    "id": "0c3d9e5a-0003",
    "organizationId": "org-1",
    "folderId": null,
    "type": 1,
    "name": "Router admin",
    "notes": null,
    "favorite": false,
    "login": {
      "username": "admin",
      "password": null
    },
    "collectionIds": ["c1"]
  }
]"#;

const SCRIPT: &str = r#"#!/bin/sh
dir="$(dirname "$0")"
echo "$*" >> "$dir/calls.log"

case "$1" in
  --version)
    if [ -f "$dir/hang" ]; then sleep 10; fi
    echo "2024.6.0"
    ;;
  config)
    echo "Saved setting \`config\`."
    ;;
  login)
    if [ -f "$dir/logged_in" ]; then
      echo "You are already logged in as user@example.com." >&2
      exit 1
    fi
    if [ "$BW_CLIENTID" = "user.test" ] && [ "$BW_CLIENTSECRET" = "s3cret" ]; then
      touch "$dir/logged_in"
      echo "You are logged in!"
    else
      echo "client_id or client_secret is incorrect. Try again." >&2
      exit 1
    fi
    ;;
  unlock)
    if [ -n "$BW_CLIENTSECRET" ]; then echo "client secret leaked into unlock" >&2; exit 9; fi
    if [ "$BW_PASSWORD" = "master" ]; then
      printf 'abc123\n'
    else
      echo "Invalid master password." >&2
      exit 1
    fi
    ;;
  list)
    if [ -n "$BW_PASSWORD" ]; then echo "password leaked into list" >&2; exit 9; fi
    if [ "$BW_SESSION" = "abc123" ]; then
      cat "$dir/items.json"
    else
      echo "Vault is locked." >&2
      exit 1
    fi
    ;;
  *)
    echo "unknown command: $1" >&2
    exit 2
    ;;
esac
"#;

/// A throwaway directory holding an executable `bw` shell script.
pub struct FakeBw {
    dir: TempDir,
    path: PathBuf,
}

impl FakeBw {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("bw");

        fs::write(&path, SCRIPT).expect("write fake bw");
        fs::write(dir.path().join("items.json"), ITEMS_JSON).expect("write items");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("chmod fake bw");

        Self { dir, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn path_str(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }

    /// Arguments of every invocation so far, one entry per call.
    pub fn calls(&self) -> Vec<String> {
        fs::read_to_string(self.dir.path().join("calls.log"))
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    /// Make `bw login` answer "already logged in".
    pub fn set_logged_in(&self) {
        fs::write(self.dir.path().join("logged_in"), "").expect("mark logged in");
    }

    /// Make `bw --version` sleep long enough to trip a short timeout.
    pub fn set_hang(&self) {
        fs::write(self.dir.path().join("hang"), "").expect("mark hang");
    }

    pub fn missing_path(&self) -> String {
        self.dir.path().join("not-bw").to_string_lossy().into_owned()
    }
}
