#![allow(dead_code)]

use std::{
    path::{Path, PathBuf},
    process::{Command, Output},
};

/// Create a new thy CLI command isolated from the user's environment
pub fn thy(home: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_thy"));
    cmd.env("HOME", home)
        .env("USERPROFILE", home)
        .env_remove("THY_PROFILE")
        .env_remove("THY_CONFIG")
        .env_remove("THY_AUTH_TOKEN")
        .env_remove("RUST_LOG")
        .args(["--color", "no"]);
    cmd
}

/// Write a config file into `dir` and return its path
pub fn write_config(dir: &Path, contents: &str) -> PathBuf {
    let path = dir.join("thy.yml");
    std::fs::write(&path, contents).expect("Failed to write config file");
    path
}

/// Run a command without blocking the async runtime serving the API mock
pub async fn run(mut cmd: Command) -> Output {
    tokio::task::spawn_blocking(move || cmd.output().expect("Failed to execute thy command"))
        .await
        .expect("Command task panicked")
}
