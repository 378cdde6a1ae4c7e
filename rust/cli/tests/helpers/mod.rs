//! Shared helpers for the CLI integration tests.
//!
//! `run_cli` invokes the library entry point in-process and captures both
//! streams. Tests that touch the environment must be marked `#[serial]`.

#![allow(dead_code)]
use twentyone_cli::config::{CONFIG_ENV, PLAYERS_ENV, SEED_ENV, STRATEGY_ENV};

#[derive(Debug, Clone)]
pub struct CliResult {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

/// Sets variables for the lifetime of the guard and restores them on drop.
pub struct EnvGuard {
    restores: Vec<(String, Option<String>)>,
}

impl EnvGuard {
    pub fn apply(pairs: &[(&str, &str)]) -> Self {
        let mut restores = Vec::new();
        for key in [CONFIG_ENV, PLAYERS_ENV, SEED_ENV, STRATEGY_ENV] {
            restores.push((key.to_string(), std::env::var(key).ok()));
            unsafe { std::env::remove_var(key) };
        }
        for (key, value) in pairs {
            if !restores.iter().any(|(k, _)| k == key) {
                restores.push((key.to_string(), std::env::var(key).ok()));
            }
            unsafe { std::env::set_var(key, value) };
        }
        EnvGuard { restores }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, previous) in self.restores.iter().rev() {
            match previous {
                Some(val) => unsafe { std::env::set_var(key, val) },
                None => unsafe { std::env::remove_var(key) },
            }
        }
    }
}

pub fn run_cli(args: &[&str]) -> CliResult {
    run_cli_with_env(args, &[])
}

pub fn run_cli_with_env(args: &[&str], env: &[(&str, &str)]) -> CliResult {
    let _guard = EnvGuard::apply(env);
    let mut out: Vec<u8> = Vec::new();
    let mut err: Vec<u8> = Vec::new();
    let argv = std::iter::once("twentyone").chain(args.iter().copied());
    let exit_code = twentyone_cli::run(argv, &mut out, &mut err);
    CliResult {
        exit_code,
        stdout: String::from_utf8_lossy(&out).into_owned(),
        stderr: String::from_utf8_lossy(&err).into_owned(),
    }
}
