//! `grant config`: show the effective configuration.

use crate::context::AppContext;
use crate::output::{OutputMode, pretty_kv, pretty_section, render};
use clap::Args;
use grant_core::config::{EffectiveConfig, KeySource};
use std::io::Write;

#[derive(Args, Debug, Default)]
pub struct ConfigArgs {}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn effective(ctx: &AppContext) -> EffectiveConfig {
    let chat = ctx.config.chat.clone().with_env_overrides(env_var);
    let api_key = chat.resolve_api_key(env_var).map(|(_, source)| source);
    let output = match ctx.output {
        OutputMode::Pretty => "pretty",
        OutputMode::Text => "text",
        OutputMode::Json => "json",
    };
    EffectiveConfig {
        config_found: ctx.config_path.as_deref().is_some_and(std::path::Path::exists),
        config_path: ctx.config_path.clone(),
        store_path: ctx.store_path.clone(),
        output: output.to_string(),
        lock_timeout_ms: ctx.config.storage.lock_timeout_ms,
        chat,
        api_key,
    }
}

fn describe_key(cfg: &EffectiveConfig) -> String {
    match &cfg.api_key {
        Some(KeySource::Env(name)) => format!("set (from ${name})"),
        Some(KeySource::ConfigFile) => "set (from config file)".to_string(),
        None if cfg.chat.require_key => format!("missing (set ${})", cfg.chat.api_key_env),
        None => "not required".to_string(),
    }
}

fn write_human(out: &mut dyn Write, cfg: &EffectiveConfig, mode: OutputMode) -> std::io::Result<()> {
    let config_file = match &cfg.config_path {
        Some(path) if cfg.config_found => path.display().to_string(),
        Some(path) => format!("{} (not found, using defaults)", path.display()),
        None => "(none)".to_string(),
    };
    let rows = [
        ("config", config_file),
        ("store", cfg.store_path.display().to_string()),
        ("output", cfg.output.clone()),
        ("lock", format!("{} ms", cfg.lock_timeout_ms)),
        ("endpoint", cfg.chat.endpoint.clone()),
        ("model", cfg.chat.model.clone()),
        ("max_tokens", cfg.chat.max_tokens.to_string()),
        ("temperature", cfg.chat.temperature.to_string()),
        ("api key", describe_key(cfg)),
    ];

    if mode.is_pretty() {
        pretty_section(out, "Configuration")?;
        for (key, value) in rows {
            pretty_kv(out, key, value)?;
        }
    } else {
        for (key, value) in rows {
            writeln!(out, "{key}\t{value}")?;
        }
    }
    Ok(())
}

pub fn run_config(_args: &ConfigArgs, ctx: &AppContext) -> anyhow::Result<()> {
    let cfg = effective(ctx);
    render(ctx.output, &cfg, |c, w| write_human(w, c, ctx.output))
}

#[cfg(test)]
mod tests {
    use super::*;
    use grant_core::config::ChatConfig;
    use std::path::PathBuf;

    fn sample(api_key: Option<KeySource>, require_key: bool) -> EffectiveConfig {
        EffectiveConfig {
            config_path: Some(PathBuf::from("/home/me/.config/grant-tracker/config.toml")),
            config_found: false,
            store_path: PathBuf::from("/tmp/grant-tracker.v1.json"),
            output: "text".into(),
            lock_timeout_ms: 2_000,
            chat: ChatConfig {
                require_key,
                api_key: Some("sk-secret".into()),
                ..ChatConfig::default()
            },
            api_key,
        }
    }

    #[test]
    fn key_description_never_shows_the_key() {
        let cfg = sample(Some(KeySource::Env("GRANT_CHAT_API_KEY".into())), true);
        assert_eq!(describe_key(&cfg), "set (from $GRANT_CHAT_API_KEY)");
        assert_eq!(describe_key(&sample(None, true)), "missing (set $GRANT_CHAT_API_KEY)");
        assert_eq!(describe_key(&sample(None, false)), "not required");

        let mut buf = Vec::new();
        write_human(&mut buf, &cfg, OutputMode::Text).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(!text.contains("sk-secret"));
        assert!(text.contains("(not found, using defaults)"));
        assert!(!serde_json::to_string(&cfg).unwrap().contains("sk-secret"));
    }
}
