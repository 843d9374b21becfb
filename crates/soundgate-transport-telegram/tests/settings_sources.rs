use config::{Config, File, FileFormat};
use soundgate_core::config::{ChatRef, GateSettings, FETCH_TIMEOUT_SECS};
use soundgate_transport_telegram::config::{BotSettings, TelegramSettings};

fn load(toml: &str) -> Result<Config, config::ConfigError> {
    Config::builder()
        .add_source(File::from_str(toml, FileFormat::Toml))
        .build()
}

#[test]
fn legacy_key_names_are_accepted() -> Result<(), Box<dyn std::error::Error>> {
    let config = load(
        r#"
bot_token = "123:abc"
channel_username = "@tracks"
admin_user_id = "42"
report_channel_id = "-100200"
"#,
    )?;

    let gate: GateSettings = config.clone().try_deserialize()?;
    let telegram: TelegramSettings = config.try_deserialize()?;
    telegram.validate()?;

    assert_eq!(gate.gating_chat()?, ChatRef::Username("tracks".to_string()));
    assert_eq!(gate.fetch_timeout_secs, FETCH_TIMEOUT_SECS);
    assert_eq!(telegram.telegram_token, "123:abc");
    assert_eq!(telegram.admin_user_id(), Some(42));
    assert_eq!(telegram.report_channel(), Some(ChatRef::Id(-100_200)));

    let settings = BotSettings::new(gate, telegram);
    assert_eq!(settings.gate.users_file.to_string_lossy(), "users.csv");
    Ok(())
}

#[test]
fn private_group_id_and_overrides() -> Result<(), Box<dyn std::error::Error>> {
    let config = load(
        r#"
telegram_token = "123:abc"
gating_group = "-1001234567890"
users_file = "/data/users.csv"
ytdlp_path = "/usr/local/bin/yt-dlp"
fetch_timeout_secs = 120
"#,
    )?;

    let gate: GateSettings = config.try_deserialize()?;
    assert_eq!(gate.gating_chat()?, ChatRef::Id(-1_001_234_567_890));
    assert_eq!(gate.ytdlp_path, "/usr/local/bin/yt-dlp");
    assert_eq!(gate.fetch_timeout_secs, 120);
    Ok(())
}

#[test]
fn missing_group_fails() -> Result<(), Box<dyn std::error::Error>> {
    let config = load(r#"telegram_token = "123:abc""#)?;
    assert!(config.try_deserialize::<GateSettings>().is_err());
    Ok(())
}
