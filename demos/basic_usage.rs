use next_settings::{Configurable, Setting, Value, settings_map};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Declare the settings shared by every service.
    let mut base = Configurable::new("Service");
    base.setting(
        "dsn",
        Setting::new()
            .default("sqlite")
            .constructor(|raw| match raw {
                Some(Value::String(driver)) => Ok(Value::String(format!("jdbc:{driver}"))),
                _ => Err("dsn must be a string".into()),
            })
            .reader(),
    )?;
    base.nested("http", |http| {
        http.setting("port", Setting::new().default(8080))?;
        http.setting("keep_alive", Setting::new().default(true))?;
        Ok(())
    })?;

    // A derived service shares the schema until it declares its own settings.
    let mut api = base.derive("Api");
    api.setting("rate_limit", Setting::new().default(100))?;

    api.config_mut().update(settings_map! {
        "dsn" => "postgres",
        "http" => settings_map! { "port" => 9000 },
    })?;

    println!("Base config:");
    println!("{}", base.config().to_toml_string()?);
    println!("Api config:");
    println!("{}", api.config().to_toml_string()?);
    println!("Api dsn via reader: {:?}", api.read("dsn")?);

    // Staged changes are applied to a fresh snapshot, never to the live value.
    let mut staged = api.config().stage();
    staged.set("rate_limit", 250)?;
    let next = staged.commit()?;
    println!("Staged rate limit: {:?}", next.value("rate_limit")?);

    // Finalized configuration rejects further writes.
    api.finalize();
    match api.config_mut().set("rate_limit", 1) {
        Ok(()) => println!("Write succeeded"),
        Err(e) => println!("Write failed (expected): {e}"),
    }

    Ok(())
}
