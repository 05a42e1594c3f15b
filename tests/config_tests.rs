use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use next_settings::{Config, Error, Resolved, Schema, Setting, Value, settings_map};

fn string(value: &str) -> Value {
    Value::String(value.to_string())
}

fn jdbc_dsn() -> Setting {
    Setting::new()
        .default("sqlite")
        .constructor(|raw| match raw {
            Some(Value::String(driver)) => Ok(Value::String(format!("jdbc:{driver}"))),
            other => Err(format!("dsn must be a string, got {other:?}").into()),
        })
}

/// Schema with a constructor-backed scalar and a two-field nested group.
fn app_schema() -> Arc<Schema> {
    let schema = Schema::compile(|s| {
        s.setting("dsn", jdbc_dsn())?;
        s.setting("debug", Setting::new())?;
        s.nested("database", |db| {
            db.setting("host", Setting::new().default("localhost"))?;
            db.setting("port", Setting::new().default(5432u16))?;
            Ok(())
        })?;
        Ok(())
    })
    .expect("Failed to compile schema");

    Arc::new(schema)
}

#[test]
fn test_undeclared_default_resolves_to_null() {
    let mut config = Config::new(app_schema());

    assert_eq!(config.value("debug").unwrap(), Value::Option(None));

    config.set("debug", true).unwrap();
    assert_eq!(config.value("debug").unwrap(), Value::Bool(true));
}

#[test]
fn test_constructor_applies_to_default_and_writes() {
    let mut config = Config::new(app_schema());
    assert_eq!(config.value("dsn").unwrap(), string("jdbc:sqlite"));

    config.set("dsn", "postgres").unwrap();
    assert_eq!(config.value("dsn").unwrap(), string("jdbc:postgres"));
}

#[test]
fn test_constructor_runs_over_undefined() {
    let schema = Schema::compile(|s| {
        s.setting(
            "workers",
            Setting::new().constructor(|raw| Ok(raw.unwrap_or(Value::U32(4)))),
        )?;
        Ok(())
    })
    .unwrap();
    let config = Config::new(Arc::new(schema));

    assert_eq!(config.get_as::<u32>("workers").unwrap(), 4);
}

#[test]
fn test_constructor_runs_once_per_write_and_on_every_default_read() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let schema = Schema::compile(move |s| {
        s.setting(
            "tags",
            Setting::new()
                .default(vec!["a"])
                .constructor(move |raw| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(raw.unwrap_or(Value::Seq(Vec::new())))
                }),
        )?;
        Ok(())
    })
    .unwrap();
    let mut config = Config::new(Arc::new(schema));

    config.value("tags").unwrap();
    config.value("tags").unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2, "defaults are resolved on each read");

    config.set("tags", vec!["b", "c"]).unwrap();
    config.value("tags").unwrap();
    config.value("tags").unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 3, "written values are resolved once");
    assert_eq!(config.get_as::<Vec<String>>("tags").unwrap(), ["b", "c"]);
}

#[test]
fn test_constructor_failure_names_the_setting() {
    let mut config = Config::new(app_schema());

    match config.set("dsn", 42) {
        Err(Error::Constructor { setting, .. }) => assert_eq!(setting, "dsn"),
        other => panic!("Expected Constructor error, got {other:?}"),
    }
    assert_eq!(config.value("dsn").unwrap(), string("jdbc:sqlite"));
}

#[test]
fn test_unknown_setting_is_an_error() {
    let mut config = Config::new(app_schema());

    assert!(matches!(config.get("missing"), Err(Error::UnknownSetting(name)) if name == "missing"));
    assert!(matches!(config.set("missing", 1), Err(Error::UnknownSetting(_))));
    assert!(matches!(
        config.update(settings_map! { "database" => settings_map! { "user" => "root" } }),
        Err(Error::UnknownSetting(name)) if name == "user"
    ));
}

#[test]
fn test_get_returns_nested_config() {
    let config = Config::new(app_schema());

    let database = match config.get("database").unwrap() {
        Resolved::Nested(database) => database,
        other => panic!("Expected a nested config, got {other:?}"),
    };
    assert_eq!(database.value("host").unwrap(), string("localhost"));
    assert!(matches!(config.nested("dsn"), Err(Error::NotNested(_))));
}

#[test]
fn test_finalize_freezes_nested_values() {
    let mut config = Config::new(app_schema());
    config.finalize();

    assert!(config.is_frozen());
    assert!(matches!(config.set("dsn", "mysql"), Err(Error::FrozenConfig(name)) if name == "dsn"));
    assert!(matches!(
        config.set_path("database.host", "remote"),
        Err(Error::FrozenConfig(name)) if name == "host"
    ));
    assert!(config.nested("database").unwrap().is_frozen());

    // Finalizing again is a no-op.
    config.finalize();
    assert!(config.is_frozen());
}

#[test]
fn test_nested_to_map_matches_direct_reads() {
    let mut config = Config::new(app_schema());
    config.set_path("database.host", "db.internal").unwrap();

    let map = config.to_map().unwrap();
    let names: Vec<_> = map.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(names, ["dsn", "debug", "database"]);

    let (_, database) = &map[2];
    let database = match database {
        Value::Map(fields) => fields,
        other => panic!("Expected nested map, got {other:?}"),
    };
    assert_eq!(database.len(), 2);
    assert_eq!(
        database[&string("host")],
        config.nested("database").unwrap().value("host").unwrap()
    );
    assert_eq!(
        database[&string("port")],
        config.get_path("database.port").unwrap()
    );
}

#[test]
fn test_update_descends_into_nested_groups() {
    let mut config = Config::new(app_schema());

    config
        .update(settings_map! {
            "dsn" => "postgres",
            "database" => settings_map! { "port" => 6543u16 },
        })
        .unwrap();

    assert_eq!(config.value("dsn").unwrap(), string("jdbc:postgres"));
    assert_eq!(config.get_path("database.port").unwrap(), Value::U16(6543));
    assert_eq!(config.get_path("database.host").unwrap(), string("localhost"));
}

#[test]
fn test_update_rejects_scalar_for_nested_group() {
    let mut config = Config::new(app_schema());

    let result = config.update(settings_map! { "database" => "sqlite://memory" });
    assert!(matches!(result, Err(Error::InvalidUpdateValue(name)) if name == "database"));
}

#[test]
fn test_update_rejects_non_map_batch() {
    let mut config = Config::new(app_schema());

    assert!(matches!(config.update(Value::Bool(true)), Err(Error::Argument(_))));
}

#[test]
fn test_update_is_not_transactional() {
    let mut config = Config::new(app_schema());

    // Sorted order, not written order: `database` and `debug` land before `dsn` fails.
    let result = config.update(settings_map! {
        "dsn" => 1,
        "debug" => true,
        "database" => settings_map! { "host" => "remote" },
    });

    assert!(matches!(result, Err(Error::Constructor { .. })));
    assert_eq!(config.get_path("database.host").unwrap(), string("remote"));
    assert_eq!(config.value("debug").unwrap(), Value::Bool(true));
}

#[test]
fn test_duplicate_is_deep_and_writable() {
    let mut original = Config::new(app_schema());
    original.set_path("database.host", "primary").unwrap();
    original.finalize();

    let mut copy = original.duplicate();
    assert!(!copy.is_frozen());
    assert!(!copy.nested("database").unwrap().is_frozen());

    copy.set_path("database.host", "replica").unwrap();
    assert_eq!(original.get_path("database.host").unwrap(), string("primary"));
    assert_eq!(copy.get_path("database.host").unwrap(), string("replica"));
}

#[test]
fn test_structural_equality_ignores_identity() {
    let mut first = Config::new(app_schema());
    let mut second = Config::new(app_schema());
    assert_eq!(first, second);

    first.set("debug", false).unwrap();
    assert_ne!(first, second);

    second.set("debug", false).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_deserialize_into_typed_struct() {
    #[derive(Debug, serde::Deserialize)]
    struct Database {
        host: String,
        port: u16,
    }

    let mut config = Config::new(app_schema());
    config.set_path("database.port", 15432u16).unwrap();

    let database: Database = config.nested("database").unwrap().deserialize().unwrap();
    assert_eq!(database.host, "localhost");
    assert_eq!(database.port, 15432);
}

#[test]
fn test_set_as_serializes_typed_values() {
    #[derive(serde::Serialize)]
    struct Flags {
        verbose: bool,
    }

    let mut config = Config::new(app_schema());
    config.set_as("debug", &Flags { verbose: true }).unwrap();

    assert_eq!(
        config.value("debug").unwrap(),
        settings_map! { "verbose" => true }
    );
}

#[test]
fn test_rebind_keeps_values_for_surviving_settings() {
    let mut config = Config::new(app_schema());
    config.set("debug", true).unwrap();
    config.set_path("database.host", "kept").unwrap();

    let mut schema = (**config.schema()).clone();
    schema
        .declare(
            next_settings::SettingDefinition::builder()
                .name("timeout")
                .default_value(Value::U32(30))
                .build()
                .unwrap(),
        )
        .unwrap();

    let rebound = config.rebind(Arc::new(schema));
    assert_eq!(rebound.value("debug").unwrap(), Value::Bool(true));
    assert_eq!(rebound.get_path("database.host").unwrap(), string("kept"));
    assert_eq!(rebound.value("timeout").unwrap(), Value::U32(30));
}

#[test]
fn test_rebind_drops_values_of_redeclared_settings() {
    let mut config = Config::new(app_schema());
    config.set("dsn", "postgres").unwrap();
    config.set("debug", true).unwrap();

    let mut schema = (**config.schema()).clone();
    schema
        .declare(
            next_settings::SettingDefinition::builder()
                .name("dsn")
                .default_value(string("mysql"))
                .build()
                .unwrap(),
        )
        .unwrap();

    let rebound = config.rebind(Arc::new(schema));
    assert_eq!(rebound.value("dsn").unwrap(), string("mysql"));
    assert_eq!(rebound.value("debug").unwrap(), Value::Bool(true));
    assert_eq!(config.value("dsn").unwrap(), string("jdbc:postgres"));
}
