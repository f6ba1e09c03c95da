use crate::error::ConfigError;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use settings::{Config, Interval, Output, OutputFormat, Study};

/// Loads the application configuration from the `config.toml` file.
///
/// This function is the primary entry point for this crate. It reads the configuration file,
/// applies `AFTERSHOCK__*` environment overrides (e.g. `AFTERSHOCK__STUDY__RADIUS=10`),
/// deserializes the result into our strongly-typed `Config` struct and validates it.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(Path::new("config.toml"))
}

/// Same as [`load_config`], reading from an explicit path.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::from(path))
        .add_source(
            config::Environment::with_prefix("AFTERSHOCK")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    finish(builder)
}

/// Parses configuration from an in-memory TOML document, without environment overrides.
pub fn parse_config(toml: &str) -> Result<Config, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::from_str(toml, config::FileFormat::Toml))
        .build()?;

    finish(builder)
}

fn finish(builder: config::Config) -> Result<Config, ConfigError> {
    // Attempt to deserialize the entire configuration into our `Config` struct
    let config = builder.try_deserialize::<Config>()?;
    config.validate()?;

    tracing::debug!(
        events = config.events.len(),
        industries = config.industries.len(),
        radius = config.study.radius,
        "Configuration loaded."
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::io::Write;

    const MINIMAL: &str = r#"
benchmark = "SPY"

[[industries]]
name = "Electric Utilities"
symbol = "XLU"

[[industries]]
name = "Oil & Gas"
symbol = "XLE"

[[events]]
label = "Hurricane Ida (Aug 29, 2021)"
date = "2021-08-29"
category = "Hurricanes"

[[events]]
label = "Camp Fire California (Nov 8, 2018)"
date = "2018-11-08"
category = "Wildfires"

[[events]]
label = "Hurricane Harvey (Aug 25, 2017)"
date = "2017-08-25"
category = "Hurricanes"
"#;

    #[test]
    fn parses_minimal_config_with_defaults() {
        let config = parse_config(MINIMAL).expect("valid config");

        assert_eq!(config.study.radius, 20);
        assert_eq!(config.study.scale, 100.0);
        assert_eq!(config.output.format, OutputFormat::Table);
        assert_eq!(config.intervals.len(), 3);
        assert_eq!(config.intervals[2], Interval { name: "T→T+10".to_string(), from: 0, to: 10 });
        assert_eq!(config.universe().symbol_for("Oil & Gas"), Some("XLE"));
    }

    #[test]
    fn keeps_event_order_and_dates() {
        let config = parse_config(MINIMAL).expect("valid config");
        let labels: Vec<&str> = config.events.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(
            labels,
            vec![
                "Hurricane Ida (Aug 29, 2021)",
                "Camp Fire California (Nov 8, 2018)",
                "Hurricane Harvey (Aug 25, 2017)",
            ]
        );
        assert_eq!(
            config.event("Hurricane Ida (Aug 29, 2021)").map(|e| e.date),
            NaiveDate::from_ymd_opt(2021, 8, 29)
        );
    }

    #[test]
    fn groups_events_by_category() {
        let config = parse_config(MINIMAL).expect("valid config");
        assert_eq!(config.categories(), vec!["Hurricanes", "Wildfires"]);

        let hurricanes: Vec<&str> = config
            .events_in("hurricanes")
            .iter()
            .map(|e| e.label.as_str())
            .collect();
        assert_eq!(
            hurricanes,
            vec!["Hurricane Ida (Aug 29, 2021)", "Hurricane Harvey (Aug 25, 2017)"]
        );
        assert!(config.events_in("Flooding").is_empty());
    }

    #[test]
    fn category_is_optional() {
        let toml = MINIMAL.replace("category = \"Wildfires\"\n", "");
        let config = parse_config(&toml).expect("valid config");
        let camp_fire = config
            .event("Camp Fire California (Nov 8, 2018)")
            .expect("configured event");
        assert_eq!(camp_fire.category, None);
        assert_eq!(config.categories(), vec!["Hurricanes"]);
    }

    #[test]
    fn rejects_zero_radius() {
        let toml = format!("{MINIMAL}\n[study]\nradius = 0\n");
        let err = parse_config(&toml).expect_err("must fail");
        assert!(matches!(err, ConfigError::ValidationError(msg) if msg.contains("radius")));
    }

    #[test]
    fn rejects_inverted_interval() {
        let toml = format!("{MINIMAL}\n[[intervals]]\nname = \"backwards\"\nfrom = 3\nto = 0\n");
        let err = parse_config(&toml).expect_err("must fail");
        assert!(matches!(err, ConfigError::ValidationError(msg) if msg.contains("backwards")));
    }

    #[test]
    fn rejects_duplicate_event_labels() {
        let toml = format!(
            "{MINIMAL}\n[[events]]\nlabel = \"Hurricane Ida (Aug 29, 2021)\"\ndate = \"2021-08-30\"\n"
        );
        let err = parse_config(&toml).expect_err("must fail");
        assert!(matches!(err, ConfigError::ValidationError(msg) if msg.contains("defined twice")));
    }

    #[test]
    fn rejects_industry_tracking_the_benchmark() {
        let toml = MINIMAL.replace("symbol = \"XLE\"", "symbol = \"SPY\"");
        let err = parse_config(&toml).expect_err("must fail");
        assert!(matches!(err, ConfigError::ValidationError(msg) if msg.contains("benchmark")));
    }

    #[test]
    fn rejects_malformed_dates() {
        let toml = MINIMAL.replace("2018-11-08", "November 8th");
        let err = parse_config(&toml).expect_err("must fail");
        assert!(matches!(err, ConfigError::LoadError(_)));
    }

    #[test]
    fn loads_from_a_file() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .expect("temp file");
        file.write_all(MINIMAL.as_bytes()).expect("write config");

        let config = load_config_from(file.path()).expect("valid config");
        assert_eq!(config.benchmark, "SPY");
        assert_eq!(config.industries.len(), 2);
    }

    #[test]
    fn shipped_config_is_valid() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../config.toml");
        let config = load_config_from(&path).expect("valid config");
        assert_eq!(config.benchmark, "SPY");
        assert_eq!(config.industries.len(), 5);
        assert_eq!(config.events.len(), 12);
        assert_eq!(config.events[0].label, "Hurricane Ida (Aug 29, 2021)");
        assert_eq!(
            config.categories(),
            vec!["Hurricanes", "Winter Storms", "Wildfires", "Flooding"]
        );
        assert_eq!(config.events_in("Winter Storms").len(), 3);
    }
}
