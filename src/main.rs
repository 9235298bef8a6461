use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;
use userconf::{Config, ConfigElement, ConfigSchema, Section, ValueType};

fn main() -> Result<()> {
    // Logs go to stderr so `--generate-config` output stays clean
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let schema = schema().context("Invalid configuration schema")?;
    let config = schema.load().context("Failed to load configuration")?;

    for source in config.sources() {
        match &source.path {
            Some(path) => tracing::info!("Using {} layer from {}", source.layer, path.display()),
            None => tracing::info!("Using {} layer", source.layer),
        }
    }

    println!("{}", greeting(&config)?);
    Ok(())
}

fn schema() -> userconf::Result<ConfigSchema> {
    let general = Section::builder()
        .doc("General information")
        .element(
            "name",
            ConfigElement::string()
                .doc("Your name")
                .short("n")
                .build()?,
        )
        .element(
            "age",
            ConfigElement::integer()
                .doc("Your age in years")
                .short("a")
                .validator(|value| match value.as_integer() {
                    Some(age) if age < 0 => Err("age cannot be negative".to_string()),
                    _ => Ok(()),
                })
                .build()?,
        )
        .element(
            "hobbies",
            ConfigElement::list(ValueType::String)
                .doc("Things you enjoy; every layer adds to this list")
                .long("hobby")
                .default(Vec::<String>::new())
                .additive(true)
                .build()?,
        )
        .build()?;

    let address = Section::builder()
        .doc("Postal address, only shown when complete")
        .optional()
        .element("street", ConfigElement::string().doc("Street and number").build()?)
        .element("city", ConfigElement::string().doc("City").build()?)
        .build()?;

    Config::builder()
        .application("userconf")
        .author("userconf")
        .version(env!("CARGO_PKG_VERSION"))
        .doc("Greets you using layered configuration")
        .section("general", general)
        .section("address", address)
        .build()
}

fn greeting(config: &Config) -> Result<String> {
    let name = config.get_str("general.name")?.unwrap_or_default();
    let age = config.get_integer("general.age")?.unwrap_or_default();
    let mut text = format!("Hello {name}, you are {age} years old.");

    let hobbies: Vec<String> = config
        .get_list("general.hobbies")?
        .unwrap_or_default()
        .iter()
        .map(ToString::to_string)
        .collect();
    if !hobbies.is_empty() {
        text.push_str(&format!("\nYou enjoy {}.", hobbies.join(", ")));
    }

    if config.section("address")?.incomplete_count() == 0 {
        if let (Some(street), Some(city)) = (
            config.get_str("address.street")?,
            config.get_str("address.city")?,
        ) {
            text.push_str(&format!("\nYou live at {street}, {city}."));
        }
    }

    Ok(text)
}
