use anyhow::{Error, Result};
use config_manager::config;
use config_manager::ConfigInit;

#[config(
    clap(version, author),
    env_prefix = "fortress",
    file(
        format = "toml",
        clap(long = "config", short = 'c', help = "path to configuration file"),
        env = "fortress_config"
    )
)]
struct InternalConfig {
    #[source(clap(long, short), env, config)]
    input: String,
    #[source(clap(long, short), env, config)]
    write_tree: Option<String>,
    #[source(clap(long, short), env, config)]
    grammar: Option<String>,
    #[source(clap(long, short), env, config)]
    runtime: Option<String>,
    #[source(clap(long), env, config)]
    derivation: bool,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub input: String,
    pub(crate) write_tree: Option<String>,
    pub(crate) grammar: Option<String>,
    pub(crate) runtime: Option<String>,
    pub(crate) derivation: bool,
}

fn non_empty(option: &str, path: Option<String>) -> Result<Option<String>> {
    match path {
        Some(path) if path.trim().is_empty() => Err(Error::msg(format!(
            "the {option} path must not be empty",
        ))),
        path => Ok(path),
    }
}

impl Config {
    pub fn try_parse() -> Result<Self> {
        let config = InternalConfig::parse()?;

        let InternalConfig {
            input,
            write_tree,
            grammar,
            runtime,
            derivation,
        } = config;

        if input.trim().is_empty() {
            Err(Error::msg("the input path must not be empty"))?
        }

        Ok(Self {
            input,
            write_tree: non_empty("write-tree", write_tree)?,
            grammar: non_empty("grammar", grammar)?,
            runtime: non_empty("runtime", runtime)?,
            derivation,
        })
    }
}
