//! biblio init command

use super::GlobalArgs;
use clap::Args;
use console::style;
use dialoguer::Input;
use shared::{default_config_path, Config};

#[derive(Debug, Args)]
pub struct InitCommand {
    /// InstToken to store next to the keys (repeatable)
    #[arg(long = "token")]
    pub tokens: Vec<String>,

    /// Overwrite an existing configuration file
    #[arg(long)]
    pub force: bool,
}

impl InitCommand {
    pub fn run(&self, global: &GlobalArgs) -> anyhow::Result<()> {
        let path = global.config.clone().unwrap_or_else(default_config_path);
        if path.exists() && !self.force {
            anyhow::bail!(
                "{} already exists, use --force to overwrite it",
                path.display()
            );
        }

        let interactive = global.keys.is_empty();
        let keys = if interactive {
            prompt_list("API keys (comma-separated)")?
        } else {
            global.keys.clone()
        };
        if keys.is_empty() {
            anyhow::bail!("At least one API key is required");
        }
        let tokens = if !self.tokens.is_empty() {
            self.tokens.clone()
        } else if interactive {
            prompt_list("InstTokens (comma-separated, empty for none)")?
        } else {
            Vec::new()
        };

        let config = Config::create(&path, &keys, &tokens)?;

        println!(
            "{} configuration written to {}",
            style("✓").green(),
            config.path().display()
        );
        for (api, dir) in config.directories() {
            println!("  {} {}", style(format!("{api:<24}")).dim(), dir.display());
        }
        Ok(())
    }
}

fn prompt_list(prompt: &str) -> anyhow::Result<Vec<String>> {
    let answer: String = Input::new()
        .with_prompt(prompt)
        .allow_empty(true)
        .interact_text()?;
    Ok(split_list(&answer))
}

fn split_list(answer: &str) -> Vec<String> {
    answer
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
