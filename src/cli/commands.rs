use std::collections::{HashMap, HashSet};

use anyhow::{anyhow, Result};
use chrono::Local;
use colored::*;
use dialoguer::{theme::ColorfulTheme, Input};

use crate::command::{Argument, Command, Options};
use crate::inject;
use crate::manager::Manager;

use super::args::Commands;

pub fn handle_command(command: Commands, manager: &mut Manager) -> Result<()> {
    match command {
        Commands::Add {
            name,
            description,
            command,
        } => {
            let template = command.join(" ");
            let cmd = Command::new(&name, &description, &template, Options::default())?;
            let cmd = manager.add(cmd)?;
            println!("Command {} added with id {}", cmd.name.green(), cmd.id);
        }
        Commands::Ls => {
            let commands = manager.get_all()?;
            print_commands(&commands);
        }
        Commands::Search { query } => {
            let commands = manager.search(&query)?;
            print_commands(&commands);
        }
        Commands::Get { id } => {
            let cmd = manager.get_one(&id)?;
            print_command_details(&cmd);
        }
        Commands::Edit {
            id,
            name,
            description,
            command,
        } => {
            let mut cmd = manager.get_one(&id)?;
            if let Some(name) = name {
                cmd.name = name;
            }
            if let Some(description) = description {
                cmd.description = description;
            }
            if let Some(template) = command {
                cmd.template = template;
            }
            cmd.build();

            let cmd = manager.update_command(&cmd)?;
            println!("Command {} updated", cmd.name.green());
        }
        Commands::Rm { id } => {
            manager.delete_command(&id)?;
            println!("Command deleted");
        }
        Commands::Exec { id, args, dry_run } => {
            let mut cmd = manager.get_one(&id)?;
            cmd.build();

            let provided = parse_arg_values(&args)?;
            let arguments = collect_arguments(&cmd, &provided)?;
            let compiled = cmd.compile(&arguments)?;

            if dry_run {
                println!("{compiled}");
                return Ok(());
            }

            inject::produce(&compiled)?;
            manager.insert_usage(cmd.id, &compiled);
        }
        Commands::Explain { id, refresh } => {
            let cmd = manager.get_one(&id)?;
            if refresh {
                manager.delete_explanation(cmd.id)?;
            }

            let explanation = manager.explain(&cmd)?;
            println!("{explanation}");
        }
        Commands::History { id } => {
            let cmd = manager.get_one(&id)?;
            let usages = manager.get_history(cmd.id)?;
            if usages.is_empty() {
                println!("No recorded usages for {}", cmd.name);
                return Ok(());
            }

            println!("\nLast {} usage(s) of {}:", usages.len(), cmd.name.green());
            println!("─────────────────────────────────────────────");
            for usage in usages {
                let local_time = usage.timestamp.with_timezone(&Local);
                println!(
                    "[{}] {}",
                    local_time.format("%Y-%m-%d %H:%M:%S"),
                    usage.command
                );
            }
        }
    }
    Ok(())
}

/// Parses `name=value` pairs passed with `--arg`.
fn parse_arg_values(raw: &[String]) -> Result<HashMap<String, String>> {
    let mut values = HashMap::with_capacity(raw.len());
    for pair in raw {
        let (name, value) = pair
            .split_once('=')
            .ok_or_else(|| anyhow!("invalid argument '{pair}', expected name=value"))?;
        values.insert(name.to_string(), value.to_string());
    }
    Ok(values)
}

/// Builds the argument list for a command, prompting for any parameter not
/// covered by the provided values. Defaults are offered at the prompt.
/// Provided names that match no parameter are rejected before any prompt,
/// so a typo surfaces instead of silently prompting for the real name.
fn collect_arguments(
    cmd: &Command,
    provided: &HashMap<String, String>,
) -> Result<Vec<Argument>> {
    let known: HashSet<&str> = cmd.params.iter().map(|p| p.name.as_str()).collect();
    for name in provided.keys() {
        if !known.contains(name.as_str()) {
            return Err(anyhow!("unknown argument '{name}'"));
        }
    }

    let mut arguments = Vec::with_capacity(cmd.params.len());
    for param in &cmd.params {
        let value = match provided.get(&param.name) {
            Some(value) => value.clone(),
            None => {
                let prompt = if param.description.is_empty() {
                    param.name.clone()
                } else {
                    format!("{} ({})", param.name, param.description)
                };

                Input::with_theme(&ColorfulTheme::default())
                    .with_prompt(&prompt)
                    .with_initial_text(param.default_value.clone())
                    .allow_empty(true)
                    .interact_text()?
            }
        };

        arguments.push(Argument::new(&param.name, &value));
    }
    Ok(arguments)
}

fn print_commands(commands: &[Command]) {
    if commands.is_empty() {
        println!("No matching commands found.");
        return;
    }

    println!("\nFound {} command(s):", commands.len());
    println!("─────────────────────────────────────────────");
    for cmd in commands {
        println!("{} ({})", cmd.name.green().bold(), cmd.id);
        println!("    {}", cmd.template);
        if !cmd.description.is_empty() {
            println!("    {}", cmd.description.dimmed());
        }
        println!("─────────────────────────────────────────────");
    }
}

fn print_command_details(cmd: &Command) {
    println!("{}: {}", "Name".blue().bold(), cmd.name.green());
    println!("{}: {}", "Id".blue().bold(), cmd.id);
    if !cmd.description.is_empty() {
        println!("{}: {}", "Description".blue().bold(), cmd.description);
    }
    println!("{}: {}", "Command".blue().bold(), cmd.template);

    if !cmd.params.is_empty() {
        println!("{}:", "Parameters".blue().bold());
        for param in &cmd.params {
            let mut line = format!("    {}", param.name.yellow());
            if !param.description.is_empty() {
                line.push_str(&format!(" - {}", param.description));
            }
            if !param.default_value.is_empty() {
                line.push_str(&format!(" (default: {})", param.default_value));
            }
            println!("{line}");
        }
    }
}
