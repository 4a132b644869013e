use super::cleanup::load_rules;
use super::Context;
use clap::Subcommand;
use comfy_table::{presets::UTF8_FULL, Cell, Color, Table};
use console::style;
use declutter_lib::{ClassificationRules, Config, DeclutterError, Result};
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum RulesSubcommand {
    #[command(about = "Print the active rule set in evaluation order")]
    Show {
        #[arg(long, help = "Classification rules file")]
        rules: Option<PathBuf>,
    },

    #[command(about = "Write the built-in rules to a TOML file for editing")]
    Init {
        #[arg(help = "Where to write the rules (default: XDG config dir)")]
        path: Option<PathBuf>,

        #[arg(long, help = "Overwrite an existing file")]
        force: bool,
    },
}

pub fn handle_rules_command(ctx: &Context, subcommand: RulesSubcommand) -> Result<()> {
    match subcommand {
        RulesSubcommand::Show { rules } => show_rules(&load_rules(ctx, rules)?),
        RulesSubcommand::Init { path, force } => init_rules(ctx, path, force),
    }
}

fn show_rules(rules: &ClassificationRules) -> Result<()> {
    if rules.rules.is_empty() {
        println!("{}", style("No rules defined, every file is unclassified").yellow());
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec![
        Cell::new("#").fg(Color::Cyan),
        Cell::new("Rule").fg(Color::Cyan),
        Cell::new("When").fg(Color::Cyan),
        Cell::new("Category").fg(Color::Cyan),
    ]);

    for (i, rule) in rules.rules.iter().enumerate() {
        let when = if rule.predicates.is_empty() {
            "always".to_string()
        } else {
            rule.predicates
                .iter()
                .map(|p| p.to_string())
                .collect::<Vec<_>>()
                .join("\nand ")
        };

        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(&rule.name).fg(Color::White),
            Cell::new(when),
            Cell::new(rule.category.to_string()),
        ]);
    }

    println!("{}", table);
    println!("  First matching rule wins; files matching none are left alone.");
    Ok(())
}

fn init_rules(ctx: &Context, path: Option<PathBuf>, force: bool) -> Result<()> {
    let path = match path.or_else(Config::default_rules_path) {
        Some(path) => path,
        None => {
            return Err(DeclutterError::Config(
                "Cannot determine a config directory, pass a path".to_string(),
            ))
        }
    };

    if path.exists() && !force {
        return Err(DeclutterError::Config(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }

    ClassificationRules::downloads_defaults(ctx.config.cleanup.installer_age_days).save_to_file(&path)?;

    println!("{} Rules written to {}", style("✓").green(), path.display());
    println!("  Use them with --rules {} or set cleanup.rules_file", path.display());
    Ok(())
}
