use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use colored::Colorize;
use similar::{ChangeTag, TextDiff};

use carina_core::resource::Value;
use carina_core::schema::{AttributeSchema, ResourceSchema};
use carina_provider_wafv2::config::DEFAULT_MAX_NESTING_LEVEL;
use carina_provider_wafv2::validation::{ValidationError, validate_rule_group};
use carina_provider_wafv2::wire::RuleGroup;
use carina_provider_wafv2::{Wafv2Config, expand_rule_group, flatten_rule_group, normalize, schemas};

#[derive(Parser)]
#[command(name = "carina-wafv2")]
#[command(about = "Translate WAFv2 rule groups between block and API form", long_about = None)]
struct Cli {
    /// Maximum depth of nested statements
    #[arg(long, global = true, default_value_t = DEFAULT_MAX_NESTING_LEVEL)]
    max_nesting_level: usize,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a rule group written in block form
    Validate {
        /// Path to rule group JSON
        file: PathBuf,
    },
    /// Print the API document of a rule group written in block form
    Expand {
        /// Path to rule group JSON
        file: PathBuf,
    },
    /// Print the block form of a rule group API document
    Flatten {
        /// Path to API JSON
        file: PathBuf,
    },
    /// Check that a rule group survives expand and flatten unchanged
    Roundtrip {
        /// Path to rule group JSON
        file: PathBuf,
    },
    /// Show the accepted block structure
    Schema,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    let config = Wafv2Config::default().with_max_nesting_level(cli.max_nesting_level);

    let result = match cli.command {
        Commands::Validate { file } => run_validate(&file, &config),
        Commands::Expand { file } => run_expand(&file, &config),
        Commands::Flatten { file } => run_flatten(&file),
        Commands::Roundtrip { file } => run_roundtrip(&file, &config),
        Commands::Schema => {
            for schema in schemas::all_schemas(&config) {
                print!("{}", describe_schema(&schema));
            }
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn read_json(file: &Path) -> Result<serde_json::Value, String> {
    let content = fs::read_to_string(file)
        .map_err(|e| format!("Failed to read {}: {}", file.display(), e))?;
    serde_json::from_str(&content).map_err(|e| format!("Parse error: {}", e))
}

/// Load a rule group in block form
fn load_rule_group(file: &Path) -> Result<HashMap<String, Value>, String> {
    match Value::from_json(&read_json(file)?) {
        Some(Value::Map(attributes)) => {
            log::debug!(
                "Loaded {} attributes from {}",
                attributes.len(),
                file.display()
            );
            Ok(attributes)
        }
        _ => Err(format!("{}: expected a JSON object", file.display())),
    }
}

fn check(attributes: &HashMap<String, Value>, config: &Wafv2Config) -> Result<(), String> {
    validate_rule_group(attributes, config).map_err(|errors| {
        let lines: Vec<String> = errors.iter().map(ValidationError::to_string).collect();
        format!("Validation failed:\n  {}", lines.join("\n  "))
    })
}

/// Validate and expand a rule group in block form
fn expand_file(file: &Path, config: &Wafv2Config) -> Result<RuleGroup, String> {
    let attributes = load_rule_group(file)?;
    check(&attributes, config)?;
    expand_rule_group(&attributes).map_err(|e| e.to_string())
}

fn run_validate(file: &Path, config: &Wafv2Config) -> Result<(), String> {
    println!("{}", "Validating...".cyan());

    let attributes = load_rule_group(file)?;
    check(&attributes, config)?;

    let rules = attributes
        .get("rule")
        .and_then(Value::as_list)
        .unwrap_or_default();
    println!(
        "{}",
        format!("✓ {} rules validated successfully.", rules.len())
            .green()
            .bold()
    );
    for rule in rules {
        if let Some(name) = rule
            .as_map()
            .and_then(|m| m.get("name"))
            .and_then(Value::as_str)
        {
            println!("  • {}", name);
        }
    }
    Ok(())
}

fn run_expand(file: &Path, config: &Wafv2Config) -> Result<(), String> {
    let group = expand_file(file, config)?;
    let json = serde_json::to_string_pretty(&group).map_err(|e| e.to_string())?;
    println!("{}", json);
    Ok(())
}

fn run_flatten(file: &Path) -> Result<(), String> {
    let group: RuleGroup =
        serde_json::from_value(read_json(file)?).map_err(|e| format!("Parse error: {}", e))?;
    log::debug!("Flattening rule group {} with {} rules", group.name, group.rules.len());
    let json = serde_json::to_string_pretty(&flatten_rule_group(&group).to_json())
        .map_err(|e| e.to_string())?;
    println!("{}", json);
    Ok(())
}

/// Expand and flatten a rule group, returning the normalized input and output
fn roundtrip(file: &Path, config: &Wafv2Config) -> Result<(String, String), String> {
    let original = Value::Map(load_rule_group(file)?);
    let flattened = flatten_rule_group(&expand_file(file, config)?);

    let pretty = |value: &Value| {
        serde_json::to_string_pretty(&normalize(value).to_json()).map_err(|e| e.to_string())
    };
    Ok((pretty(&original)?, pretty(&flattened)?))
}

fn run_roundtrip(file: &Path, config: &Wafv2Config) -> Result<(), String> {
    let (original, flattened) = roundtrip(file, config)?;
    if original == flattened {
        println!("{}", "✓ Rule group round-trips unchanged.".green().bold());
        return Ok(());
    }

    log::warn!("{} changed during expand and flatten", file.display());
    print_diff(file, &original, &flattened);
    Err("Rule group does not round-trip".to_string())
}

fn print_diff(file: &Path, original: &str, flattened: &str) {
    println!("\n{} {}:", "Diff for".cyan().bold(), file.display());

    let diff = TextDiff::from_lines(original, flattened);
    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => "-".red(),
            ChangeTag::Insert => "+".green(),
            ChangeTag::Equal => " ".normal(),
        };
        print!("{}{}", sign, change);
    }
}

/// Render a schema as an indented attribute tree
fn describe_schema(schema: &ResourceSchema) -> String {
    let mut out = format!("{}\n", schema.resource_type);
    describe_attributes(&schema.attributes, 1, &mut out);
    out
}

fn describe_attributes(
    attributes: &HashMap<String, AttributeSchema>,
    depth: usize,
    out: &mut String,
) {
    let mut names: Vec<&String> = attributes.keys().collect();
    names.sort();
    for name in names {
        let attr = &attributes[name];
        let required = if attr.required { " (required)" } else { "" };
        out.push_str(&format!(
            "{}{}: {}{}\n",
            "  ".repeat(depth),
            name,
            attr.attr_type,
            required
        ));
        if let Some(block) = attr.attr_type.block() {
            describe_attributes(&block.attributes, depth + 1, out);
        }
    }
}
