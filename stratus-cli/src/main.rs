use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use similar::{ChangeTag, TextDiff};

use stratus_core::plan::ApplyPlan;
use stratus_core::provider::{DeployRequest, Engine, Provider};
use stratus_core::resource::Value;
use stratus_core::stack::Stack;
use stratus_provider_aws::{AwsProvider, CloudFormationEngine};
use stratus_topology::{TopologyConfig, web_tier};

const DEFAULT_STACK_NAME: &str = "AwsCdkAppStack";

#[derive(Parser)]
#[command(name = "stratus")]
#[command(about = "Declare the corporate web tier and deploy it with CloudFormation", long_about = None)]
struct Cli {
    /// Topology configuration file (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Name of the CloudFormation stack
    #[arg(long, global = true, default_value = DEFAULT_STACK_NAME)]
    stack_name: String,

    /// AWS region (overrides the configuration file)
    #[arg(long, global = true)]
    region: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the CloudFormation template
    Synth {
        /// Write the template to a file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Check the resource graph, schemas and parameter values
    Validate {
        /// Parameter value (Key=Value)
        #[arg(short = 'p', long = "parameter", value_parser = parse_key_val)]
        parameters: Vec<(String, String)>,
    },
    /// Show the order the engine will create resources in
    Plan {
        /// Parameter value (Key=Value)
        #[arg(short = 'p', long = "parameter", value_parser = parse_key_val)]
        parameters: Vec<(String, String)>,
    },
    /// Compare a template file with the synthesized template
    Diff {
        /// Previously synthesized template
        template: PathBuf,
    },
    /// Create or update the stack
    Deploy {
        /// Parameter value (Key=Value)
        #[arg(short = 'p', long = "parameter", value_parser = parse_key_val)]
        parameters: Vec<(String, String)>,
    },
    /// Print the outputs of the deployed stack
    Outputs,
    /// Delete the stack
    Destroy {
        /// Skip confirmation prompt (auto-approve)
        #[arg(long)]
        auto_approve: bool,
    },
    /// Generate a shell completion script
    Completions {
        shell: Shell,
    },
}

#[tokio::main]
async fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = run(cli).await;

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), String> {
    if let Commands::Completions { shell } = cli.command {
        clap_complete::generate(shell, &mut Cli::command(), "stratus", &mut std::io::stdout());
        return Ok(());
    }

    let config = load_config(cli.config.as_deref(), cli.region.as_deref())?;
    let region = config.region.clone();

    match cli.command {
        Commands::Synth { output } => {
            run_synth(&build_stack(&cli.stack_name, &config)?, output.as_deref())
        }
        Commands::Validate { parameters } => {
            run_validate(&build_stack(&cli.stack_name, &config)?, &collect_parameters(parameters))
        }
        Commands::Plan { parameters } => {
            run_plan(&build_stack(&cli.stack_name, &config)?, &collect_parameters(parameters))
        }
        Commands::Diff { template } => run_diff(&build_stack(&cli.stack_name, &config)?, &template),
        Commands::Deploy { parameters } => {
            let stack = build_stack(&cli.stack_name, &config)?;
            run_deploy(&stack, &collect_parameters(parameters), &region).await
        }
        Commands::Outputs => run_outputs(&cli.stack_name, &region).await,
        Commands::Destroy { auto_approve } => {
            run_destroy(&cli.stack_name, &region, auto_approve).await
        }
        Commands::Completions { .. } => Ok(()),
    }
}

/// Parse a `Key=Value` argument
fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid parameter '{}': expected Key=Value", s))?;
    if key.is_empty() {
        return Err(format!("invalid parameter '{}': empty key", s));
    }
    Ok((key.to_string(), value.to_string()))
}

/// Later occurrences of a key win
fn collect_parameters(pairs: Vec<(String, String)>) -> BTreeMap<String, String> {
    pairs.into_iter().collect()
}

fn load_config(path: Option<&Path>, region: Option<&str>) -> Result<TopologyConfig, String> {
    let config = match path {
        Some(path) => TopologyConfig::load(path).map_err(|e| e.to_string())?,
        None => TopologyConfig::default(),
    };
    let config = match region {
        Some(region) => config.with_region(region),
        None => config,
    };
    config.validate().map_err(|e| e.to_string())?;
    log::debug!("using region {}", config.region);
    Ok(config)
}

fn build_stack(name: &str, config: &TopologyConfig) -> Result<Stack, String> {
    web_tier::build(name, config).map_err(|e| format!("Failed to build stack: {}", e))
}

fn synthesize(stack: &Stack) -> Result<String, String> {
    let provider = AwsProvider::new();
    if let Err(errors) = provider.validate(stack) {
        return Err(join_errors("Validation failed", errors));
    }
    provider.synthesize(stack).map_err(|e| format_error_chain(&e))
}

fn join_errors<E: std::fmt::Display>(header: &str, errors: Vec<E>) -> String {
    let mut message = format!("{}:", header);
    for e in errors {
        message.push_str(&format!("\n  {}", e));
    }
    message
}

fn format_error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(&format!(": {}", cause));
        source = cause.source();
    }
    message
}

fn run_synth(stack: &Stack, output: Option<&Path>) -> Result<(), String> {
    let template = synthesize(stack)?;
    match output {
        Some(path) => {
            fs::write(path, format!("{}\n", template))
                .map_err(|e| format!("Failed to write {}: {}", path.display(), e))?;
            println!(
                "{}",
                format!("✓ Template written to {}", path.display())
                    .green()
                    .bold()
            );
        }
        None => println!("{}", template),
    }
    Ok(())
}

fn run_validate(stack: &Stack, parameters: &BTreeMap<String, String>) -> Result<(), String> {
    println!("{}", "Validating...".cyan());

    if let Err(errors) = AwsProvider::new().validate(stack) {
        return Err(join_errors("Validation failed", errors));
    }

    if !parameters.is_empty() {
        stack
            .resolve_parameters(parameters)
            .map_err(|errors| join_errors("Invalid parameters", errors))?;
    }

    println!(
        "{}",
        format!(
            "✓ {} resources validated successfully.",
            stack.resources().len()
        )
        .green()
        .bold()
    );

    for resource in stack.resources() {
        println!("  • {} ({})", resource.logical_id(), resource.id.resource_type);
    }

    Ok(())
}

fn run_plan(stack: &Stack, parameters: &BTreeMap<String, String>) -> Result<(), String> {
    if let Err(errors) = AwsProvider::new().validate(stack) {
        return Err(join_errors("Validation failed", errors));
    }
    if let Err(errors) = stack.resolve_parameters(parameters) {
        for e in errors {
            println!("{} {}", "Warning:".yellow().bold(), e);
        }
        println!();
    }

    let plan = ApplyPlan::from_stack(stack).map_err(|e| e.to_string())?;
    print_plan(stack, &plan, parameters);
    Ok(())
}

fn print_plan(stack: &Stack, plan: &ApplyPlan, parameters: &BTreeMap<String, String>) {
    if plan.is_empty() {
        println!("{}", "No resources declared.".yellow());
        return;
    }

    println!("{}", "Execution Plan:".cyan().bold());
    println!();

    for (index, stage) in plan.stages().iter().enumerate() {
        println!("{}", format!("Stage {}", index + 1).bold());
        for id in stage {
            println!(
                "  {} {} {}",
                "+".green().bold(),
                id.name.green().bold(),
                format!("({})", id.resource_type).dimmed()
            );
            let Some(resource) = stack.resource(&id.name) else {
                continue;
            };
            for (key, value) in &resource.attributes {
                println!(
                    "      {}: {}",
                    key,
                    format_value(&value.resolve_parameters(parameters))
                );
            }
            if !resource.depends_on.is_empty() {
                println!(
                    "      {}: {}",
                    "depends_on".dimmed(),
                    resource.depends_on.join(", ").dimmed()
                );
            }
        }
        println!();
    }

    for output in stack.outputs() {
        println!(
            "  {} {} = {}",
            "→".cyan(),
            output.name.cyan().bold(),
            format_value(&output.value)
        );
    }
    println!();
    println!("{}", plan.summary().to_string().bold());
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) if s.contains('\n') => {
            format!("<{} line script>", s.lines().count())
        }
        Value::Base64(inner) => format!("base64({})", format_value(inner)),
        other => other.to_string(),
    }
}

fn run_diff(stack: &Stack, template: &Path) -> Result<(), String> {
    let previous = fs::read_to_string(template)
        .map_err(|e| format!("Failed to read {}: {}", template.display(), e))?;
    let current = format!("{}\n", synthesize(stack)?);

    if previous.trim_end() == current.trim_end() {
        println!("{}", "No differences.".green());
        return Ok(());
    }

    print_diff(template, &previous, &current);
    Ok(())
}

fn print_diff(file: &Path, original: &str, synthesized: &str) {
    println!("\n{} {}:", "Diff for".cyan().bold(), file.display());

    let diff = TextDiff::from_lines(original, synthesized);
    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => "-".red(),
            ChangeTag::Insert => "+".green(),
            ChangeTag::Equal => " ".normal(),
        };
        print!("{}{}", sign, change);
    }
}

async fn run_deploy(
    stack: &Stack,
    parameters: &BTreeMap<String, String>,
    region: &str,
) -> Result<(), String> {
    let template_body = synthesize(stack)?;
    let parameters = stack
        .resolve_parameters(parameters)
        .map_err(|errors| join_errors("Invalid parameters", errors))?;

    let engine = CloudFormationEngine::new(region).await;
    println!(
        "{}",
        format!("Deploying {} to {}...", stack.name(), region)
            .cyan()
            .bold()
    );

    let request = DeployRequest {
        stack_name: stack.name().to_string(),
        template_body,
        parameters,
    };
    let outcome = engine
        .deploy(&request)
        .await
        .map_err(|e| format_error_chain(&e))?;

    if outcome.changed {
        println!(
            "{}",
            format!("✓ {} {}", stack.name(), outcome.status).green().bold()
        );
    } else {
        println!("{}", "No changes. Stack is up-to-date.".green());
    }
    print_outputs(&outcome.outputs);
    Ok(())
}

async fn run_outputs(stack_name: &str, region: &str) -> Result<(), String> {
    let engine = CloudFormationEngine::new(region).await;
    let outputs = engine
        .outputs(stack_name)
        .await
        .map_err(|e| format_error_chain(&e))?;
    print_outputs(&outputs);
    Ok(())
}

fn print_outputs(outputs: &BTreeMap<String, String>) {
    if outputs.is_empty() {
        return;
    }
    println!();
    println!("{}", "Outputs:".cyan().bold());
    for (key, value) in outputs {
        println!("  {} = {}", key.bold(), value);
    }
}

async fn run_destroy(stack_name: &str, region: &str, auto_approve: bool) -> Result<(), String> {
    println!(
        "Stack {} in {} will be {}.",
        stack_name.bold(),
        region,
        "deleted".red()
    );
    println!();

    if !auto_approve {
        println!(
            "{}",
            "Do you really want to destroy all resources?"
                .yellow()
                .bold()
        );
        println!(
            "  {}",
            "This action cannot be undone. Type 'yes' to confirm.".yellow()
        );
        print!("\n  Enter a value: ");
        std::io::Write::flush(&mut std::io::stdout()).map_err(|e| e.to_string())?;

        let mut input = String::new();
        std::io::stdin()
            .read_line(&mut input)
            .map_err(|e| e.to_string())?;

        if input.trim() != "yes" {
            println!();
            println!("{}", "Destroy cancelled.".yellow());
            return Ok(());
        }
        println!();
    }

    println!("{}", "Destroying stack...".red().bold());
    let engine = CloudFormationEngine::new(region).await;
    engine
        .destroy(stack_name)
        .await
        .map_err(|e| format_error_chain(&e))?;
    println!("{}", format!("✓ {} deleted.", stack_name).green().bold());
    Ok(())
}
