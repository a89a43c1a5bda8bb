//! Formwork CLI
//!
//! Drive a text input with scripted keystrokes, or run a one-shot
//! constraint check.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use formwork_core::{
    Constraints, Event, FormworkConfig, InputType, NativeValidity, Runtime, ValidationResult,
    ValidityService,
};
use formwork_widgets::{TextInput, TextInputProperties, Validity};

mod config;

/// Identity the simulated input is mounted under
const FIELD: &str = "field";

#[derive(Parser)]
#[command(name = "formwork")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Formwork text input CLI", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (defaults to ./formwork.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Type values into a text input and print its callbacks and render tree
    Simulate {
        #[command(flatten)]
        field: FieldArgs,

        /// Initial value supplied by the parent
        #[arg(long)]
        initial_value: Option<String>,

        /// Label text
        #[arg(long)]
        label: Option<String>,

        /// Helper text shown while the value is not invalid
        #[arg(long)]
        helper_text: Option<String>,

        /// Values to type, in order
        #[arg(long = "input", required = true)]
        inputs: Vec<String>,
    },

    /// Check a single value against the field's constraints
    Check {
        #[command(flatten)]
        field: FieldArgs,

        /// Value to check
        value: String,
    },
}

/// Constraints shared by both commands
#[derive(Args, Clone, Debug)]
struct FieldArgs {
    /// Input type (text, email, number, password, search, tel, url, date)
    #[arg(short = 't', long = "type", default_value = "text")]
    input_type: InputType,

    /// The value is required
    #[arg(long)]
    required: bool,

    /// Pattern the whole value must match
    #[arg(long)]
    pattern: Option<String>,

    /// Minimum value (numbers and dates)
    #[arg(long)]
    min: Option<String>,

    /// Maximum value (numbers and dates)
    #[arg(long)]
    max: Option<String>,

    /// Step (numbers), or "any"
    #[arg(long)]
    step: Option<String>,

    /// Minimum length in characters
    #[arg(long)]
    min_length: Option<usize>,

    /// Maximum length in characters
    #[arg(long)]
    max_length: Option<usize>,
}

impl FieldArgs {
    fn properties(&self) -> TextInputProperties {
        let mut props = TextInputProperties::new()
            .input_type(self.input_type)
            .required(self.required);
        props.pattern = self.pattern.clone().map(Into::into);
        props.min = self.min.clone();
        props.max = self.max.clone();
        props.step = self.step.clone();
        props.min_length = self.min_length;
        props.max_length = self.max_length;
        props
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    let config = config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Simulate {
            field,
            initial_value,
            label,
            helper_text,
            inputs,
        } => {
            let mut props = field.properties();
            props.initial_value = initial_value;
            props.label = label;
            props.helper_text = helper_text;
            cmd_simulate(&config, props, &inputs)
        }

        Commands::Check { field, value } => cmd_check(&config, &field, &value),
    }
}

fn cmd_simulate(
    config: &FormworkConfig,
    template: TextInputProperties,
    inputs: &[String],
) -> Result<()> {
    let log = Rc::new(RefCell::new(Vec::<String>::new()));
    let echo = Rc::new(RefCell::new(None::<Validity>));

    let provider = {
        let value_log = log.clone();
        let validate_log = log.clone();
        let validate_echo = echo.clone();
        let echo = echo.clone();
        let template = template
            .on_value(move |value| {
                value_log
                    .borrow_mut()
                    .push(format!("on_value({:?})", value.unwrap_or_default()))
            })
            .on_validate(move |valid, message| {
                validate_log
                    .borrow_mut()
                    .push(format!("on_validate({:?}, {:?})", valid, message));
                // The parent echoes the result back as `valid`
                *validate_echo.borrow_mut() = Some(Validity::Result(ValidationResult {
                    valid,
                    message: message.to_string(),
                }));
            });
        move || {
            let mut props = template.clone();
            props.valid = echo.borrow().clone();
            props
        }
    };

    let mut runtime = Runtime::<TextInput>::from_config(config);
    runtime
        .mount_with(FIELD, provider)
        .context("Failed to mount text input")?;
    runtime.flush().context("Initial render did not settle")?;

    for input in inputs {
        info!("typing {:?}", input);
        runtime
            .dispatch(FIELD, "input", Event::input(input.as_str()))
            .context("Failed to deliver input event")?;
        let passes = runtime
            .flush()
            .with_context(|| format!("Render after input {:?} did not settle", input))?;
        tracing::debug!(passes, "flushed");
    }

    println!("Callbacks:");
    for line in log.borrow().iter() {
        println!("  {}", line);
    }

    println!();
    println!(
        "Render tree ({} passes):",
        runtime.render_count(FIELD).unwrap_or_default()
    );
    if let Some(tree) = runtime.tree(FIELD) {
        print!("{}", tree.to_markup());
    }

    Ok(())
}

fn cmd_check(config: &FormworkConfig, field: &FieldArgs, value: &str) -> Result<()> {
    let constraints: Constraints = field.properties().constraints();
    let validity = NativeValidity::new(config.messages.clone());
    let result = validity.check("input", value, &constraints);

    info!("checking {:?} as {}", value, constraints.input_type);
    match result.valid {
        Some(true) => println!("valid"),
        Some(false) => println!("invalid: {}", result.message),
        None => println!("not evaluated"),
    }
    Ok(())
}
