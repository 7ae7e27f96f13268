use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use lore_schema_core::{
    DefRef, LoreEntity, Schema, TypeId, ValidationResult, ValidationState, validate,
};
use lore_schema_db::{ContentDocument, SchemaStore, bind_content, collect_content_paths};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "lore-schema")]
#[command(about = "Resolve, save and validate against lore schemas")]
struct Cli {
    /// Log merge, resolution and binding details to stderr.
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Load and resolve a schema, then print a summary.
    Check(SchemaArgs),
    /// Re-emit a schema, delta-only unless --full is given.
    Save(SaveArgs),
    /// Validate content documents against a schema.
    Validate(ValidateArgs),
    /// List types with their parents and modified members.
    Types(SchemaArgs),
}

#[derive(Debug, Args)]
struct SchemaArgs {
    /// Schema YAML file.
    schema: PathBuf,
}

#[derive(Debug, Args)]
struct SaveArgs {
    /// Schema YAML file.
    schema: PathBuf,
    /// Destination path (defaults to overwriting the schema file).
    #[arg(long)]
    output: Option<PathBuf>,
    /// Write every resolved member, inherited ones included.
    #[arg(long)]
    full: bool,
}

#[derive(Debug, Args)]
struct ValidateArgs {
    /// Schema YAML file.
    schema: PathBuf,
    /// Content files and/or directories containing content files.
    #[arg(required = true)]
    content: Vec<PathBuf>,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Command::Check(args) => run_check(args).map(|()| true),
        Command::Save(args) => run_save(args).map(|()| true),
        Command::Validate(args) => run_validate(args),
        Command::Types(args) => run_types(args).map(|()| true),
    };

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(2),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_store(path: &Path) -> Result<SchemaStore, String> {
    SchemaStore::load(path).map_err(|err| format!("Failed to load '{}': {err}", path.display()))
}

fn run_check(args: SchemaArgs) -> Result<(), String> {
    let store = load_store(&args.schema)?;
    let schema = store.schema();
    let order = schema
        .type_order(store.settings())
        .map_err(|err| err.to_string())?;

    println!(
        "Resolved {} type(s), {} collection(s), {} picklist(s).",
        schema.type_count(),
        schema.root_collections().len(),
        schema.picklists().count()
    );
    let names: Vec<_> = order
        .into_iter()
        .map(|id| schema.type_def(id).name.as_str())
        .collect();
    println!("Type order: {}", names.join(", "));
    Ok(())
}

fn run_save(args: SaveArgs) -> Result<(), String> {
    let store = load_store(&args.schema)?;
    let output = args.output.unwrap_or_else(|| args.schema.clone());

    let yaml = if args.full {
        store.to_yaml_full()
    } else {
        store.to_yaml()
    }
    .map_err(|err| err.to_string())?;
    lore_schema_db::write_atomic(&output, &yaml)
        .map_err(|err| format!("Failed to write '{}': {err}", output.display()))?;

    let form = if args.full || !store.settings().save_delta_only {
        "full"
    } else {
        "delta-only"
    };
    println!("Saved {form} schema to {}", output.display());
    Ok(())
}

fn run_validate(args: ValidateArgs) -> Result<bool, String> {
    let store = load_store(&args.schema)?;
    let paths =
        collect_content_paths(&args.content, store.settings()).map_err(|err| err.to_string())?;

    let mut errors = 0;
    let mut warnings = 0;
    for path in &paths {
        let doc = ContentDocument::load(path)
            .map_err(|err| format!("Failed to read '{}': {err}", path.display()))?;
        let roots = bind_content(store.schema(), store.settings(), &doc)
            .map_err(|err| format!("Failed to bind '{}': {err}", path.display()))?;
        let result = validate(store.schema(), store.settings(), &roots);

        for root in &roots {
            print_report(path, root, &result);
        }
        let failed = roots
            .iter()
            .filter(|root| result.state(root.id()).is_some_and(ValidationState::is_failure))
            .count();
        if failed > 0 {
            println!("{}: {failed} of {} root(s) failed", path.display(), roots.len());
        }
        errors += result.error_count();
        warnings += result.warning_count();
    }

    println!(
        "Validated {} content file(s): {errors} error(s), {warnings} warning(s).",
        paths.len()
    );
    Ok(errors == 0)
}

/// Prints the messages of `entity` and its subtree in pre-order.
fn print_report(path: &Path, entity: &LoreEntity, result: &ValidationResult) {
    let id = entity.id();
    for message in result.errors(id) {
        println!("{}: error: {} {id}: {message}", path.display(), entity.name());
    }
    for message in result.warnings(id) {
        println!("{}: warning: {} {id}: {message}", path.display(), entity.name());
    }
    for child in entity.children() {
        print_report(path, child, result);
    }
}

fn run_types(args: SchemaArgs) -> Result<(), String> {
    let store = load_store(&args.schema)?;
    let schema = store.schema();
    let settings = store.settings();

    let mut names: Vec<_> = schema.types().map(|(_, ty)| ty.name.clone()).collect();
    settings.sort_names(&mut names);

    for name in &names {
        let Some(id) = schema.find_type(name, settings) else {
            continue;
        };
        let ty = schema.type_def(id);
        let (modified, total) = modified_members(schema, id);
        match &ty.extends {
            Some(parent) => println!(
                "{name} extends {parent} ({modified} of {total} member(s) modified)"
            ),
            None => println!("{name} ({total} member(s))"),
        }
    }
    Ok(())
}

/// Counts a type's direct members that differ from what it inherits.
fn modified_members(schema: &Schema, id: TypeId) -> (usize, usize) {
    let ty = schema.type_def(id);
    let members: Vec<DefRef> = ty
        .fields
        .iter()
        .map(|&f| DefRef::Field(f))
        .chain(ty.sections.iter().map(|&s| DefRef::Section(s)))
        .chain(ty.collections.iter().map(|&c| DefRef::Collection(c)))
        .chain(ty.embedded.iter().map(|&e| DefRef::Embedded(e)))
        .collect();
    let modified = members.iter().filter(|&&def| schema.is_modified(def)).count();
    (modified, members.len())
}
