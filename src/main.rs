use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};

use tileset_compiler::compiler::{self, CompileCtx};
use tileset_compiler::config::{CompilerConfig, CompilerMode, DEFAULT_MAX_RECURSES};
use tileset_compiler::diagnostics::{resolve_warning_options, Diagnostics};
use tileset_compiler::emitter;
use tileset_compiler::errors::CompileError;
use tileset_compiler::importer;
use tileset_compiler::tileset::attributes::TargetBaseGame;
use tileset_compiler::tileset::colour::Rgba32;

#[derive(Parser, Debug)]
#[command(name = "tileset_compiler")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile a primary tileset source directory
    CompilePrimary {
        #[arg(value_name = "PRIMARY_PATH")]
        primary_path: PathBuf,
        #[command(flatten)]
        opts: CompileOpts,
    },
    /// Compile a secondary tileset against its paired primary
    CompileSecondary {
        #[arg(value_name = "SECONDARY_PATH")]
        secondary_path: PathBuf,
        #[arg(value_name = "PRIMARY_PATH")]
        primary_path: PathBuf,
        #[command(flatten)]
        opts: CompileOpts,
    },
    /// Reserved: decompile a compiled tileset back to source layers
    Decompile,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum BaseGameArg {
    Emerald,
    Firered,
    Ruby,
}

impl From<BaseGameArg> for TargetBaseGame {
    fn from(arg: BaseGameArg) -> Self {
        match arg {
            BaseGameArg::Emerald => TargetBaseGame::Emerald,
            BaseGameArg::Firered => TargetBaseGame::Firered,
            BaseGameArg::Ruby => TargetBaseGame::Ruby,
        }
    }
}

#[derive(Args, Debug)]
struct CompileOpts {
    #[arg(short, long, value_name = "OUTPUT_DIR", default_value = "./build")]
    output_dir: PathBuf,

    #[arg(long, value_enum, default_value_t = BaseGameArg::Emerald)]
    target_base_game: BaseGameArg,

    /// Treat every metatile as three-layered instead of inferring layer
    /// types per metatile
    #[arg(long)]
    triple_layer: bool,

    /// Colour keyed out as transparency, as 8-bit R,G,B
    #[arg(long, value_name = "R,G,B", default_value = "255,0,255")]
    transparency_color: String,

    #[arg(long, value_name = "N")]
    tiles_primary_override: Option<usize>,
    #[arg(long, value_name = "N")]
    tiles_total_override: Option<usize>,
    #[arg(long, value_name = "N")]
    metatiles_primary_override: Option<usize>,
    #[arg(long, value_name = "N")]
    metatiles_total_override: Option<usize>,
    #[arg(long, value_name = "N")]
    palettes_primary_override: Option<usize>,
    #[arg(long, value_name = "N")]
    palettes_total_override: Option<usize>,

    /// Abort palette assignment after this many search steps
    #[arg(long, value_name = "N", default_value_t = DEFAULT_MAX_RECURSES)]
    max_recurses: usize,

    /// Render emitted PNGs through the assigned palettes instead of the
    /// greyscale debug palette (informational only)
    #[arg(long)]
    true_color: bool,

    /// Warning controls: all, none, error, error=NAME, no-error=NAME,
    /// NAME, no-NAME
    #[arg(short = 'W', value_name = "WARNING")]
    warnings: Vec<String>,
}

fn parse_transparency(text: &str) -> Result<Rgba32, String> {
    let parts: Vec<&str> = text.split(',').map(str::trim).collect();
    if parts.len() != 3 {
        return Err(format!("expected R,G,B, got '{}'", text));
    }
    let channel = |s: &str| {
        s.parse::<u8>()
            .map_err(|_| format!("invalid colour channel '{}'", s))
    };
    Ok(Rgba32::opaque(
        channel(parts[0])?,
        channel(parts[1])?,
        channel(parts[2])?,
    ))
}

fn build_config(mode: CompilerMode, opts: &CompileOpts) -> Result<CompilerConfig, String> {
    let mut config = CompilerConfig::new(mode, opts.target_base_game.into());
    config.transparency_colour = parse_transparency(&opts.transparency_color)?;
    config.triple_layer = opts.triple_layer;
    config.true_colour = opts.true_color;
    config.max_recurse_count = opts.max_recurses;
    if opts.triple_layer {
        config.fieldmap.num_tiles_per_metatile = 12;
    }

    let fm = &mut config.fieldmap;
    if let Some(n) = opts.tiles_primary_override {
        fm.num_tiles_in_primary = n;
    }
    if let Some(n) = opts.tiles_total_override {
        fm.num_tiles_total = n;
    }
    if let Some(n) = opts.metatiles_primary_override {
        fm.num_metatiles_in_primary = n;
    }
    if let Some(n) = opts.metatiles_total_override {
        fm.num_metatiles_total = n;
    }
    if let Some(n) = opts.palettes_primary_override {
        fm.num_palettes_in_primary = n;
    }
    if let Some(n) = opts.palettes_total_override {
        fm.num_palettes_total = n;
    }
    Ok(config)
}

fn compile_primary(primary_path: &PathBuf, opts: &CompileOpts) -> Result<(), CompileError> {
    let config = build_config(CompilerMode::Primary, opts).map_err(CompileError::User)?;
    let mut diags = Diagnostics::new();
    resolve_warning_options(&mut diags, &opts.warnings).map_err(CompileError::User)?;

    let imported = importer::import_source(&config, &mut diags, primary_path, None)?;
    let mut ctx = CompileCtx::new(&config, &mut diags);
    let compiled = compiler::compile(&mut ctx, &imported.tileset, None)?;
    emitter::emit(&config, &mut diags, &compiled, &opts.output_dir)?;

    println!(
        "compiled primary tileset: {} tiles, {} palettes, {} metatiles",
        compiled.tiles.len(),
        compiled.palettes.len(),
        compiled.attributes.len()
    );
    Ok(())
}

fn compile_secondary(
    secondary_path: &PathBuf,
    primary_path: &PathBuf,
    opts: &CompileOpts,
) -> Result<(), CompileError> {
    let primary_config = build_config(CompilerMode::Primary, opts).map_err(CompileError::User)?;
    let secondary_config =
        build_config(CompilerMode::Secondary, opts).map_err(CompileError::User)?;
    let mut diags = Diagnostics::new();
    resolve_warning_options(&mut diags, &opts.warnings).map_err(CompileError::User)?;

    // The paired primary is compiled first; only the secondary's artifacts
    // are written out.
    let imported_primary = importer::import_source(&primary_config, &mut diags, primary_path, None)?;
    let mut ctx = CompileCtx::new(&primary_config, &mut diags);
    let compiled_primary = compiler::compile(&mut ctx, &imported_primary.tileset, None)?;

    let imported_secondary = importer::import_source(
        &secondary_config,
        &mut diags,
        secondary_path,
        Some(imported_primary.behaviours),
    )?;
    let mut ctx = CompileCtx::new(&secondary_config, &mut diags);
    let compiled = compiler::compile(&mut ctx, &imported_secondary.tileset, Some(&compiled_primary))?;
    emitter::emit(&secondary_config, &mut diags, &compiled, &opts.output_dir)?;

    println!(
        "compiled secondary tileset: {} tiles, {} palettes, {} metatiles",
        compiled.tiles.len(),
        compiled.palettes.len(),
        compiled.attributes.len()
    );
    Ok(())
}

fn run(cli: Cli) -> Result<(), CompileError> {
    match &cli.command {
        Command::CompilePrimary { primary_path, opts } => compile_primary(primary_path, opts),
        Command::CompileSecondary {
            secondary_path,
            primary_path,
            opts,
        } => compile_secondary(secondary_path, primary_path, opts),
        Command::Decompile => Err(CompileError::User(
            "decompile is reserved and not yet implemented".to_string(),
        )),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) if err.is_internal() => {
            eprintln!("tileset_compiler: {}", err);
            eprintln!("this is a bug; please file an issue with the command and inputs that triggered it");
            ExitCode::from(3)
        }
        Err(err) => {
            eprintln!("tileset_compiler: error: {}", err);
            ExitCode::FAILURE
        }
    }
}
