//! Command-line interface for `minire-gen`.
//!
//! Reads a specification, compiles its token definitions and builds the
//! LL(1) parse table, then prints the table to stdout. With `--output-dir`
//! a report of the whole run is written as well.

#[cfg(feature = "cli")]
mod real {
    use clap::Parser;
    use minire_gen::generate::{generate, load};
    use std::path::PathBuf;

    #[derive(Parser)]
    #[command(about = "Generate NFAs and an LL(1) parse table from a MiniRE specification")]
    struct Args {
        /// Path to the input specification file
        #[arg(short = 's', long)]
        spec: PathBuf,

        /// Directory to write the report into.
        #[arg(short = 'o', long)]
        output_dir: Option<PathBuf>,

        /// Prefix used to construct the report file name
        #[arg(short = 'n', long, default_value = "minire")]
        name: String,

        /// Enable debug logging and NFA dumps (off by default).
        #[arg(short = 'd', long)]
        debug: bool,
    }

    pub fn main() -> anyhow::Result<()> {
        let args = Args::parse();
        let level = if args.debug { "debug" } else { "warn" };
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

        let result = match &args.output_dir {
            Some(dir) => generate(&args.spec, dir, &args.name, args.debug),
            None => load(&args.spec),
        };
        match result {
            Ok(generated) => {
                print!("{}", generated.table);
                Ok(())
            }
            Err(err) => {
                log::error!("{:#}", err);
                Err(err)
            }
        }
    }
}

#[cfg(feature = "cli")]
fn main() -> anyhow::Result<()> {
    real::main()
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("minire-gen disabled (compiled without `cli` feature)");
}
