use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context};
use clap::Parser;
use encoder::{read_cqbf, to_cqbf_string, write_cqbf};
use ir::Problem;
use log::*;
use logging::Logger;
use parser::{parse_qpro, read_interest, ParseOptions, DEFAULT_MAX_DEPTH};

/// Converts a QPRO circuit to the CQBF circuit format.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// QPRO input file, or '-' to read stdin
    input: String,

    /// CQBF output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// File listing the variables to turn into free variables
    #[arg(long)]
    interest: Option<PathBuf>,

    /// Offset added to every QPRO variable number; required with --interest.
    /// Without --interest, the interest file is the input path with '.qpro'
    /// replaced by '.interest'
    #[arg(long, allow_hyphen_values = true)]
    interest_offset: Option<isize>,

    /// Don't print the completion message
    #[arg(short, long)]
    quiet: bool,

    /// Read the produced CQBF back and check that it matches the parsed circuit
    #[arg(long)]
    verify: bool,

    /// Maximum nesting depth of subformulas
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: usize,
}

impl Args {
    fn validate(&self) -> anyhow::Result<()> {
        if self.interest.is_some() && self.interest_offset.is_none() {
            bail!("must specify '--interest-offset' when using '--interest'");
        }
        if self.interest.is_none() && self.interest_offset.is_some() && self.input == "-" {
            bail!("cannot derive the interest file name from stdin; pass '--interest'");
        }
        Ok(())
    }

    fn interest_path(&self) -> Option<PathBuf> {
        match (&self.interest, self.interest_offset) {
            (Some(path), _) => Some(path.clone()),
            (None, Some(_)) => Some(PathBuf::from(self.input.replace(".qpro", ".interest"))),
            (None, None) => None,
        }
    }
}

fn verify(problem: &Problem) -> anyhow::Result<()> {
    let text = to_cqbf_string(problem);
    let back = read_cqbf(text.as_bytes()).context("the produced CQBF could not be read back")?;
    if &back != problem {
        bail!("the produced CQBF does not reproduce the parsed circuit");
    }
    info!("CQBF output verified ({} gates)", back.num_gates());
    Ok(())
}

fn run(args: &Args, logger: &Logger) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut options = ParseOptions::default()
        .with_max_depth(args.max_depth)
        .with_offset(args.interest_offset.unwrap_or(0));
    if let Some(path) = args.interest_path() {
        info!("reading interest variables from {}", path.display());
        let file = File::open(&path)
            .with_context(|| format!("Failed to open interest file {}", path.display()))?;
        let interest = read_interest(BufReader::new(file), args.interest_offset.unwrap_or(0))
            .with_context(|| format!("Bad interest file {}", path.display()))?;
        options = options.with_interest(interest);
    }

    info!("parsing {}", args.input);
    let problem = if args.input == "-" {
        parse_qpro(io::stdin().lock(), &options)
    } else {
        let file = File::open(&args.input)
            .with_context(|| format!("Failed to open input file {}", args.input))?;
        parse_qpro(BufReader::new(file), &options)
    }
    .with_context(|| format!("Failed parsing {}", args.input))?;

    if args.verify {
        verify(&problem)?;
    }

    match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file {}", path.display()))?;
            write_cqbf(&problem, &mut BufWriter::new(file))
                .with_context(|| format!("Failed writing {}", path.display()))?;
        }
        None => write_cqbf(&problem, &mut io::stdout().lock()).context("Failed writing stdout")?,
    }

    logger.log(
        &format!(
            "Done converting from QPRO, {:.4} sec",
            start.elapsed().as_secs_f64()
        ),
        1,
    );
    Ok(())
}

fn main() {
    env_logger::init();
    let args = Args::parse();
    let logger = if args.quiet {
        Logger::quiet()
    } else {
        Logger::new(true, 1)
    };
    if let Err(e) = args.validate() {
        logger.raise_error(&e.to_string(), 5);
    }
    if let Err(e) = run(&args, &logger) {
        logger.raise_error(&format!("{:#}", e), 5);
    }
}
