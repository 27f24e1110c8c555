//! Convert CIF or BinaryCIF files to BinaryCIF (or back to CIF text).
//!
//! ```text
//! cif2bcif 1abc.cif 1abc.bcif
//! cif2bcif 1abc.cif.gz 1abc.bcif.gz --gzip --hints hints.json
//! cif2bcif 1abc.bcif 1abc.cif --text --filter atom_site.filter
//! ```

use std::fs::File;
use std::io::Write;
use std::ops::ControlFlow;
use std::path::PathBuf;

use clap::Parser;
use flate2::write::GzEncoder;
use flate2::Compression;

use molpack::convert::{convert, ConvertOptions, Progress};

#[derive(Parser, Debug)]
#[command(name = "cif2bcif", about = "Encode CIF files as BinaryCIF")]
struct Args {
    /// Input file (.cif, .bcif, optionally .gz)
    #[arg(value_name = "SRC")]
    src: PathBuf,

    /// Output file
    #[arg(value_name = "DST")]
    dst: PathBuf,

    /// Write CIF text instead of BinaryCIF
    #[arg(long)]
    text: bool,

    /// JSON file with per-column encoding hints
    #[arg(long, value_name = "FILE")]
    hints: Option<PathBuf>,

    /// File with category/field include and `!` exclude directives
    #[arg(long, value_name = "FILE")]
    filter: Option<PathBuf>,

    /// Gzip the output
    #[arg(long)]
    gzip: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    if let Err(err) = run(args) {
        log::error!("{err}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let options = ConvertOptions {
        as_text: args.text,
        hints: args.hints.map(std::fs::read_to_string).transpose()?,
        filter: args.filter.map(std::fs::read_to_string).transpose()?,
    };

    let mut last_percent = None;
    let mut report = |p: &Progress| {
        let percent = if p.max == 0 { 100 } else { p.current * 100 / p.max };
        if last_percent != Some(percent / 10) {
            last_percent = Some(percent / 10);
            log::info!("{} {}%", p.message, percent);
        }
        log::debug!("{} {}/{}", p.message, p.current, p.max);
        ControlFlow::Continue(())
    };
    let data = convert(&args.src, &options, &mut report)?;

    let file = File::create(&args.dst)?;
    if args.gzip {
        let mut gz = GzEncoder::new(file, Compression::default());
        gz.write_all(&data)?;
        gz.finish()?;
    } else {
        let mut file = file;
        file.write_all(&data)?;
    }
    log::info!("written to {}", args.dst.display());
    Ok(())
}
