use std::{fmt::Display, fmt::Formatter};

use clap::Parser;
use log::{info, warn};

/// Verbosity of user information
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Errors,
    Warnings,
    Info,
    Debug,
    Trace,
}

/// Zip, Unzip, Test
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Zip,
    Unzip,
    Test,
}
impl Display for Mode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Define the two output channels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Output {
    File,
    Stdout,
}
impl Display for Output {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Largest decompressed output the binary will allocate unless told otherwise.
pub const DEFAULT_MAX_OUTPUT: usize = 1 << 30;

#[derive(Debug)]
pub struct XpOpts {
    /// Vec of names of files to read for input. Empty means stdin.
    pub files: Vec<String>,
    /// Silently overwrite existing files with the same name
    pub force_overwrite: bool,
    /// Don't remove input files after processing
    pub keep_input_files: bool,
    /// Match search effort, 1..9
    pub level: u8,
    /// Decompressed size limit per input
    pub max_output: usize,
    /// Compress/Decompress/Test
    pub op_mode: Mode,
    /// Location where output is sent
    pub output: Output,
    /// Verbosity of user information
    pub verbose: Verbosity,
}

impl XpOpts {
    pub fn new() -> Self {
        Self {
            files: vec![],
            force_overwrite: false,
            keep_input_files: false,
            level: 6,
            max_output: DEFAULT_MAX_OUTPUT,
            op_mode: Mode::Zip,
            output: Output::File,
            verbose: Verbosity::Info,
        }
    }
}

impl Default for XpOpts {
    fn default() -> Self {
        Self::new()
    }
}

/// Command Line Interpretation - uses external CLAP crate.
#[derive(Parser, Debug)]
#[clap(
    version,
    about = "XPRESS Huffman compression and decompression",
    long_about = "
    XPRESS Huffman is the LZ77 plus Huffman format Microsoft uses for hibernation files,
    Windows Update payloads and several network protocols. Data is cut into 64 KiB chunks,
    each carrying its own Huffman code.

    The format does not record the decompressed size, so decompression grows its buffer
    as needed, up to --max-output bytes."
)]
pub struct Args {
    /// Files to process. Reads stdin and writes stdout when none are given.
    #[clap()]
    files: Vec<String>,

    /// Perform compression on the input files (the default)
    #[clap(short = 'z', long = "compress")]
    compress: bool,

    /// Perform decompression on the input files
    #[clap(short = 'd', long = "decompress")]
    decompress: bool,

    /// Test compressed file integrity
    #[clap(short = 't', long = "test")]
    test: bool,

    /// Keep input files
    #[clap(short = 'k', long = "keep")]
    keep: bool,

    /// Force overwriting output files
    #[clap(short = 'f', long = "force")]
    force: bool,

    /// Send output to the terminal
    #[clap(short = 'c', long = "stdout")]
    stdout: bool,

    /// Sets verbosity. -v0 is silent, -v5 is chatty
    #[clap(short = 'v', default_value_t = 3)]
    v: u8,

    /// 1..9 - Match search effort. 1 is fastest, 9 compresses best
    #[clap(short = 'l', long = "level", default_value_t = 6)]
    level: u8,

    /// Largest decompressed size accepted, in bytes
    #[clap(long = "max-output", default_value_t = DEFAULT_MAX_OUTPUT)]
    max_output: usize,
}

impl From<Args> for XpOpts {
    fn from(args: Args) -> Self {
        let op_mode = if args.test {
            Mode::Test
        } else if args.decompress && !args.compress {
            Mode::Unzip
        } else {
            Mode::Zip
        };
        let verbose = match args.v {
            0 => Verbosity::Quiet,
            1 => Verbosity::Errors,
            2 => Verbosity::Warnings,
            3 => Verbosity::Info,
            4 => Verbosity::Debug,
            _ => Verbosity::Trace,
        };
        Self {
            files: args.files,
            force_overwrite: args.force,
            keep_input_files: args.keep,
            level: args.level.clamp(1, 9),
            max_output: args.max_output,
            op_mode,
            output: if args.stdout {
                Output::Stdout
            } else {
                Output::File
            },
            verbose,
        }
    }
}

/// Parse the command line into XpOpts and set the log level to match.
pub fn xpopts_init() -> XpOpts {
    let opts = XpOpts::from(Args::parse());

    // Set the log level
    match opts.verbose {
        Verbosity::Quiet => log::set_max_level(log::LevelFilter::Off),
        Verbosity::Errors => log::set_max_level(log::LevelFilter::Error),
        Verbosity::Warnings => log::set_max_level(log::LevelFilter::Warn),
        Verbosity::Info => log::set_max_level(log::LevelFilter::Info),
        Verbosity::Debug => log::set_max_level(log::LevelFilter::Debug),
        Verbosity::Trace => log::set_max_level(log::LevelFilter::Trace),
    };

    info!("---- XPRESS Huffman Initialization Start ----");
    info!("Verbosity set to {}", log::max_level());
    info!("Operational mode set to {}", opts.op_mode);
    if opts.files.is_empty() {
        warn!("Reading stdin, sending output to stdout");
    }
    for f in &opts.files {
        info!("Getting input from the file {}", f);
    }
    info!("Output goes to {}", opts.output);
    info!("Compression level set to {}", opts.level);
    if opts.force_overwrite {
        info!("Forcing file overwriting")
    };
    if opts.keep_input_files {
        info!("Keeping input files")
    };
    info!("---- XPRESS Huffman Initialization End ----\n");
    opts
}

#[cfg(test)]
mod test {
    use super::*;

    fn parse(args: &[&str]) -> XpOpts {
        XpOpts::from(Args::try_parse_from(args.iter().copied()).unwrap())
    }

    #[test]
    fn defaults_test() {
        let opts = parse(&["xpress-huff", "a.txt"]);
        assert_eq!(opts.op_mode, Mode::Zip);
        assert_eq!(opts.output, Output::File);
        assert_eq!(opts.level, 6);
        assert_eq!(opts.max_output, DEFAULT_MAX_OUTPUT);
        assert_eq!(opts.verbose, Verbosity::Info);
        assert_eq!(opts.files, vec!["a.txt".to_string()]);
    }

    #[test]
    fn flags_test() {
        let opts = parse(&[
            "xpress-huff",
            "-d",
            "-k",
            "-f",
            "-c",
            "-v",
            "5",
            "-l",
            "12",
            "--max-output",
            "4096",
            "x.xph",
            "y.xph",
        ]);
        assert_eq!(opts.op_mode, Mode::Unzip);
        assert!(opts.keep_input_files && opts.force_overwrite);
        assert_eq!(opts.output, Output::Stdout);
        assert_eq!(opts.verbose, Verbosity::Trace);
        assert_eq!(opts.level, 9);
        assert_eq!(opts.max_output, 4096);
        assert_eq!(opts.files.len(), 2);
    }

    #[test]
    fn mode_precedence_test() {
        let opts = parse(&["xpress-huff", "-t", "-d", "x.xph"]);
        assert_eq!(opts.op_mode, Mode::Test);
        let opts = parse(&["xpress-huff", "-d", "-z", "x"]);
        assert_eq!(opts.op_mode, Mode::Zip);
    }
}
