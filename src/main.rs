//Enable more cargo lint tests
#![warn(rust_2018_idioms)]

use log::{error, info, LevelFilter};
use simplelog::{Config, TermLogger, TerminalMode};

use xpress_huff::compression::compress::compress_files;
use xpress_huff::compression::decompress::decompress_files;
use xpress_huff::tools::cli::{xpopts_init, Mode};

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

fn main() -> Result<(), std::io::Error> {
    // Available log levels are Error, Warn, Info, Debug, Trace. Output goes to stderr so that
    // -c can use stdout for data.
    if let Err(e) = TermLogger::init(
        LevelFilter::Trace,
        Config::default(),
        TerminalMode::Stderr,
        simplelog::ColorChoice::Auto,
    ) {
        eprintln!("Could not start the logger: {}", e);
    }

    let options = xpopts_init();

    //----- Figure how what we need to do and go do it
    let result = match options.op_mode {
        Mode::Zip => compress_files(&options),
        Mode::Unzip | Mode::Test => decompress_files(&options),
    };

    match &result {
        Ok(()) => info!("Done.\n"),
        Err(e) => error!("Failed: {}", e),
    }
    result
}
