//! File handling for the binary: naming outputs, reading inputs, writing results.
//!
//! Each input is read whole. XPRESS Huffman back-references may reach across chunks, and the
//! compressed stream does not say how large the output will be, so neither side can stream.

use std::fs::{self, OpenOptions};
use std::io::{self, Read, Write};

use log::{error, info, warn};

use super::cli::{Mode, Output, XpOpts};

/// Extension of compressed files.
pub const EXTENSION: &str = ".xph";

/// `name` -> `name.xph`
pub fn compressed_name(name: &str) -> String {
    format!("{}{}", name, EXTENSION)
}

/// `name.xph` -> `name`, anything else gets `.out` appended.
pub fn decompressed_name(name: &str) -> String {
    match name.strip_suffix(EXTENSION) {
        Some(stem) if !stem.is_empty() => stem.to_string(),
        _ => format!("{}.out", name),
    }
}

/// One input to process and where its result goes. `None` is stdin or stdout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub input: Option<String>,
    pub output: Option<String>,
}

impl Job {
    fn plan(opts: &XpOpts, rename: fn(&str) -> String) -> Vec<Job> {
        if opts.files.is_empty() {
            return vec![Job {
                input: None,
                output: None,
            }];
        }
        opts.files
            .iter()
            .map(|f| Job {
                input: Some(f.clone()),
                output: match (opts.op_mode, opts.output) {
                    (Mode::Test, _) | (_, Output::Stdout) => None,
                    _ => Some(rename(f)),
                },
            })
            .collect()
    }

    pub fn for_compression(opts: &XpOpts) -> Vec<Job> {
        Self::plan(opts, compressed_name)
    }

    pub fn for_decompression(opts: &XpOpts) -> Vec<Job> {
        Self::plan(opts, decompressed_name)
    }

    pub fn source_name(&self) -> &str {
        self.input.as_deref().unwrap_or("<stdin>")
    }
}

/// Read the whole input of a job.
pub fn read_input(job: &Job) -> io::Result<Vec<u8>> {
    match &job.input {
        Some(name) => fs::read(name).map_err(|e| {
            error!("Can't read {}: {}", name, e);
            e
        }),
        None => {
            let mut data = Vec::new();
            io::stdin().lock().read_to_end(&mut data)?;
            Ok(data)
        }
    }
}

/// Write the result of a job, then remove its input unless told to keep it.
pub fn write_output(job: &Job, opts: &XpOpts, data: &[u8]) -> io::Result<()> {
    let name = match &job.output {
        Some(name) => name,
        None => {
            let mut out = io::stdout().lock();
            out.write_all(data)?;
            return out.flush();
        }
    };

    let mut options = OpenOptions::new();
    options.write(true);
    if opts.force_overwrite {
        options.create(true).truncate(true);
    } else {
        options.create_new(true);
    }
    let mut f_out = options.open(name).map_err(|e| {
        if e.kind() == io::ErrorKind::AlreadyExists {
            error!("Output file {} already exists, use -f to overwrite", name);
        } else {
            error!("Can't open {} for writing: {}", name, e);
        }
        e
    })?;
    f_out.write_all(data)?;
    info!("Wrote {} bytes to {}", data.len(), name);

    if let Some(input) = &job.input {
        if !opts.keep_input_files {
            if let Err(e) = fs::remove_file(input) {
                warn!("Could not remove input file {}: {}", input, e);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn names_test() {
        assert_eq!(compressed_name("data.bin"), "data.bin.xph");
        assert_eq!(decompressed_name("data.bin.xph"), "data.bin");
        assert_eq!(decompressed_name("data.bin"), "data.bin.out");
        assert_eq!(decompressed_name(".xph"), ".xph.out");
    }

    #[test]
    fn plan_test() {
        let mut opts = XpOpts::new();
        assert_eq!(
            Job::for_compression(&opts),
            vec![Job {
                input: None,
                output: None
            }]
        );

        opts.files = vec!["a".into(), "b.xph".into()];
        let jobs = Job::for_decompression(&opts);
        assert_eq!(jobs[0].output.as_deref(), Some("a.out"));
        assert_eq!(jobs[1].output.as_deref(), Some("b"));

        opts.output = Output::Stdout;
        assert!(Job::for_compression(&opts).iter().all(|j| j.output.is_none()));

        opts.output = Output::File;
        opts.op_mode = Mode::Test;
        assert!(Job::for_decompression(&opts).iter().all(|j| j.output.is_none()));
    }

    #[test]
    fn write_and_remove_test() {
        let dir = std::env::temp_dir().join(format!("xpress-huff-files-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let input = dir.join("in.txt").to_string_lossy().into_owned();
        let output = compressed_name(&input);
        fs::write(&input, b"hello").unwrap();
        let _ = fs::remove_file(&output);

        let opts = XpOpts::new();
        let job = Job {
            input: Some(input.clone()),
            output: Some(output.clone()),
        };
        write_output(&job, &opts, b"packed").unwrap();
        assert_eq!(fs::read(&output).unwrap(), b"packed");
        assert!(fs::metadata(&input).is_err());

        // Existing output is left alone without force
        fs::write(&input, b"hello").unwrap();
        let err = write_output(&job, &opts, b"other").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
        assert_eq!(fs::read(&output).unwrap(), b"packed");
        assert!(fs::metadata(&input).is_ok());

        fs::remove_dir_all(&dir).unwrap();
    }
}
