//! CLI argument surface, out of scope for the core codec: `clap` derive, one
//! flat struct, with level-string parsing kept local to this module since it
//! has no bearing on the codec itself.

use clap::Parser;

use crate::lzo::level::Level;

/// Block-parallel LZO1X compressor/decompressor.
#[derive(Parser, Debug)]
#[command(name = "lzopar", version, about = "Block-parallel LZO1X codec", disable_version_flag = true)]
pub struct Cli {
    /// Input file path, or "-" for stdin.
    pub input: String,

    /// Output file path, or "-" for stdout. If omitted, compress appends
    /// `.lzo` and decompress strips it (or prefixes `decompressed_` if the
    /// input has no `.lzo` suffix).
    pub output: Option<String>,

    /// Decompress instead of compress. Mutually exclusive with `-L`.
    #[arg(short = 'd', conflicts_with = "level")]
    pub decompress: bool,

    /// Compressor variant: one of `1`, `1k`, `1l`, `1o`. Invalid with `-d`.
    #[arg(short = 'L', value_parser = parse_level, conflicts_with = "decompress")]
    pub level: Option<Level>,

    /// Worker thread count.
    #[arg(short = 't', long = "threads")]
    pub threads: Option<usize>,

    /// Re-decompress the result in memory and compare against the input
    /// before writing it; suppresses the output file unless `-o`/a
    /// positional output path was given explicitly.
    #[arg(long = "verify")]
    pub verify: bool,

    /// Run a single-block and multi-block timed pass after the primary
    /// operation and report both.
    #[arg(short = 'b', long = "benchmark")]
    pub benchmark: bool,
}

/// Parses the `-L` variant string. Named after the on-disk kernel binaries
/// (`lzo1x_1[.bin]`, `lzo1x_1k[.bin]`, ...) rather than the numeric level
/// the daemon protocol and `Level::from_cli` use — the CLI names a variant
/// directly, the daemon protocol names a 1-9 "compression level" that maps
/// onto a variant.
fn parse_level(s: &str) -> Result<Level, String> {
    match s {
        "1" => Ok(Level::X),
        "1k" => Ok(Level::K),
        "1l" => Ok(Level::L),
        "1o" => Ok(Level::O),
        other => Err(format!("invalid level `{other}` (expected one of: 1, 1k, 1l, 1o)")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn parses_input_and_output_positionals() {
        let cli = Cli::parse_from(["lzopar", "in.bin", "out.lzo"]);
        assert_eq!(cli.input, "in.bin");
        assert_eq!(cli.output.as_deref(), Some("out.lzo"));
    }

    #[test]
    fn parses_each_level_string() {
        for (s, expected) in [("1", Level::X), ("1k", Level::K), ("1l", Level::L), ("1o", Level::O)] {
            let cli = Cli::parse_from(["lzopar", "in.bin", "-L", s]);
            assert_eq!(cli.level, Some(expected));
        }
    }

    #[test]
    fn rejects_an_unknown_level_string() {
        assert!(Cli::try_parse_from(["lzopar", "in.bin", "-L", "9"]).is_err());
    }

    #[test]
    fn decompress_and_level_are_mutually_exclusive() {
        assert!(Cli::try_parse_from(["lzopar", "in.bin", "-d", "-L", "1"]).is_err());
    }

    #[test]
    fn threads_verify_and_benchmark_flags_parse() {
        let cli = Cli::parse_from(["lzopar", "in.bin", "-t", "8", "--verify", "-b"]);
        assert_eq!(cli.threads, Some(8));
        assert!(cli.verify);
        assert!(cli.benchmark);
    }
}
