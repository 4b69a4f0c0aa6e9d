//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use mediagrab_core::MediaKind;

/// Fetch media from content platforms and deliver it as a ready-to-send file.
///
/// Mediagrab walks a ranked ladder of retrieval configurations per platform,
/// so a single blocked fingerprint does not sink the whole request.
#[derive(Parser, Debug)]
#[command(name = "mediagrab")]
#[command(author, version, about)]
pub struct Args {
    /// Media URL (YouTube, Twitter/X, Instagram, SoundCloud)
    pub url: String,

    /// Media kind to deliver
    #[arg(short, long, value_enum, default_value_t = KindArg::Video)]
    pub kind: KindArg,

    /// Directory the delivered file is placed in
    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Override the payload size ceiling in megabytes
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..=2000))]
    pub max_size_mb: Option<u64>,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}

/// Media kind as a CLI value.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindArg {
    Audio,
    Video,
}

impl From<KindArg> for MediaKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Audio => Self::Audio,
            KindArg::Video => Self::Video,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_url_is_required() {
        let result = Args::try_parse_from(["mediagrab"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_defaults() {
        let args = Args::try_parse_from(["mediagrab", "https://youtu.be/abc"]).unwrap();
        assert_eq!(args.kind, KindArg::Video);
        assert_eq!(args.output_dir, PathBuf::from("."));
        assert_eq!(args.max_size_mb, None);
        assert_eq!(args.verbose, 0);
        assert!(!args.quiet);
    }

    #[test]
    fn test_cli_kind_flag_parses() {
        let args =
            Args::try_parse_from(["mediagrab", "https://youtu.be/abc", "--kind", "audio"]).unwrap();
        assert_eq!(args.kind, KindArg::Audio);
        assert_eq!(MediaKind::from(args.kind), MediaKind::Audio);
    }

    #[test]
    fn test_cli_invalid_kind_rejected() {
        let result =
            Args::try_parse_from(["mediagrab", "https://youtu.be/abc", "--kind", "subtitles"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_max_size_range_enforced() {
        let result =
            Args::try_parse_from(["mediagrab", "https://youtu.be/abc", "--max-size-mb", "0"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_verbose_flag_increments_count() {
        let args = Args::try_parse_from(["mediagrab", "https://youtu.be/abc", "-vv"]).unwrap();
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_cli_help_flag_shows_usage() {
        // --help causes early exit, so we check it returns an error with Help kind
        let result = Args::try_parse_from(["mediagrab", "--help"]);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }
}
