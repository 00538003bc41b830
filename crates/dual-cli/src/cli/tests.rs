#[cfg(test)]
mod tests {
    use crate::cli::{Cli, Command, Differential};
    use clap::Parser;
    use std::path::PathBuf;

    #[test]
    fn build_defaults() {
        let cli = Cli::try_parse_from(["dual", "build"]).unwrap();
        let Command::Build(args) = cli.command else {
            panic!("expected build");
        };
        assert_eq!(args.cwd, PathBuf::from("."));
        assert_eq!(args.differential, None);
        assert!(!args.minify);
    }

    #[test]
    fn build_differential_override() {
        let cli = Cli::try_parse_from(["dual", "build", "--differential", "off", "--cwd", "app"])
            .unwrap();
        let Command::Build(args) = cli.command else {
            panic!("expected build");
        };
        assert_eq!(args.differential, Some(Differential::Off));
        assert_eq!(cli_cwd(["dual", "build", "--cwd", "app"]), PathBuf::from("app"));
    }

    #[test]
    fn cache_key_flags() {
        let cli = Cli::try_parse_from(["dual", "cache-key", "--server", "--has-modern"]).unwrap();
        let Command::CacheKey(args) = cli.command else {
            panic!("expected cache-key");
        };
        assert!(args.server);
        assert!(!args.modern);
        assert!(args.has_modern);
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["dual", "targets", "--verbose", "--no-color"]).unwrap();
        assert!(cli.verbose);
        assert!(cli.no_color);
    }

    #[test]
    fn verbose_conflicts_with_quiet() {
        assert!(Cli::try_parse_from(["dual", "-v", "-q", "targets"]).is_err());
    }

    #[test]
    fn unknown_differential_mode_is_rejected() {
        assert!(Cli::try_parse_from(["dual", "build", "--differential", "maybe"]).is_err());
    }

    fn cli_cwd<const N: usize>(args: [&str; N]) -> PathBuf {
        Cli::try_parse_from(args).unwrap().command.cwd()
    }
}
