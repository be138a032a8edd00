//! Tests for CLI argument parsing.

use std::path::PathBuf;

use super::cli::{Cli, Command};

mod parsing {
    use super::*;

    #[test]
    fn show_with_files_and_assignments() {
        let cli = Cli::parse_from_iter([
            "traitconf",
            "show",
            "-f",
            "base.py",
            "--config-file",
            "user.json",
            "--",
            "--Foo.a=1",
            "extra",
        ]);

        let Command::Show {
            config_files,
            json,
            args,
        } = cli.command
        else {
            panic!("expected show");
        };
        assert_eq!(
            config_files,
            [PathBuf::from("base.py"), PathBuf::from("user.json")]
        );
        assert!(!json);
        assert_eq!(args, ["--Foo.a=1", "extra"]);
        assert!(!cli.verbose);
    }

    #[test]
    fn show_json_verbose() {
        let cli = Cli::parse_from_iter(["traitconf", "show", "--json", "-v"]);
        assert!(cli.verbose);
        assert!(matches!(
            cli.command,
            Command::Show { json: true, ref config_files, ref args }
                if config_files.is_empty() && args.is_empty()
        ));
    }

    #[test]
    fn collisions() {
        let cli = Cli::parse_from_iter(["traitconf", "collisions", "a.json", "b.py"]);
        let Command::Collisions { first, second } = cli.command else {
            panic!("expected collisions");
        };
        assert_eq!(first, PathBuf::from("a.json"));
        assert_eq!(second, PathBuf::from("b.py"));
    }
}

mod errors {
    use super::*;

    #[test]
    fn subcommand_is_required() {
        assert!(Cli::try_parse_from_iter(["traitconf"]).is_err());
    }

    #[test]
    fn collisions_needs_two_files() {
        assert!(Cli::try_parse_from_iter(["traitconf", "collisions", "a.json"]).is_err());
    }

    #[test]
    fn assignments_must_follow_double_dash() {
        assert!(Cli::try_parse_from_iter(["traitconf", "show", "--Foo.a=1"]).is_err());
    }
}
