// FILE: crates/cli/src/main.rs

use anyhow::Result;
use clap::{Arg, ArgAction, Command};

mod commands;

use commands::Workspace;

fn build_cli() -> Command {
    Command::new("smartbook")
        .version(env!("CARGO_PKG_VERSION"))
        .author("SmartBook Contributors")
        .about("Audiobook library, bookmarks, clips and listening reports")
        .arg(
            Arg::new("config-dir")
                .short('c')
                .long("config-dir")
                .value_name("DIR")
                .help("Directory holding config.toml (defaults to the platform config dir)")
                .global(true),
        )
        .subcommand(
            Command::new("import")
                .about("Import an audio file or every supported file in a directory")
                .arg(
                    Arg::new("path")
                        .required(true)
                        .value_name("PATH")
                        .help("Audio file or directory"),
                ),
        )
        .subcommand(Command::new("list").about("List the books in the library"))
        .subcommand(
            Command::new("bookmarks")
                .about("Show the bookmarks saved for a book")
                .arg(book_key_arg()),
        )
        .subcommand(
            Command::new("clips")
                .about("Show the clips saved for a book")
                .arg(book_key_arg()),
        )
        .subcommand(
            Command::new("report")
                .about("Show listening time per day")
                .arg(
                    Arg::new("days")
                        .short('d')
                        .long("days")
                        .value_name("N")
                        .help("Number of days to show, ending today")
                        .value_parser(clap::value_parser!(u32).range(1..=366))
                        .default_value("7"),
                ),
        )
        .subcommand(
            Command::new("export-clip")
                .about("Write a saved clip to a WAV file")
                .arg(book_key_arg())
                .arg(
                    Arg::new("clip")
                        .required(true)
                        .value_name("CLIP_ID")
                        .help("Clip id as shown by 'clips'"),
                )
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .value_name("FILE")
                        .help("Output file (defaults to clip-<ID>.wav)"),
                )
                .arg(
                    Arg::new("mono")
                        .long("mono")
                        .help("Mix all channels down to one")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("config")
                .about("Manage the configuration file")
                .subcommand_required(true)
                .subcommand(Command::new("init").about("Write a default config file if none exists"))
                .subcommand(Command::new("show").about("Print the effective configuration"))
                .subcommand(Command::new("path").about("Print config, session and library paths")),
        )
}

fn book_key_arg() -> Arg {
    Arg::new("key")
        .required(true)
        .value_name("KEY")
        .help("Book key (the imported file name)")
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = build_cli().get_matches();
    let config_dir = matches.get_one::<String>("config-dir").map(|s| s.as_str());

    let workspace = Workspace::open(config_dir)?;
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(workspace.config().app.log_level.to_string()),
    )
    .init();

    match matches.subcommand() {
        Some(("import", sub_matches)) => commands::import(&workspace, sub_matches),
        Some(("list", _)) => commands::list_books(&workspace),
        Some(("bookmarks", sub_matches)) => commands::show_bookmarks(&workspace, sub_matches),
        Some(("clips", sub_matches)) => commands::show_clips(&workspace, sub_matches),
        Some(("report", sub_matches)) => commands::listening_report(&workspace, sub_matches),
        Some(("export-clip", sub_matches)) => {
            commands::export_clip(&workspace, sub_matches).await
        }
        Some(("config", sub_matches)) => commands::config(&workspace, sub_matches),
        _ => {
            build_cli().print_help()?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_consistent() {
        build_cli().debug_assert();
    }

    #[test]
    fn test_parse_export_clip() {
        let matches = build_cli()
            .try_get_matches_from([
                "smartbook",
                "export-clip",
                "book.m4b",
                "7",
                "--mono",
                "-o",
                "out.wav",
            ])
            .unwrap();
        let (name, sub) = matches.subcommand().unwrap();
        assert_eq!(name, "export-clip");
        assert_eq!(sub.get_one::<String>("key").unwrap(), "book.m4b");
        assert_eq!(sub.get_one::<String>("clip").unwrap(), "7");
        assert!(sub.get_flag("mono"));
    }

    #[test]
    fn test_report_days_bounds() {
        let matches = build_cli()
            .try_get_matches_from(["smartbook", "report"])
            .unwrap();
        let (_, sub) = matches.subcommand().unwrap();
        assert_eq!(sub.get_one::<u32>("days"), Some(&7));

        assert!(build_cli()
            .try_get_matches_from(["smartbook", "report", "--days", "0"])
            .is_err());
    }

    #[test]
    fn test_global_config_dir() {
        let matches = build_cli()
            .try_get_matches_from(["smartbook", "list", "--config-dir", "/tmp/sb"])
            .unwrap();
        assert_eq!(
            matches.get_one::<String>("config-dir").map(|s| s.as_str()),
            Some("/tmp/sb")
        );
    }
}
