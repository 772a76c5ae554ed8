pub mod logging;

use clap::{
    builder::styling::{AnsiColor, Effects, Styles},
    Arg, ColorChoice, Command,
};
use std::net::IpAddr;

pub const ARG_PORT: &str = "port";
pub const ARG_LISTEN: &str = "listen";
pub const ARG_DSN: &str = "dsn";
pub const ARG_DB_PASSWORD: &str = "db-password";
pub const ARG_PRIVATE_KEY: &str = "private-key";
pub const ARG_KDF_ITERATIONS: &str = "kdf-iterations";
pub const ARG_MAX_USERNAME_LENGTH: &str = "max-username-length";
pub const ARG_MAX_PASSWORD_LENGTH: &str = "max-password-length";
pub const ARG_COOKIE_MAX_AGE: &str = "cookie-max-age";

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("passgate")
        .about("Username/password authentication service")
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new(ARG_PORT)
                .short('p')
                .long("port")
                .help("Port to listen on")
                .default_value("4433")
                .env("PASSGATE_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new(ARG_LISTEN)
                .short('l')
                .long("listen")
                .help("Address to bind")
                .default_value("::")
                .env("PASSGATE_LISTEN")
                .value_parser(clap::value_parser!(IpAddr)),
        )
        .arg(
            Arg::new(ARG_DSN)
                .short('d')
                .long("dsn")
                .help("Postgres connection string")
                .long_help(
                    "Postgres connection string. Without it users are kept in memory and lost on restart.",
                )
                .env("PASSGATE_DSN"),
        )
        .arg(
            Arg::new(ARG_DB_PASSWORD)
                .long("db-password")
                .help("Database password, injected into the DSN")
                .env("PASSGATE_DB_PASSWORD")
                .hide_env_values(true)
                .requires(ARG_DSN),
        )
        .arg(
            Arg::new(ARG_PRIVATE_KEY)
                .short('k')
                .long("private-key")
                .help("Path to the RSA private key (PEM or DER, PKCS#8 or PKCS#1)")
                .env("PASSGATE_PRIVATE_KEY")
                .required(true),
        )
        .arg(
            Arg::new(ARG_KDF_ITERATIONS)
                .long("kdf-iterations")
                .help("PBKDF2 iteration count")
                .default_value("100000")
                .env("PASSGATE_KDF_ITERATIONS")
                .value_parser(clap::value_parser!(u32).range(1..)),
        )
        .arg(
            Arg::new(ARG_MAX_USERNAME_LENGTH)
                .long("max-username-length")
                .help("Maximum username length in characters")
                .default_value("16")
                .env("PASSGATE_MAX_USERNAME_LENGTH")
                .value_parser(clap::value_parser!(u16).range(1..)),
        )
        .arg(
            Arg::new(ARG_MAX_PASSWORD_LENGTH)
                .long("max-password-length")
                .help("Maximum password length in characters")
                .default_value("64")
                .env("PASSGATE_MAX_PASSWORD_LENGTH")
                .value_parser(clap::value_parser!(u16).range(1..)),
        )
        .arg(
            Arg::new(ARG_COOKIE_MAX_AGE)
                .long("cookie-max-age")
                .help("Max-Age of the token cookie, in seconds")
                .default_value("7776000")
                .env("PASSGATE_COOKIE_MAX_AGE")
                .value_parser(clap::value_parser!(u64)),
        );

    logging::with_args(command)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENV_VARS: [&str; 10] = [
        "PASSGATE_PORT",
        "PASSGATE_LISTEN",
        "PASSGATE_DSN",
        "PASSGATE_DB_PASSWORD",
        "PASSGATE_PRIVATE_KEY",
        "PASSGATE_KDF_ITERATIONS",
        "PASSGATE_MAX_USERNAME_LENGTH",
        "PASSGATE_MAX_PASSWORD_LENGTH",
        "PASSGATE_COOKIE_MAX_AGE",
        "PASSGATE_LOG_LEVEL",
    ];

    fn with_clean_env<F: FnOnce()>(vars: &[(&str, &str)], f: F) {
        let mut all: Vec<(&str, Option<&str>)> = ENV_VARS
            .iter()
            .filter(|name| !vars.iter().any(|(set, _)| set == *name))
            .map(|name| (*name, None))
            .collect();
        all.extend(vars.iter().map(|(name, value)| (*name, Some(*value))));
        temp_env::with_vars(all, f);
    }

    #[test]
    fn test_new() {
        let command = new();
        assert_eq!(command.get_name(), "passgate");
        assert_eq!(
            command.get_version().map(ToString::to_string),
            Some(env!("CARGO_PKG_VERSION").to_string())
        );
    }

    #[test]
    fn test_defaults() {
        with_clean_env(&[], || {
            let matches =
                new().get_matches_from(vec!["passgate", "--private-key", "/tmp/key.pem"]);
            assert_eq!(matches.get_one::<u16>(ARG_PORT).copied(), Some(4433));
            assert_eq!(
                matches.get_one::<IpAddr>(ARG_LISTEN).map(ToString::to_string),
                Some("::".to_string())
            );
            assert_eq!(matches.get_one::<String>(ARG_DSN), None);
            assert_eq!(
                matches.get_one::<u32>(ARG_KDF_ITERATIONS).copied(),
                Some(100_000)
            );
            assert_eq!(
                matches.get_one::<u16>(ARG_MAX_USERNAME_LENGTH).copied(),
                Some(16)
            );
            assert_eq!(
                matches.get_one::<u16>(ARG_MAX_PASSWORD_LENGTH).copied(),
                Some(64)
            );
            assert_eq!(
                matches.get_one::<u64>(ARG_COOKIE_MAX_AGE).copied(),
                Some(7_776_000)
            );
        });
    }

    #[test]
    fn test_private_key_required() {
        with_clean_env(&[], || {
            let result = new().try_get_matches_from(vec!["passgate"]);
            assert!(result.is_err());
        });
    }

    #[test]
    fn test_check_env() {
        with_clean_env(
            &[
                ("PASSGATE_PORT", "8443"),
                ("PASSGATE_LISTEN", "127.0.0.1"),
                ("PASSGATE_DSN", "postgres://passgate@localhost:5432/passgate"),
                ("PASSGATE_DB_PASSWORD", "hunter2"),
                ("PASSGATE_PRIVATE_KEY", "/etc/passgate/key.pem"),
                ("PASSGATE_KDF_ITERATIONS", "5000"),
                ("PASSGATE_LOG_LEVEL", "info"),
            ],
            || {
                let matches = new().get_matches_from(vec!["passgate"]);
                assert_eq!(matches.get_one::<u16>(ARG_PORT).copied(), Some(8443));
                assert_eq!(
                    matches.get_one::<String>(ARG_DSN).cloned(),
                    Some("postgres://passgate@localhost:5432/passgate".to_string())
                );
                assert_eq!(
                    matches.get_one::<String>(ARG_DB_PASSWORD).cloned(),
                    Some("hunter2".to_string())
                );
                assert_eq!(
                    matches.get_one::<String>(ARG_PRIVATE_KEY).cloned(),
                    Some("/etc/passgate/key.pem".to_string())
                );
                assert_eq!(matches.get_one::<u32>(ARG_KDF_ITERATIONS).copied(), Some(5000));
                assert_eq!(
                    matches.get_one::<u8>(logging::ARG_VERBOSITY).copied(),
                    Some(2)
                );
            },
        );
    }

    #[test]
    fn test_log_level_names() {
        for (index, level) in ["error", "warn", "info", "debug", "trace"].iter().enumerate() {
            with_clean_env(
                &[("PASSGATE_LOG_LEVEL", *level), ("PASSGATE_PRIVATE_KEY", "/k")],
                || {
                    let matches = new().get_matches_from(vec!["passgate"]);
                    assert_eq!(
                        matches.get_one::<u8>(logging::ARG_VERBOSITY).copied(),
                        u8::try_from(index).ok()
                    );
                },
            );
        }
    }

    #[test]
    fn test_verbosity_flag_count() {
        with_clean_env(&[], || {
            let matches = new().get_matches_from(vec!["passgate", "-k", "/k", "-vvv"]);
            assert_eq!(
                matches.get_one::<u8>(logging::ARG_VERBOSITY).copied(),
                Some(3)
            );
        });
    }

    #[test]
    fn test_zero_iterations_rejected() {
        with_clean_env(&[], || {
            let result =
                new().try_get_matches_from(vec!["passgate", "-k", "/k", "--kdf-iterations", "0"]);
            assert!(result.is_err());
        });
    }

    #[test]
    fn test_db_password_requires_dsn() {
        with_clean_env(&[], || {
            let result =
                new().try_get_matches_from(vec!["passgate", "-k", "/k", "--db-password", "x"]);
            assert!(result.is_err());
        });
    }
}
