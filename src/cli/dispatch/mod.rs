//! Turn validated CLI matches into an [`Action`].

use crate::cli::{
    actions::{server::Args, Action},
    commands::{
        ARG_COOKIE_MAX_AGE, ARG_DB_PASSWORD, ARG_DSN, ARG_KDF_ITERATIONS, ARG_LISTEN,
        ARG_MAX_PASSWORD_LENGTH, ARG_MAX_USERNAME_LENGTH, ARG_PORT, ARG_PRIVATE_KEY,
    },
};
use anyhow::{Context, Result};
use secrecy::SecretString;
use std::{
    net::{IpAddr, Ipv6Addr, SocketAddr},
    path::PathBuf,
};

/// # Errors
/// Returns an error if a required argument is missing.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>(ARG_PORT).copied().unwrap_or(4433);
    let listen = matches
        .get_one::<IpAddr>(ARG_LISTEN)
        .copied()
        .unwrap_or(IpAddr::V6(Ipv6Addr::UNSPECIFIED));

    let private_key = matches
        .get_one::<String>(ARG_PRIVATE_KEY)
        .map(PathBuf::from)
        .context("missing required argument: --private-key")?;

    Ok(Action::Server(Args {
        addr: SocketAddr::new(listen, port),
        dsn: matches.get_one::<String>(ARG_DSN).cloned(),
        db_password: matches
            .get_one::<String>(ARG_DB_PASSWORD)
            .map(|password| SecretString::from(password.clone())),
        private_key,
        kdf_iterations: matches
            .get_one::<u32>(ARG_KDF_ITERATIONS)
            .copied()
            .context("missing --kdf-iterations")?,
        max_username_length: matches
            .get_one::<u16>(ARG_MAX_USERNAME_LENGTH)
            .map(|n| usize::from(*n))
            .context("missing --max-username-length")?,
        max_password_length: matches
            .get_one::<u16>(ARG_MAX_PASSWORD_LENGTH)
            .map(|n| usize::from(*n))
            .context("missing --max-password-length")?,
        cookie_max_age_seconds: matches
            .get_one::<u64>(ARG_COOKIE_MAX_AGE)
            .copied()
            .context("missing --cookie-max-age")?,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        api::handlers::DEFAULT_COOKIE_MAX_AGE_SECONDS,
        auth::policy::{
            DEFAULT_KDF_ITERATIONS, DEFAULT_MAX_PASSWORD_LENGTH, DEFAULT_MAX_USERNAME_LENGTH,
        },
        cli::commands,
    };
    use secrecy::ExposeSecret;

    fn cleared<F: FnOnce()>(f: F) {
        temp_env::with_vars(
            [
                ("PASSGATE_PORT", None::<&str>),
                ("PASSGATE_LISTEN", None),
                ("PASSGATE_DSN", None),
                ("PASSGATE_DB_PASSWORD", None),
                ("PASSGATE_PRIVATE_KEY", None),
                ("PASSGATE_KDF_ITERATIONS", None),
                ("PASSGATE_MAX_USERNAME_LENGTH", None),
                ("PASSGATE_MAX_PASSWORD_LENGTH", None),
                ("PASSGATE_COOKIE_MAX_AGE", None),
            ],
            f,
        );
    }

    #[test]
    fn defaults_match_the_library() {
        cleared(|| {
            let matches = commands::new().get_matches_from(vec!["passgate", "-k", "key.pem"]);
            let Ok(Action::Server(args)) = handler(&matches) else {
                panic!("expected a server action");
            };
            assert_eq!(args.addr.to_string(), "[::]:4433");
            assert_eq!(args.dsn, None);
            assert!(args.db_password.is_none());
            assert_eq!(args.private_key, PathBuf::from("key.pem"));
            assert_eq!(args.kdf_iterations, DEFAULT_KDF_ITERATIONS);
            assert_eq!(args.max_username_length, DEFAULT_MAX_USERNAME_LENGTH);
            assert_eq!(args.max_password_length, DEFAULT_MAX_PASSWORD_LENGTH);
            assert_eq!(args.cookie_max_age_seconds, DEFAULT_COOKIE_MAX_AGE_SECONDS);
        });
    }

    #[test]
    fn explicit_arguments() {
        cleared(|| {
            let matches = commands::new().get_matches_from(vec![
                "passgate",
                "--listen",
                "127.0.0.1",
                "--port",
                "8080",
                "--dsn",
                "postgres://passgate@db/passgate",
                "--db-password",
                "s3cret",
                "--private-key",
                "/run/secrets/key.pem",
                "--max-username-length",
                "32",
            ]);
            let Ok(Action::Server(args)) = handler(&matches) else {
                panic!("expected a server action");
            };
            assert_eq!(args.addr.to_string(), "127.0.0.1:8080");
            assert_eq!(args.dsn.as_deref(), Some("postgres://passgate@db/passgate"));
            assert_eq!(
                args.db_password.as_ref().map(|p| p.expose_secret()),
                Some("s3cret")
            );
            assert_eq!(args.max_username_length, 32);
        });
    }
}
