//! Walks one session through login, refresh and logout against in-memory
//! backends, printing what each step returns.
//!
//! $ cargo run --bin token_demo -- --settings=settings/dev.toml

use std::sync::Arc;
use turnstile::application_impl::*;
use turnstile::application_port::*;
use turnstile::domain_port::*;
use turnstile::infra_memory::*;
use turnstile::logger::*;
use turnstile::settings::*;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let logger = Logger::new_bootstrap();
    let settings = parse_settings(cli.settings.as_deref())?;
    logger.reload_from_config(&LogConfig {
        filter: settings.log.filter.clone(),
    })?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let service = RealAuthService::new(
        Arc::new(MemoryCredentialStore::new()),
        Arc::new(
            Argon2PasswordHasher::default().with_pepper(settings.auth.resolve_password_pepper()),
        ),
        Arc::new(JwtHs256Codec::new(
            JwtConfig {
                issuer: settings.auth.issuer.clone(),
                audience: settings.auth.audience.clone(),
                signing_key: settings.auth.resolve_signing_key()?,
            },
            clock.clone(),
        )),
        Arc::new(MemoryTokenBlacklist::new(clock.clone())),
        clock,
        TokenLifetimes {
            access: settings.auth.access_ttl(),
            refresh: settings.auth.refresh_ttl(),
        },
    );

    let subject_id = service
        .register(RegisterInput {
            email: "demo@example.com".to_string(),
            username: "demo".to_string(),
            password: "Demo-password1".to_string(),
        })
        .await?;
    println!("registered: {}", subject_id);

    let login = service
        .login(LoginInput {
            email: "demo@example.com".to_string(),
            password: "Demo-password1".to_string(),
        })
        .await?;
    println!("login: {:#?}", login.tokens);

    let rotated = service.refresh(&login.tokens.refresh_token.0).await?;
    println!("refresh: {:#?}", rotated);
    println!(
        "replaying the old refresh token: {:?}",
        service.refresh(&login.tokens.refresh_token.0).await.err()
    );

    service
        .logout(&rotated.access_token.0, &rotated.refresh_token.0)
        .await?;
    println!(
        "refresh after logout: {:?}",
        service.refresh(&rotated.refresh_token.0).await.err()
    );
    println!(
        "access after logout: {:?}",
        service.authenticate(&rotated.access_token.0).await
    );

    Ok(())
}
