use super::Parser;

#[derive(Parser, Debug)]
#[command(about = "JWT login, refresh and logout with a Redis-backed refresh-token blacklist")]
pub struct Cli {
    /// Path to a TOML settings file.
    #[arg(long)]
    pub settings: Option<String>,
}
