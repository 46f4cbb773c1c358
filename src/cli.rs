use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "firewatch-server",
    version,
    about = "NASA FIRMS hotspot API for Bolivia"
)]
pub struct Args {
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,
    #[arg(long, default_value_t = 8080)]
    pub port: u16,
    #[arg(long)]
    pub static_root: Option<PathBuf>,
    #[arg(long, default_value_t = false)]
    pub print_openapi: bool,
}
