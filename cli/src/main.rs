mod commands;
mod terminal;

use commands::{CommandLine, Commands, ping, resolve};
use terminal::{logging, print};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let commands = CommandLine::parse_args();

    logging::init_logging(commands.quiet);
    print::banner(commands.no_banner, commands.quiet);

    let quiet = commands.quiet;
    match commands.command {
        Commands::Ping(args) => {
            print::header("reachability sweep", quiet);
            ping::ping(args, quiet).await
        }
        Commands::Resolve(args) => {
            print::header("reverse lookup", quiet);
            resolve::resolve(args, quiet).await
        }
    }
}
