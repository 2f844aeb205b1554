use clap::Parser;
use conformance::cli::{
    handle_completions, handle_config_init, handle_list, handle_run, Cli, Commands,
    ConfigCommands,
};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run(args) => match handle_run(&args).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(anyhow::anyhow!("conformance suite failed")),
            Err(e) => Err(e),
        },
        Commands::List(args) => handle_list(&args).map(|output| println!("{}", output)),
        Commands::Config(config_cmd) => match config_cmd {
            ConfigCommands::Init(args) => handle_config_init(&args),
        },
        Commands::Completions(args) => {
            handle_completions(&args);
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
