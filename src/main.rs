use todosync::commands::Cli;
use todosync::libs::logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();
    Cli::menu().await
}
