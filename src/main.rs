use std::process::ExitCode;

use asc_key_check::cli::{self, AppCli};
use asc_key_check::utils;
use clap::Parser;
use tokio::signal;

async fn shutdown_signal() {
    let ctrl_c = async {
        if signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = AppCli::parse();
    utils::logging::init(args.verbose);

    let mut stdout = std::io::stdout();
    let code = cli::run(args, |key| std::env::var(key).ok(), &mut stdout, shutdown_signal()).await;
    ExitCode::from(code)
}
