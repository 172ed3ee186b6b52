//! Binary entry point: parse the CLI, then either run the hidden `daemon`
//! command in the foreground or act as a thin client that discovers (or
//! spawns) the project daemon and forwards one request.

use std::process::ExitCode;

use clap::Parser;

use clangd_query::cli::{Cli, Command};
use clangd_query::ipc::client;
use clangd_query::ipc::protocol::Request;
use clangd_query::project::{find_project_root, ProjectIdentity};
use clangd_query::{daemon, logging};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Command::Daemon { project_root } = cli.command {
        return run_daemon(project_root).await;
    }

    logging::init_client(cli.verbose);
    run_client(cli).await
}

async fn run_daemon(project_root: std::path::PathBuf) -> ExitCode {
    match daemon::run(project_root).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("clangd-query daemon: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run_client(cli: Cli) -> ExitCode {
    let Some((command, arguments)) = cli.command.as_request_parts() else {
        return ExitCode::FAILURE;
    };

    let cwd = match std::env::current_dir() {
        Ok(dir) => dir,
        Err(e) => {
            eprintln!("clangd-query: cannot read current directory: {e}");
            return ExitCode::FAILURE;
        }
    };

    let project_root = match find_project_root(&cwd) {
        Ok(root) => root,
        Err(e) => {
            eprintln!("clangd-query: {e}");
            return ExitCode::FAILURE;
        }
    };

    let identity = ProjectIdentity::for_root(project_root);
    let request = Request {
        command: command.to_string(),
        arguments,
        limit: cli.limit,
        timeout: cli.timeout,
        verbose: cli.verbose,
    };

    match client::send_request(&identity, request).await {
        Ok(response) => {
            if !response.stdout.is_empty() {
                println!("{}", response.stdout);
            }
            if !response.stderr.is_empty() {
                eprintln!("{}", response.stderr);
            }
            exit_code_from(response.exit_code)
        }
        Err(e) => {
            eprintln!("clangd-query: {e}");
            ExitCode::FAILURE
        }
    }
}

fn exit_code_from(code: i32) -> ExitCode {
    ExitCode::from(code.clamp(0, 255) as u8)
}
