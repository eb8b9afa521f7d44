// Copyright 2026 tiercache Project Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! `tiercache-cli` provides debug tools for the file backed persistent tier of tiercache.

mod commands;
mod error;
mod scan;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tiercache::prelude::FsStore;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct Target {
    /// Directory of the persistent tier.
    #[arg(short, long)]
    dir: PathBuf,

    /// Only consider keys starting with this prefix, e.g. `ref_cache_`.
    #[arg(short, long, default_value = "")]
    prefix: String,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List records with their size, version and age.
    Inspect(Target),
    /// Summarize records and storage usage.
    Stats(Target),
    /// Delete every record under a prefix.
    Purge(Target),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    {
        use tracing_subscriber::{prelude::*, EnvFilter};

        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .with(EnvFilter::from_default_env())
            .init();
    }

    let cli = Cli::parse();
    let mut out = std::io::stdout().lock();

    match cli.command {
        Command::Inspect(target) => {
            let store = FsStore::open(&target.dir, None).await?;
            commands::inspect(&store, &target.prefix, commands::now(), &mut out).await?;
        }
        Command::Stats(target) => {
            let store = FsStore::open(&target.dir, None).await?;
            commands::stats(&store, &target.prefix, commands::now(), &mut out).await?;
        }
        Command::Purge(target) => {
            let store = FsStore::open(&target.dir, None).await?;
            commands::purge(&store, &target.prefix, &mut out).await?;
        }
    }
    Ok(())
}
