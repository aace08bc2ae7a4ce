mod checkout;
mod commands;
mod commit;
mod compress;
mod delta;
mod error;
mod http;
mod ls_tree;
mod object;
mod pack;
mod pktline;
mod refs;
mod store;
mod tree;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use ls_tree::LsTreeMode;
use store::ObjectStore;

#[derive(Parser)]
#[command(version, about = "A minimal, git-compatible object store and clone client", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an empty repository
    Init,

    /// Provide content or type/size information for repository objects
    CatFile {
        /// Show object type
        #[arg(short = 't', conflicts_with = "size_only")]
        type_only: bool,

        /// Show object size
        #[arg(short = 's', conflicts_with = "type_only")]
        size_only: bool,

        /// Pretty-print object's content
        #[arg(short = 'p', conflicts_with_all = ["size_only", "type_only"])]
        pretty_print: bool,

        /// Object hash
        #[arg(id = "object")]
        hash: String,
    },

    /// Compute object ID and optionally create a blob object from a file
    HashObject {
        /// Actually write the object into the object database
        #[arg(short)]
        write: bool,

        #[arg(id = "file")]
        file: PathBuf,
    },

    /// List the contents of a tree object
    LsTree {
        /// List only filenames (top-level)
        #[arg(long = "name-only", conflicts_with_all = ["dirs_only", "recursive", "trees"])]
        name_only: bool,

        /// Only show trees (top-level)
        #[arg(short = 'd', conflicts_with_all = ["name_only", "recursive", "trees"])]
        dirs_only: bool,

        /// Recurse into subtrees, listing only blobs
        #[arg(short = 'r', conflicts_with_all = ["name_only", "dirs_only", "trees"])]
        recursive: bool,

        /// Show trees when recursing
        #[arg(short = 't', conflicts_with_all = ["name_only", "dirs_only", "recursive"])]
        trees: bool,

        #[arg(id = "tree-ish")]
        hash: String,
    },

    /// Create a tree object from the current directory
    WriteTree,

    /// Create a new commit object
    CommitTree {
        #[arg(id = "tree")]
        tree: String,

        /// Parent commit (may be repeated)
        #[arg(short = 'p')]
        parents: Vec<String>,

        /// Commit message
        #[arg(short = 'm')]
        message: String,
    },

    /// Clone a repository over smart HTTP into a new directory
    Clone {
        url: String,
        dir: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cwd = std::env::current_dir()?;

    match cli.command {
        Commands::Init => commands::init::invoke(&cwd)?,

        Commands::CatFile {
            pretty_print: _,
            type_only,
            size_only,
            hash,
        } => {
            let store = ObjectStore::new(cwd.join(".git"));
            commands::cat_file::invoke(&store, &hash, type_only, size_only)?;
        }

        Commands::HashObject { write, file } => {
            let store = ObjectStore::new(cwd.join(".git"));
            let digest = commands::hash_object::invoke(&store, &file, write)?;
            println!("{digest}");
        }

        Commands::LsTree {
            name_only,
            dirs_only,
            recursive,
            trees,
            hash,
        } => {
            let mode = if name_only {
                LsTreeMode::NameOnly
            } else if dirs_only {
                LsTreeMode::DirsOnly
            } else if trees {
                LsTreeMode::TreesWhenRecursing
            } else if recursive {
                LsTreeMode::Recursive
            } else {
                anyhow::bail!("ls-tree requires one of --name-only, -d, -r, -t");
            };
            let store = ObjectStore::new(cwd.join(".git"));
            commands::ls_tree::invoke(&store, &hash, mode)?;
        }

        Commands::WriteTree => {
            let store = ObjectStore::new(cwd.join(".git"));
            let digest = commands::write_tree::invoke(&store, &cwd)?;
            println!("{digest}");
        }

        Commands::CommitTree { tree, parents, message } => {
            let store = ObjectStore::new(cwd.join(".git"));
            let digest = commands::commit_tree::invoke(&store, &tree, &parents, &message)?;
            println!("{digest}");
        }

        Commands::Clone { url, dir } => {
            commands::clone::invoke(&url, dir)?;
        }
    }

    Ok(())
}
