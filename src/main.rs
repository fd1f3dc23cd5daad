//! Opens the files named on the command line in a kvim session and reports
//! how each one was classified.

use kvim_core::{ErrorKind, Session, SessionPaths};
use tracing::warn;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut session = match SessionPaths::from_user_config() {
        Some(paths) => Session::load(&paths)?,
        None => {
            warn!("no user config directory; recent files will not be kept");
            Session::default()
        }
    };

    for arg in std::env::args_os().skip(1) {
        let index = match session.open(&arg) {
            Ok(index) => index,
            Err(err) => {
                eprintln!("{}: {err}", arg.to_string_lossy());
                continue;
            }
        };

        let Some(path) = session
            .document(index)
            .and_then(|doc| doc.path())
            .map(|path| path.to_path_buf())
        else {
            continue;
        };
        let annotations = match session.todos(index) {
            Ok(store) => Some((store.len(), store.items_for_file(&path).count())),
            // Not inside a project.
            Err(err) if err.kind() == ErrorKind::InvalidState => None,
            Err(err) => {
                eprintln!("{}: {err}", arg.to_string_lossy());
                None
            }
        };
        let Some(doc) = session.document(index) else {
            continue;
        };
        let workspace = doc.workspace();
        println!("{}", doc.display_name());
        println!("  language:  {}", doc.language().name());
        println!("  keywords:  {}", doc.highlights().len());
        match &workspace.project_root {
            Some(root) => println!("  project:   {}", root.display()),
            None => println!("  project:   -"),
        }
        match &workspace.vcs_root {
            Some(root) => println!("  vcs:       {}", root.display()),
            None => println!("  vcs:       -"),
        }
        if let Some((total, here)) = annotations {
            println!("  todos:     {here} here, {total} in project");
        }
    }

    if session.document_count() > 0 {
        println!("{}", session.status_line());
    }
    Ok(())
}
