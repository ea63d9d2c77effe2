// ABOUTME: Line-driven front end for the split-pane calculator workspace.
// ABOUTME: Reads commands from stdin, applies them and prints the resulting layout.

use std::io::{self, BufRead, Write};

use anyhow::Result;
use numby_app::{Command, Workspace, WorkspaceSnapshot};
use numby_core::Config;
use numby_layout::{Node, Rect};
use numby_pane::CalculatorFactory;

type CalcWorkspace = Workspace<CalculatorFactory>;

fn print_node(out: &mut impl Write, node: &Node, depth: usize) -> io::Result<()> {
    let indent = "  ".repeat(depth);
    match node {
        Node::Leaf { id } => writeln!(out, "{}pane {}", indent, id),
        Node::Split {
            id,
            direction,
            ratio,
            first,
            second,
        } => {
            writeln!(out, "{}split {} {:?} {:.2}", indent, id, direction, ratio)?;
            print_node(out, first, depth + 1)?;
            print_node(out, second, depth + 1)
        }
    }
}

fn print_layout(out: &mut impl Write, workspace: &CalcWorkspace) -> io::Result<()> {
    let tabs = workspace.tabs();
    for (i, tab) in tabs.tabs().iter().enumerate() {
        let marker = if tab.id == tabs.selected_tab_id() { "*" } else { " " };
        writeln!(out, "{} [{}] {} ({} panes)", marker, i, tab.name, tab.tree.leaf_count())?;
    }

    let tree = workspace.selected_tree();
    print_node(out, tree.root(), 1)?;

    for (i, (leaf, rect)) in tree.pane_rects(Rect::full()).into_iter().enumerate() {
        let focus = if tree.focused_leaf() == Some(leaf) { ">" } else { " " };
        write!(
            out,
            "{} {} at ({:.2}, {:.2}) {:.2}x{:.2}",
            focus, i, rect.x, rect.y, rect.width, rect.height
        )?;
        match workspace.session(leaf) {
            Some(session) => {
                let input = session.input();
                let last = session.results().into_iter().flatten().last();
                match last {
                    Some(result) => writeln!(out, "  {:?} = {}", input, result)?,
                    None => writeln!(out, "  {:?}", input)?,
                }
            }
            None => writeln!(out, "  (no session)")?,
        }
    }
    out.flush()
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_writer(io::stderr).init();

    tracing::info!("Starting numby-panes");

    let config = Config::load_or_default();
    let runtime = tokio::runtime::Runtime::new()?;
    let factory = CalculatorFactory::new(runtime.handle().clone(), &config.session);

    let snapshot = if config.session.restore_on_launch {
        WorkspaceSnapshot::load_from_default()
    } else {
        None
    };
    let mut workspace = match snapshot {
        Some(snapshot) => Workspace::restore(factory, config.layout.clone(), snapshot),
        None => Workspace::new(factory, config.layout.clone()),
    };

    let stdin = io::stdin();
    let mut out = io::stdout().lock();
    print_layout(&mut out, &workspace)?;

    for line in stdin.lock().lines() {
        let line = line?;
        let line = line.trim();
        match line {
            "" => continue,
            "quit" | "exit" => break,
            "show" => {}
            _ => {
                if let Some(text) = line.strip_prefix("type ") {
                    match workspace.focused_session_mut() {
                        Some(session) => session.set_input(text),
                        None => writeln!(out, "focused pane has no session")?,
                    }
                } else {
                    match line.parse::<Command>() {
                        Ok(command) => {
                            let report = workspace.apply(command);
                            for leaf in &report.failed {
                                writeln!(out, "pane {} could not start a session", leaf)?;
                            }
                        }
                        Err(e) => {
                            writeln!(out, "{}", e)?;
                            continue;
                        }
                    }
                }
            }
        }
        print_layout(&mut out, &workspace)?;
    }

    if config.session.restore_on_launch {
        match workspace.snapshot().save_to_default() {
            Ok(path) => tracing::info!("Saved workspace to {:?}", path),
            Err(e) => tracing::error!("Failed to save workspace: {}", e),
        }
    }

    drop(workspace);
    drop(runtime);
    Ok(())
}
