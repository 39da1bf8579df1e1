use colored::Colorize;

use crate::tree::{NodeId, StructuralError, Tree};

/// Renders the subtree under `root` as an indented listing.
///
/// Directories get a trailing `/`, files show their stored size and dirty
/// nodes are flagged with `*`.
pub fn render_tree(tree: &Tree, root: NodeId, colorize: bool) -> Result<String, StructuralError> {
    let mut out = label(tree, root, colorize)?;
    out.push('\n');
    render_children(tree, root, "", colorize, &mut out)?;
    Ok(out)
}

/// Whether stdout understands ANSI colors.
pub fn stdout_supports_color() -> bool {
    supports_color::on(supports_color::Stream::Stdout).is_some()
}

fn render_children(
    tree: &Tree,
    directory: NodeId,
    prefix: &str,
    colorize: bool,
    out: &mut String,
) -> Result<(), StructuralError> {
    let children = tree.children(directory)?;
    let count = children.len();
    for (index, child) in children.into_iter().enumerate() {
        let last = index + 1 == count;
        out.push_str(prefix);
        out.push_str(if last { "└── " } else { "├── " });
        out.push_str(&label(tree, child, colorize)?);
        out.push('\n');

        if tree.is_directory(child)? {
            let nested = format!("{prefix}{}", if last { "    " } else { "│   " });
            render_children(tree, child, &nested, colorize, out)?;
        }
    }
    Ok(())
}

fn label(tree: &Tree, id: NodeId, colorize: bool) -> Result<String, StructuralError> {
    let key = tree.key(id)?;
    let dirty = if tree.is_dirty(id)? { " *" } else { "" };

    let label = match tree.contents(id)? {
        None if colorize => format!("{}", format!("{key}/").as_str().blue().bold()),
        None => format!("{key}/"),
        Some(contents) if colorize => {
            format!("{key} {}", format!("({} B)", contents.len()).as_str().dimmed())
        }
        Some(contents) => format!("{key} ({} B)", contents.len()),
    };
    Ok(format!("{label}{dirty}"))
}
