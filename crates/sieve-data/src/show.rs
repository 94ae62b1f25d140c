// Rendering of decoded per-branch tuples

use std::fmt::Debug;

use crate::config::Options;
use crate::pipeline::Branch;

/// Render one decoded item per branch as `<branch>: <rendering>` lines.
///
/// Each item is rendered by the last transform of its branch that can show
/// it, falling back to `Debug`. A `title` option adds a heading line. Items
/// and branches are paired in order; unpaired trailing entries are skipped.
pub fn show_xs<T: Debug>(items: &[T], branches: &[Branch<T>], opts: &Options) -> String {
    let mut lines = Vec::with_capacity(items.len() + 1);
    if let Some(title) = opts.get("title") {
        lines.push(title.to_string());
    }
    for (item, branch) in items.iter().zip(branches) {
        let body = branch
            .show(item, opts)
            .unwrap_or_else(|| format!("{item:?}"));
        lines.push(format!("{}: {body}", branch.name()));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Sample;
    use crate::transform::{Categorize, Noop};

    #[test]
    fn falls_back_to_debug() {
        let branches = vec![Branch::<i32>::noop("x"), Branch::new("y")];
        assert_eq!(show_xs(&[1, 2], &branches, &Options::default()), "x: 1\ny: 2");
    }

    #[test]
    fn uses_transform_rendering_and_title() {
        let branches = vec![
            Branch::new("x").add(Noop),
            Branch::new("y").add(Categorize::with_vocab(vec![0.0, 1.0])),
        ];
        let s = Sample::labeled(vec![0.5], 1.0);
        let out = show_xs(
            &[s.clone(), s],
            &branches,
            &Options::new().with("title", "sample 0"),
        );
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "sample 0");
        assert!(lines[1].starts_with("x: Sample {"));
        assert_eq!(lines[2], "y: category 1");
    }
}
